//! Template hierarchy management.
//!
//! Templates are one-level trees: a template document plus child records
//! attached to it. This module mirrors the deletion engine's ordering
//! discipline (children handled before their parent) and adds expansion of a
//! template — and optionally its children — into concrete issues, minting
//! issue codes from the project's sequence counter.

use crate::client::{DocKind, FindOptions, WorkspaceClient};
use crate::error::{Result, TrackerError};
use crate::model::{Priority, Template, TemplateChild};
use crate::resolve;
use crate::validation;
use chrono::Utc;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Data for one child record of a new template.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ChildTemplateData {
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub estimation: Option<f64>,
    /// Assignee email, resolved to an account at creation time.
    pub assignee: Option<String>,
}

/// Data for a new template, children included.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct TemplateData {
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub estimation: Option<f64>,
    /// Assignee email, resolved to an account at creation time.
    pub assignee: Option<String>,
    pub component: Option<String>,
    pub milestone: Option<String>,
    pub children: Vec<ChildTemplateData>,
}

/// Overrides applied when expanding a template into an issue.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct IssueFromTemplate {
    pub title: Option<String>,
    pub priority: Option<Priority>,
    /// Assignee email; overrides the template's stored assignee.
    pub assignee: Option<String>,
    /// Also create one issue per child template, attached to the new issue.
    pub include_children: bool,
}

impl Default for IssueFromTemplate {
    fn default() -> Self {
        Self {
            title: None,
            priority: None,
            assignee: None,
            include_children: true,
        }
    }
}

/// Outcome of creating a template.
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTemplateResult {
    pub success: bool,
    pub template_id: String,
    pub children_created: usize,
}

/// One template in a listing, with its child count.
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSummary {
    pub id: String,
    pub title: String,
    pub priority: Priority,
    pub estimation: f64,
    pub children: usize,
}

/// A template and its children.
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TemplateDetails {
    pub template: Template,
    pub children: Vec<TemplateChild>,
}

/// Outcome of a single-field template update.
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTemplateResult {
    pub success: bool,
    pub template_id: String,
    pub field: String,
}

/// Outcome of adding a child to a template.
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddChildResult {
    pub success: bool,
    pub template_id: String,
    pub child_id: String,
}

/// Outcome of removing a child from a template.
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RemoveChildResult {
    pub success: bool,
    pub template_id: String,
    pub removed_title: String,
}

/// Outcome of deleting a template tree.
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteTemplateResult {
    pub success: bool,
    pub template_id: String,
    pub deleted_children: usize,
}

/// Outcome of expanding a template into issues.
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateIssueResult {
    pub success: bool,
    pub issue_id: String,
    pub identifier: String,
    pub children_created: usize,
}

fn resolve_assignee(client: &dyn WorkspaceClient, email: Option<&str>) -> Result<Option<String>> {
    email
        .map(|email| resolve::account(client, email).map(|a| a.id))
        .transpose()
}

/// Create a template with optional children, one remote call per child.
///
/// # Errors
///
/// Fails with `Validation` for a blank title and `NotFound` when the project
/// or an assignee does not resolve.
pub fn create(
    client: &dyn WorkspaceClient,
    project_identifier: &str,
    data: &TemplateData,
) -> Result<CreateTemplateResult> {
    validation::template_data(data)?;
    let project = resolve::project(client, project_identifier)?;
    let assignee = resolve_assignee(client, data.assignee.as_deref())?;

    let template_id = client.create_doc(
        DocKind::Template,
        json!({
            "title": data.title.trim(),
            "space": &project.id,
            "description": &data.description,
            "priority": data.priority.unwrap_or_default(),
            "estimation": data.estimation.unwrap_or(0.0),
            "assignee": assignee,
            "component": &data.component,
            "milestone": &data.milestone,
        }),
    )?;

    for child in &data.children {
        let child_assignee = resolve_assignee(client, child.assignee.as_deref())?;
        client.add_collection(
            DocKind::TemplateChild,
            &template_id,
            &project.id,
            DocKind::Template,
            "children",
            json!({
                "title": child.title.trim(),
                "description": &child.description,
                "priority": child.priority.unwrap_or_default(),
                "estimation": child.estimation.unwrap_or(0.0),
                "assignee": child_assignee,
            }),
        )?;
    }

    tracing::debug!(
        template_id = %template_id,
        children = data.children.len(),
        "Template created"
    );
    Ok(CreateTemplateResult {
        success: true,
        template_id,
        children_created: data.children.len(),
    })
}

fn summarize(client: &dyn WorkspaceClient, template: &Template) -> Result<TemplateSummary> {
    let children = resolve::template_children(client, &template.id)?.len();
    Ok(TemplateSummary {
        id: template.id.clone(),
        title: template.title.clone(),
        priority: template.priority,
        estimation: template.estimation,
        children,
    })
}

/// List a project's templates with child counts.
///
/// # Errors
///
/// Fails with `ProjectNotFound` when the project does not resolve, or if a
/// remote read fails.
pub fn list(client: &dyn WorkspaceClient, project_identifier: &str) -> Result<Vec<TemplateSummary>> {
    let project = resolve::project(client, project_identifier)?;
    let templates: Vec<Template> = client
        .find_all(
            DocKind::Template,
            &json!({ "space": project.id }),
            &FindOptions::default(),
        )?
        .into_iter()
        .map(serde_json::from_value)
        .collect::<std::result::Result<_, _>>()?;
    templates
        .iter()
        .map(|t| summarize(client, t))
        .collect()
}

/// Case-insensitive substring search over template titles and descriptions.
///
/// # Errors
///
/// Fails with `ProjectNotFound` for an unresolvable scope, or if a remote
/// read fails.
pub fn search(
    client: &dyn WorkspaceClient,
    query: &str,
    project_identifier: Option<&str>,
    limit: Option<usize>,
) -> Result<Vec<TemplateSummary>> {
    let filter = match project_identifier {
        Some(identifier) => {
            let project = resolve::project(client, identifier)?;
            json!({ "space": project.id })
        }
        None => json!({}),
    };
    let templates: Vec<Template> = client
        .find_all(DocKind::Template, &filter, &FindOptions::default())?
        .into_iter()
        .map(serde_json::from_value)
        .collect::<std::result::Result<_, _>>()?;

    let needle = query.to_lowercase();
    let mut matches = Vec::new();
    for template in &templates {
        let haystack_hit = template.title.to_lowercase().contains(&needle)
            || template
                .description
                .as_ref()
                .is_some_and(|d| d.to_lowercase().contains(&needle));
        if haystack_hit {
            matches.push(summarize(client, template)?);
            if limit.is_some_and(|l| matches.len() >= l) {
                break;
            }
        }
    }
    Ok(matches)
}

/// A template and its children.
///
/// # Errors
///
/// Fails with `TemplateNotFound` when the template does not resolve, or if a
/// remote read fails.
pub fn details(client: &dyn WorkspaceClient, template_id: &str) -> Result<TemplateDetails> {
    let template = resolve::template(client, template_id)?;
    let children = resolve::template_children(client, &template.id)?;
    Ok(TemplateDetails { template, children })
}

/// Update one template field from the allow-list.
///
/// # Errors
///
/// Fails with `TemplateNotFound` when the template does not resolve,
/// `InvalidField` for a field outside the allow-list, or `Validation` when
/// the value fails that field's check.
pub fn update(
    client: &dyn WorkspaceClient,
    template_id: &str,
    field: &str,
    value: &Value,
) -> Result<UpdateTemplateResult> {
    let template = resolve::template(client, template_id)?;
    let update = validation::template_update_field(field, value)?;
    client.update_doc(DocKind::Template, &template.id, update)?;
    tracing::debug!(template_id = %template.id, field, "Template updated");
    Ok(UpdateTemplateResult {
        success: true,
        template_id: template.id,
        field: field.to_string(),
    })
}

/// Attach a new child record to an existing template.
///
/// # Errors
///
/// Fails with `Validation` for a blank title and `NotFound` when the
/// template or assignee does not resolve.
pub fn add_child(
    client: &dyn WorkspaceClient,
    template_id: &str,
    child: &ChildTemplateData,
) -> Result<AddChildResult> {
    if child.title.trim().is_empty() {
        return Err(TrackerError::validation("title", "cannot be empty"));
    }
    let template = resolve::template(client, template_id)?;
    let assignee = resolve_assignee(client, child.assignee.as_deref())?;
    let child_id = client.add_collection(
        DocKind::TemplateChild,
        &template.id,
        &template.space,
        DocKind::Template,
        "children",
        json!({
            "title": child.title.trim(),
            "description": &child.description,
            "priority": child.priority.unwrap_or_default(),
            "estimation": child.estimation.unwrap_or(0.0),
            "assignee": assignee,
        }),
    )?;
    Ok(AddChildResult {
        success: true,
        template_id: template.id,
        child_id,
    })
}

/// Remove a child record by its position in the template's child list.
///
/// # Errors
///
/// Fails with `TemplateNotFound` when the template does not resolve and
/// `InvalidIndex` when `index` is out of range.
pub fn remove_child(
    client: &dyn WorkspaceClient,
    template_id: &str,
    index: usize,
) -> Result<RemoveChildResult> {
    let template = resolve::template(client, template_id)?;
    let children = resolve::template_children(client, &template.id)?;
    let child = children.get(index).ok_or(TrackerError::InvalidIndex {
        index,
        count: children.len(),
    })?;
    client.remove_collection(DocKind::TemplateChild, &child.id)?;
    Ok(RemoveChildResult {
        success: true,
        template_id: template.id,
        removed_title: child.title.clone(),
    })
}

/// Delete a template and its children, children first.
///
/// No partial-failure tolerance: the first failed removal aborts.
///
/// # Errors
///
/// Fails with `TemplateNotFound` when the template does not resolve, or if a
/// remote call fails.
pub fn delete(client: &dyn WorkspaceClient, template_id: &str) -> Result<DeleteTemplateResult> {
    let template = resolve::template(client, template_id)?;
    let children = resolve::template_children(client, &template.id)?;
    for child in &children {
        client.remove_collection(DocKind::TemplateChild, &child.id)?;
    }
    client.remove_doc(DocKind::Template, &template.id)?;
    tracing::debug!(
        template_id = %template.id,
        deleted_children = children.len(),
        "Template deleted"
    );
    Ok(DeleteTemplateResult {
        success: true,
        template_id: template.id,
        deleted_children: children.len(),
    })
}

/// Expand a template into a concrete issue, with overrides winning over the
/// template's field snapshot. With `include_children`, each child template
/// becomes an issue attached under the new parent. Issue codes are minted
/// from the project's sequence counter.
///
/// # Errors
///
/// Fails with `TemplateNotFound`/`ProjectNotFound`/`AccountNotFound` when
/// resolution fails, or if a remote call fails mid-expansion.
pub fn create_issue(
    client: &dyn WorkspaceClient,
    template_id: &str,
    overrides: &IssueFromTemplate,
) -> Result<CreateIssueResult> {
    let template = resolve::template(client, template_id)?;
    let children = if overrides.include_children {
        resolve::template_children(client, &template.id)?
    } else {
        Vec::new()
    };
    let project = resolve::project_by_id(client, &template.space)?;

    let assignee = match overrides.assignee.as_deref() {
        Some(email) => Some(resolve::account(client, email)?.id),
        None => template.assignee.clone(),
    };

    let mut sequence = project.sequence + 1;
    let identifier = format!("{}-{}", project.identifier, sequence);
    let issue_id = client.create_doc(
        DocKind::Issue,
        json!({
            "title": overrides.title.clone().unwrap_or_else(|| template.title.clone()),
            "identifier": &identifier,
            "space": &template.space,
            "priority": overrides.priority.unwrap_or(template.priority),
            "estimation": template.estimation,
            "assignee": assignee,
            "component": &template.component,
            "milestone": &template.milestone,
            "modifiedOn": Utc::now(),
        }),
    )?;

    let mut children_created = 0;
    for child in &children {
        sequence += 1;
        let child_identifier = format!("{}-{}", project.identifier, sequence);
        client.add_collection(
            DocKind::Issue,
            &issue_id,
            &template.space,
            DocKind::Issue,
            "subIssues",
            json!({
                "title": &child.title,
                "identifier": child_identifier,
                "priority": child.priority,
                "estimation": child.estimation,
                "assignee": &child.assignee,
                "modifiedOn": Utc::now(),
            }),
        )?;
        children_created += 1;
    }

    client.update_doc(
        DocKind::Project,
        &project.id,
        json!({ "sequence": sequence }),
    )?;

    tracing::debug!(
        template_id = %template.id,
        identifier = %identifier,
        children_created,
        "Issue created from template"
    );
    Ok(CreateIssueResult {
        success: true,
        issue_id,
        identifier,
        children_created,
    })
}
