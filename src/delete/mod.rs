//! Deletion engine: cascading removal and detachment of tracker entities.
//!
//! Each invocation runs the same state machine: resolve, analyze (skipped
//! under force), block or proceed, traverse, remove, report. Remote calls are
//! strictly sequential and children are always removed before their parent —
//! the remote store offers no transactions, so a partial failure leaves some
//! children gone and the parent present, which a re-run picks up from live
//! reads (already-removed children simply no longer appear).
//!
//! Dry-run performs the full traversal but issues zero mutating calls.

use crate::client::{DocKind, FindOptions, WorkspaceClient};
use crate::error::{Result, TrackerError};
use crate::impact;
use crate::model::{is_false, Issue};
use crate::resolve;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::{HashMap, HashSet};

/// Policy for a single deletion.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct DeleteOptions {
    /// Delete sub-entities too instead of leaving dangling references.
    pub cascade: bool,
    /// Override analyzer blockers. Never bypasses "not found".
    pub force: bool,
    /// Simulate: traverse and report, mutate nothing.
    pub dry_run: bool,
}

impl Default for DeleteOptions {
    fn default() -> Self {
        Self {
            cascade: true,
            force: false,
            dry_run: false,
        }
    }
}

/// Outcome of an issue deletion.
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssueDeleteResult {
    pub success: bool,
    /// Number of documents deleted (or that would be, under dry-run).
    pub deleted_count: usize,
    /// Root identifier first, then descendants in discovery order. Empty
    /// under dry-run (see `would_delete`).
    pub deleted_issues: Vec<String>,
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "is_false")]
    pub forced_deletion: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub dry_run: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub would_delete: Option<Vec<String>>,
}

/// Per-category tallies for a project deletion.
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeletedEntities {
    pub project: bool,
    pub issues: usize,
    pub components: usize,
    pub milestones: usize,
    pub templates: usize,
}

/// Outcome of a project deletion.
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDeleteResult {
    pub success: bool,
    pub project: String,
    pub deleted: DeletedEntities,
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "is_false")]
    pub dry_run: bool,
}

/// Outcome of archiving a project. "Already archived" is a normal
/// non-exceptional outcome, reported with `success: false`.
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveResult {
    pub success: bool,
    pub project: String,
    pub archived: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Options for component/milestone deletion.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct DetachOptions {
    pub dry_run: bool,
}

/// Outcome of a component deletion.
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDeleteResult {
    pub success: bool,
    pub component: String,
    /// Issues whose component reference was cleared (counted even under
    /// dry-run).
    pub affected_issues: usize,
    #[serde(skip_serializing_if = "is_false")]
    pub dry_run: bool,
}

/// Outcome of a milestone deletion.
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneDeleteResult {
    pub success: bool,
    pub milestone: String,
    pub affected_issues: usize,
    #[serde(skip_serializing_if = "is_false")]
    pub dry_run: bool,
}

/// Delete a single issue, cascading over its sub-issue tree.
///
/// Children are removed before their parent so a parent never loses its
/// document while descendants still reference it. With `cascade: false` the
/// issue is deleted alone and remaining sub-issues keep a dangling parent
/// reference, reported as a warning.
///
/// # Errors
///
/// Fails with `IssueNotFound` when the issue does not resolve, `Blocked`
/// when the analyzer reports blockers and `force` is not set, or if a remote
/// call fails mid-cascade.
pub fn issue(
    client: &dyn WorkspaceClient,
    code: &str,
    options: &DeleteOptions,
) -> Result<IssueDeleteResult> {
    let root = resolve::issue(client, code)?;

    let (analyzed_subs, comments, attachments) = if options.force {
        (None, 0, 0)
    } else {
        let report = impact::analyze_issue(client, code)?;
        if !report.blockers.is_empty() {
            return Err(TrackerError::Blocked {
                identifier: root.identifier,
                blockers: report.blockers,
            });
        }
        (Some(report.sub_issues), report.comments, report.attachments)
    };

    let descendants = if options.cascade {
        match analyzed_subs {
            Some(subs) => subs,
            None => impact::subtree(client, &root)?,
        }
    } else {
        Vec::new()
    };

    let mut warnings = Vec::new();
    if options.cascade {
        if !descendants.is_empty() {
            warnings.push(format!(
                "Issue has {} sub-issues that will be deleted",
                descendants.len()
            ));
        }
    } else {
        let direct = resolve::sub_issues(client, &root.id)?;
        if !direct.is_empty() {
            warnings.push(format!(
                "Issue has {} sub-issues that were not deleted",
                direct.len()
            ));
        }
    }
    if comments > 0 {
        warnings.push(format!("Issue has {comments} comments that will be lost"));
    }
    if attachments > 0 {
        warnings.push(format!(
            "Issue has {attachments} attachments that will be lost"
        ));
    }

    // Root first, then descendants in discovery order.
    let mut order = Vec::with_capacity(descendants.len() + 1);
    order.push(root.identifier.clone());
    order.extend(descendants.iter().map(|i| i.identifier.clone()));

    if options.dry_run {
        tracing::debug!(identifier = %root.identifier, count = order.len(), "Dry-run issue delete");
        return Ok(IssueDeleteResult {
            success: true,
            deleted_count: order.len(),
            deleted_issues: Vec::new(),
            warnings,
            forced_deletion: options.force,
            dry_run: true,
            would_delete: Some(order),
        });
    }

    // Reverse discovery order: every child's document is gone before its
    // parent's removal.
    for descendant in descendants.iter().rev() {
        client.remove_doc(DocKind::Issue, &descendant.id)?;
    }
    client.remove_doc(DocKind::Issue, &root.id)?;

    tracing::debug!(
        identifier = %root.identifier,
        deleted = order.len(),
        forced = options.force,
        "Issue deleted"
    );

    Ok(IssueDeleteResult {
        success: true,
        deleted_count: order.len(),
        deleted_issues: order,
        warnings,
        forced_deletion: options.force,
        dry_run: false,
        would_delete: None,
    })
}

/// Removal order for a whole space: parents discovered before children, so
/// the reversed list removes children first. Issues unreachable from any
/// root (corrupted parent loops) are appended so every document is covered.
fn space_deletion_order(issues: &[Issue]) -> Vec<&Issue> {
    let ids: HashSet<&str> = issues.iter().map(|i| i.id.as_str()).collect();
    let mut children: HashMap<&str, Vec<&Issue>> = HashMap::new();
    let mut roots = Vec::new();
    for issue in issues {
        match issue.attached_to.as_deref().filter(|p| ids.contains(p)) {
            Some(parent) => children.entry(parent).or_default().push(issue),
            None => roots.push(issue),
        }
    }

    let mut order = Vec::with_capacity(issues.len());
    let mut seen: HashSet<&str> = HashSet::new();
    let mut stack = roots;
    while let Some(issue) = stack.pop() {
        if !seen.insert(issue.id.as_str()) {
            continue;
        }
        order.push(issue);
        if let Some(subs) = children.get(issue.id.as_str()) {
            stack.extend(subs);
        }
    }
    for issue in issues {
        if !seen.contains(issue.id.as_str()) {
            order.push(issue);
        }
    }
    order
}

/// Delete a project and everything it owns.
///
/// Issues are cascaded fully (children before parents) before components,
/// milestones and templates, so no reference dangles mid-deletion; the
/// project document itself goes last.
///
/// # Errors
///
/// Fails with `ProjectNotFound` when the project does not resolve, `Blocked`
/// when active issues exist and `force` is not set, or if a remote call
/// fails mid-cascade.
pub fn project(
    client: &dyn WorkspaceClient,
    identifier: &str,
    options: &DeleteOptions,
) -> Result<ProjectDeleteResult> {
    let report = impact::analyze_project(client, identifier)?;
    if !options.force && !report.blockers.is_empty() {
        return Err(TrackerError::Blocked {
            identifier: identifier.to_string(),
            blockers: report.blockers,
        });
    }

    let order = space_deletion_order(&report.issues);
    let deleted = DeletedEntities {
        project: true,
        issues: order.len(),
        components: report.components.len(),
        milestones: report.milestones.len(),
        templates: report.templates.len(),
    };

    if options.dry_run {
        tracing::debug!(identifier, issues = deleted.issues, "Dry-run project delete");
        return Ok(ProjectDeleteResult {
            success: true,
            project: identifier.to_string(),
            deleted,
            warnings: report.warnings,
            dry_run: true,
        });
    }

    for issue in order.iter().rev() {
        client.remove_doc(DocKind::Issue, &issue.id)?;
    }
    for component in &report.components {
        client.remove_doc(DocKind::Component, &component.id)?;
    }
    for milestone in &report.milestones {
        client.remove_doc(DocKind::Milestone, &milestone.id)?;
    }
    for template in &report.templates {
        for child in resolve::template_children(client, &template.id)? {
            client.remove_collection(DocKind::TemplateChild, &child.id)?;
        }
        client.remove_doc(DocKind::Template, &template.id)?;
    }
    client.remove_doc(DocKind::Project, &report.project.id)?;

    tracing::debug!(
        identifier,
        issues = deleted.issues,
        components = deleted.components,
        milestones = deleted.milestones,
        templates = deleted.templates,
        "Project deleted"
    );

    Ok(ProjectDeleteResult {
        success: true,
        project: identifier.to_string(),
        deleted,
        warnings: report.warnings,
        dry_run: false,
    })
}

/// Archive (soft-delete) a project.
///
/// # Errors
///
/// Fails with `ProjectNotFound` when the project does not resolve, or if the
/// remote update fails.
pub fn archive(client: &dyn WorkspaceClient, identifier: &str) -> Result<ArchiveResult> {
    let project = resolve::project(client, identifier)?;
    if project.archived {
        return Ok(ArchiveResult {
            success: false,
            project: identifier.to_string(),
            archived: true,
            message: Some("Project is already archived".to_string()),
        });
    }
    client.update_doc(DocKind::Project, &project.id, json!({ "archived": true }))?;
    tracing::debug!(identifier, "Project archived");
    Ok(ArchiveResult {
        success: true,
        project: identifier.to_string(),
        archived: true,
        message: None,
    })
}

/// Clear `field` on every issue in `space` referencing `entity_id`, then
/// return how many issues referenced it.
fn detach_references(
    client: &dyn WorkspaceClient,
    space: &str,
    field: &'static str,
    entity_id: &str,
    dry_run: bool,
) -> Result<usize> {
    let mut filter = Map::new();
    filter.insert("space".to_string(), Value::String(space.to_string()));
    filter.insert(field.to_string(), Value::String(entity_id.to_string()));
    let referencing = client.find_all(
        DocKind::Issue,
        &Value::Object(filter),
        &FindOptions::default(),
    )?;

    if !dry_run {
        for doc in &referencing {
            let issue: Issue = serde_json::from_value(doc.clone())?;
            let mut update = Map::new();
            update.insert(field.to_string(), Value::Null);
            client.update_doc(DocKind::Issue, &issue.id, Value::Object(update))?;
        }
    }
    Ok(referencing.len())
}

/// Delete a component, detaching every issue that references it.
///
/// # Errors
///
/// Fails with `ProjectNotFound`/`ComponentNotFound` when resolution fails,
/// or if a remote call fails.
pub fn component(
    client: &dyn WorkspaceClient,
    project_identifier: &str,
    label: &str,
    options: &DetachOptions,
) -> Result<ComponentDeleteResult> {
    let project = resolve::project(client, project_identifier)?;
    let component = resolve::component(client, &project, label)?;

    let affected = detach_references(
        client,
        &project.id,
        "component",
        &component.id,
        options.dry_run,
    )?;
    if !options.dry_run {
        client.remove_doc(DocKind::Component, &component.id)?;
    }

    tracing::debug!(label, affected, dry_run = options.dry_run, "Component deleted");
    Ok(ComponentDeleteResult {
        success: true,
        component: label.to_string(),
        affected_issues: affected,
        dry_run: options.dry_run,
    })
}

/// Delete a milestone, detaching every issue that references it.
///
/// # Errors
///
/// Fails with `ProjectNotFound`/`MilestoneNotFound` when resolution fails,
/// or if a remote call fails.
pub fn milestone(
    client: &dyn WorkspaceClient,
    project_identifier: &str,
    label: &str,
    options: &DetachOptions,
) -> Result<MilestoneDeleteResult> {
    let project = resolve::project(client, project_identifier)?;
    let milestone = resolve::milestone(client, &project, label)?;

    let affected = detach_references(
        client,
        &project.id,
        "milestone",
        &milestone.id,
        options.dry_run,
    )?;
    if !options.dry_run {
        client.remove_doc(DocKind::Milestone, &milestone.id)?;
    }

    tracing::debug!(label, affected, dry_run = options.dry_run, "Milestone deleted");
    Ok(MilestoneDeleteResult {
        success: true,
        milestone: label.to_string(),
        affected_issues: affected,
        dry_run: options.dry_run,
    })
}
