//! Impact analysis: read-only computation of what a deletion would touch.
//!
//! The analyzer issues only `find_one`/`find_all` calls. Blockers are
//! conditions that must stop a deletion unless forced; warnings are
//! informational and never stop anything. The deletion engine consults these
//! reports before mutating, and reuses [`subtree`] for its traversal order.

use crate::client::{DocKind, FindOptions, WorkspaceClient};
use crate::error::Result;
use crate::model::{Component, Issue, Milestone, Project, Template};
use crate::resolve;
use schemars::JsonSchema;
use serde::Serialize;
use serde_json::json;
use std::collections::HashSet;

/// Impact report for deleting a single issue.
#[derive(Debug, Serialize, JsonSchema)]
pub struct IssueImpact {
    pub issue: Issue,
    /// Conditions that block deletion unless forced.
    pub blockers: Vec<String>,
    /// Transitive sub-issues in discovery order (parents before children).
    pub sub_issues: Vec<Issue>,
    pub comments: usize,
    pub attachments: usize,
    pub warnings: Vec<String>,
}

/// Impact report for deleting a whole project.
#[derive(Debug, Serialize, JsonSchema)]
pub struct ProjectImpact {
    pub project: Project,
    pub blockers: Vec<String>,
    pub issues: Vec<Issue>,
    pub components: Vec<Component>,
    pub milestones: Vec<Milestone>,
    pub templates: Vec<Template>,
    pub warnings: Vec<String>,
}

/// Collect all transitive sub-issues of `root` in discovery order.
///
/// Explicit worklist, one `find_all` per visited node. A parent always
/// appears before its children in the result. A seen-set guards against
/// corrupted parent loops so traversal always terminates and yields each
/// document once. The root itself is excluded.
///
/// # Errors
///
/// Returns an error if a remote read fails or a document does not decode.
pub fn subtree(client: &dyn WorkspaceClient, root: &Issue) -> Result<Vec<Issue>> {
    let mut seen: HashSet<String> = HashSet::from([root.id.clone()]);
    let mut discovered = Vec::new();
    let mut frontier = vec![root.id.clone()];

    while let Some(parent_id) = frontier.pop() {
        for child in resolve::sub_issues(client, &parent_id)? {
            if seen.insert(child.id.clone()) {
                frontier.push(child.id.clone());
                discovered.push(child);
            }
        }
    }
    Ok(discovered)
}

/// Analyze the impact of deleting one issue.
///
/// # Errors
///
/// Fails with `IssueNotFound` when the issue does not resolve, or if a
/// remote read fails.
pub fn analyze_issue(client: &dyn WorkspaceClient, code: &str) -> Result<IssueImpact> {
    let issue = resolve::issue(client, code)?;
    let sub_issues = subtree(client, &issue)?;

    let mut subtree_ids: HashSet<&str> = sub_issues.iter().map(|i| i.id.as_str()).collect();
    subtree_ids.insert(issue.id.as_str());

    // Issues outside the deletion subtree that reference this one.
    let mut blockers = Vec::new();
    let referencing = client.find_all(
        DocKind::Issue,
        &json!({ "blockedBy": &issue.id }),
        &FindOptions::default(),
    )?;
    for doc in referencing {
        let other: Issue = serde_json::from_value(doc)?;
        if !subtree_ids.contains(other.id.as_str()) {
            blockers.push(format!("Referenced by issue {}", other.identifier));
        }
    }

    let comments = client
        .find_all(
            DocKind::Comment,
            &json!({ "attachedTo": &issue.id }),
            &FindOptions::default(),
        )?
        .len();
    let attachments = client
        .find_all(
            DocKind::Attachment,
            &json!({ "attachedTo": &issue.id }),
            &FindOptions::default(),
        )?
        .len();

    let mut warnings = Vec::new();
    if !sub_issues.is_empty() {
        warnings.push(format!(
            "Issue has {} sub-issues that will be deleted",
            sub_issues.len()
        ));
    }
    if comments > 0 {
        warnings.push(format!("Issue has {comments} comments that will be lost"));
    }
    if attachments > 0 {
        warnings.push(format!(
            "Issue has {attachments} attachments that will be lost"
        ));
    }

    tracing::debug!(
        identifier = %issue.identifier,
        sub_issues = sub_issues.len(),
        blockers = blockers.len(),
        "Issue impact analyzed"
    );

    Ok(IssueImpact {
        issue,
        blockers,
        sub_issues,
        comments,
        attachments,
        warnings,
    })
}

/// Analyze the impact of deleting a whole project.
///
/// # Errors
///
/// Fails with `ProjectNotFound` when the project does not resolve, or if a
/// remote read fails.
pub fn analyze_project(client: &dyn WorkspaceClient, identifier: &str) -> Result<ProjectImpact> {
    let project = resolve::project(client, identifier)?;

    let issues: Vec<Issue> = client
        .find_all(
            DocKind::Issue,
            &json!({ "space": &project.id }),
            &FindOptions::default(),
        )?
        .into_iter()
        .map(serde_json::from_value)
        .collect::<std::result::Result<_, _>>()?;
    let components: Vec<Component> = client
        .find_all(
            DocKind::Component,
            &json!({ "space": &project.id }),
            &FindOptions::default(),
        )?
        .into_iter()
        .map(serde_json::from_value)
        .collect::<std::result::Result<_, _>>()?;
    let milestones: Vec<Milestone> = client
        .find_all(
            DocKind::Milestone,
            &json!({ "space": &project.id }),
            &FindOptions::default(),
        )?
        .into_iter()
        .map(serde_json::from_value)
        .collect::<std::result::Result<_, _>>()?;
    let templates: Vec<Template> = client
        .find_all(
            DocKind::Template,
            &json!({ "space": &project.id }),
            &FindOptions::default(),
        )?
        .into_iter()
        .map(serde_json::from_value)
        .collect::<std::result::Result<_, _>>()?;

    let active = issues.iter().filter(|i| i.status.is_active()).count();
    let mut blockers = Vec::new();
    if active > 0 {
        blockers.push(format!("Project has {active} active issues"));
    }

    let mut warnings = Vec::new();
    if !issues.is_empty() {
        warnings.push(format!(
            "Project has {} issues that will be deleted",
            issues.len()
        ));
    }

    tracing::debug!(
        identifier = %project.identifier,
        issues = issues.len(),
        components = components.len(),
        milestones = milestones.len(),
        templates = templates.len(),
        "Project impact analyzed"
    );

    Ok(ProjectImpact {
        project,
        blockers,
        issues,
        components,
        milestones,
        templates,
        warnings,
    })
}
