//! Entity resolution: human-facing identifiers to canonical documents.
//!
//! Every operation resolves its targets through here before touching them.
//! Nothing is cached across calls — remote state may change between two
//! invocations, so each resolve is one fresh read.

use crate::client::{DocKind, FindOptions, WorkspaceClient};
use crate::error::{Result, TrackerError};
use crate::model::{Account, Component, Issue, Milestone, Project, Template, TemplateChild};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

/// Issue code grammar: `PREFIX-123`.
static ISSUE_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9]*-[0-9]+$").expect("issue code regex"));

/// True when `code` looks like a well-formed issue code.
#[must_use]
pub fn is_issue_code(code: &str) -> bool {
    ISSUE_CODE.is_match(code)
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
    Ok(serde_json::from_value(value)?)
}

/// Resolve a project by its human code.
///
/// # Errors
///
/// Fails with `ProjectNotFound` when no project matches.
pub fn project(client: &dyn WorkspaceClient, identifier: &str) -> Result<Project> {
    client
        .find_one(DocKind::Project, &json!({ "identifier": identifier }))?
        .map_or_else(
            || {
                Err(TrackerError::ProjectNotFound {
                    identifier: identifier.to_string(),
                })
            },
            decode,
        )
}

/// Resolve a project by its document id (e.g. from an issue's `space`).
///
/// # Errors
///
/// Fails with `ProjectNotFound` when no project matches.
pub fn project_by_id(client: &dyn WorkspaceClient, id: &str) -> Result<Project> {
    client
        .find_one(DocKind::Project, &json!({ "_id": id }))?
        .map_or_else(
            || {
                Err(TrackerError::ProjectNotFound {
                    identifier: id.to_string(),
                })
            },
            decode,
        )
}

/// Resolve an issue by its code (e.g. `PROJ-123`).
///
/// # Errors
///
/// Fails with `InvalidIssueCode` for malformed codes and `IssueNotFound`
/// when no issue matches.
pub fn issue(client: &dyn WorkspaceClient, code: &str) -> Result<Issue> {
    if !is_issue_code(code) {
        return Err(TrackerError::InvalidIssueCode {
            code: code.to_string(),
        });
    }
    client
        .find_one(DocKind::Issue, &json!({ "identifier": code }))?
        .map_or_else(
            || {
                Err(TrackerError::IssueNotFound {
                    identifier: code.to_string(),
                })
            },
            decode,
        )
}

/// Resolve a component by label, scoped to a project.
///
/// # Errors
///
/// Fails with `ComponentNotFound` when no component matches.
pub fn component(
    client: &dyn WorkspaceClient,
    project: &Project,
    label: &str,
) -> Result<Component> {
    client
        .find_one(
            DocKind::Component,
            &json!({ "space": &project.id, "label": label }),
        )?
        .map_or_else(
            || {
                Err(TrackerError::ComponentNotFound {
                    project: project.identifier.clone(),
                    label: label.to_string(),
                })
            },
            decode,
        )
}

/// Resolve a milestone by label, scoped to a project.
///
/// # Errors
///
/// Fails with `MilestoneNotFound` when no milestone matches.
pub fn milestone(
    client: &dyn WorkspaceClient,
    project: &Project,
    label: &str,
) -> Result<Milestone> {
    client
        .find_one(
            DocKind::Milestone,
            &json!({ "space": &project.id, "label": label }),
        )?
        .map_or_else(
            || {
                Err(TrackerError::MilestoneNotFound {
                    project: project.identifier.clone(),
                    label: label.to_string(),
                })
            },
            decode,
        )
}

/// Resolve a template by id.
///
/// # Errors
///
/// Fails with `TemplateNotFound` when no template matches.
pub fn template(client: &dyn WorkspaceClient, id: &str) -> Result<Template> {
    client
        .find_one(DocKind::Template, &json!({ "_id": id }))?
        .map_or_else(
            || Err(TrackerError::TemplateNotFound { id: id.to_string() }),
            decode,
        )
}

/// Resolve an account by email.
///
/// # Errors
///
/// Fails with `AccountNotFound` when no account matches.
pub fn account(client: &dyn WorkspaceClient, email: &str) -> Result<Account> {
    client
        .find_one(DocKind::Account, &json!({ "email": email }))?
        .map_or_else(
            || {
                Err(TrackerError::AccountNotFound {
                    email: email.to_string(),
                })
            },
            decode,
        )
}

/// Direct sub-issues of an issue, one level.
///
/// # Errors
///
/// Returns an error if the remote call fails or a document does not decode.
pub fn sub_issues(client: &dyn WorkspaceClient, parent_id: &str) -> Result<Vec<Issue>> {
    client
        .find_all(
            DocKind::Issue,
            &json!({ "attachedTo": parent_id }),
            &FindOptions::default(),
        )?
        .into_iter()
        .map(decode)
        .collect()
}

/// Child records attached to a template.
///
/// # Errors
///
/// Returns an error if the remote call fails or a document does not decode.
pub fn template_children(
    client: &dyn WorkspaceClient,
    template_id: &str,
) -> Result<Vec<TemplateChild>> {
    client
        .find_all(
            DocKind::TemplateChild,
            &json!({ "attachedTo": template_id }),
            &FindOptions::default(),
        )?
        .into_iter()
        .map(decode)
        .collect()
}
