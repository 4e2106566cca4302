//! Typed views of remote tracker documents.
//!
//! Entities live in the remote workspace as schemaless documents; this module
//! defines the shapes the engine actually reads:
//! - `Project` - owns issues, components, milestones and templates
//! - `Issue` - the core work item, self-referential via `attached_to`
//! - `Component` / `Milestone` - labels referenced by issues
//! - `Template` / `TemplateChild` - one-level template hierarchy
//! - `Account` - assignee lookup by email
//!
//! Field names follow the remote wire format (camelCase), so every document
//! struct decodes straight from a `find_one`/`find_all` payload.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[allow(clippy::trivially_copy_pass_by_ref)]
pub(crate) const fn is_false(b: &bool) -> bool {
    !*b
}

/// Issue priority, highest first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default,
)]
#[serde(rename_all = "camelCase")]
pub enum Priority {
    #[default]
    NoPriority,
    Urgent,
    High,
    Medium,
    Low,
}

impl Priority {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoPriority => "noPriority",
            Self::Urgent => "urgent",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Priority {
    type Err = crate::error::TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "nopriority" | "no-priority" | "none" => Ok(Self::NoPriority),
            "urgent" => Ok(Self::Urgent),
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            other => Err(crate::error::TrackerError::validation(
                "priority",
                format!("unknown priority '{other}'"),
            )),
        }
    }
}

/// Issue lifecycle status.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default,
)]
#[serde(rename_all = "camelCase")]
pub enum IssueStatus {
    #[default]
    Backlog,
    Todo,
    InProgress,
    Done,
    Cancelled,
}

impl IssueStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Backlog => "backlog",
            Self::Todo => "todo",
            Self::InProgress => "inProgress",
            Self::Done => "done",
            Self::Cancelled => "cancelled",
        }
    }

    /// Active issues block project deletion.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Backlog | Self::Todo | Self::InProgress)
    }
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for IssueStatus {
    type Err = crate::error::TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "backlog" => Ok(Self::Backlog),
            "todo" => Ok(Self::Todo),
            "inprogress" | "in-progress" | "in_progress" => Ok(Self::InProgress),
            "done" => Ok(Self::Done),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            other => Err(crate::error::TrackerError::validation(
                "status",
                format!("unknown status '{other}'"),
            )),
        }
    }
}

/// A tracker project (space).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(rename = "_id")]
    pub id: String,
    /// Human-facing code, e.g. `PROJ`.
    pub identifier: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub archived: bool,
    /// Monotonic counter used to mint issue codes (`PROJ-<n>`).
    #[serde(default)]
    pub sequence: u64,
    #[serde(default)]
    pub modified_on: Option<DateTime<Utc>>,
}

/// A work item. `attached_to` points at the parent issue for sub-issues.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    #[serde(rename = "_id")]
    pub id: String,
    /// Human-facing code, e.g. `PROJ-123`.
    pub identifier: String,
    pub title: String,
    /// Owning project id.
    pub space: String,
    /// Parent issue id when this is a sub-issue.
    #[serde(default)]
    pub attached_to: Option<String>,
    #[serde(default)]
    pub component: Option<String>,
    #[serde(default)]
    pub milestone: Option<String>,
    #[serde(default)]
    pub status: IssueStatus,
    #[serde(default)]
    pub priority: Priority,
    /// Ids of issues this issue is blocked by.
    #[serde(default)]
    pub blocked_by: Vec<String>,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub modified_on: Option<DateTime<Utc>>,
}

/// A project component referenced by issues.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    #[serde(rename = "_id")]
    pub id: String,
    pub label: String,
    pub space: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A project milestone referenced by issues.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    #[serde(rename = "_id")]
    pub id: String,
    pub label: String,
    pub space: String,
    #[serde(default)]
    pub target_date: Option<DateTime<Utc>>,
}

/// An issue template. Children hang off it one level deep.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub space: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub estimation: f64,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub component: Option<String>,
    #[serde(default)]
    pub milestone: Option<String>,
}

/// A child record attached to a template.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TemplateChild {
    #[serde(rename = "_id")]
    pub id: String,
    /// Parent template id.
    pub attached_to: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub estimation: f64,
    #[serde(default)]
    pub assignee: Option<String>,
}

/// A workspace account, looked up by email for assignee fields.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}
