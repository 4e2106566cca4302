//! Error types and handling for `tracker_ops`.
//!
//! Every operation exposed to the tool-dispatch layer fails through the
//! single [`TrackerError`] taxonomy so the dispatch layer can map errors
//! into structured tool responses without string matching.
//!
//! # Design
//!
//! - Uses `thiserror` for derive-based error types
//! - Remote-client transport failures are carried as opaque `anyhow` errors
//! - Expected business outcomes (e.g. "already archived") are result values,
//!   never errors

use thiserror::Error;

/// Primary error type for `tracker_ops` operations.
#[derive(Error, Debug)]
pub enum TrackerError {
    // === Resolution Errors ===
    /// Project with the given identifier was not found.
    #[error("Project not found: {identifier}")]
    ProjectNotFound { identifier: String },

    /// Issue with the given code was not found.
    #[error("Issue not found: {identifier}")]
    IssueNotFound { identifier: String },

    /// Component with the given label was not found in the project.
    #[error("Component not found in {project}: {label}")]
    ComponentNotFound { project: String, label: String },

    /// Milestone with the given label was not found in the project.
    #[error("Milestone not found in {project}: {label}")]
    MilestoneNotFound { project: String, label: String },

    /// Template with the given id was not found.
    #[error("Template not found: {id}")]
    TemplateNotFound { id: String },

    /// Account with the given email was not found.
    #[error("Account not found: {email}")]
    AccountNotFound { email: String },

    /// Issue code does not match the `PREFIX-number` grammar.
    #[error("Invalid issue code format: {code}")]
    InvalidIssueCode { code: String },

    // === Validation Errors ===
    /// Field validation failed.
    #[error("Validation failed: {field}: {reason}")]
    Validation { field: String, reason: String },

    /// Update targeted a field outside the allow-list.
    #[error("Invalid field '{field}' (allowed: {})", .allowed.join(", "))]
    InvalidField {
        field: String,
        allowed: Vec<&'static str>,
    },

    /// Positional index out of range.
    #[error("Invalid index {index}: only {count} entries exist")]
    InvalidIndex { index: usize, count: usize },

    // === Deletion Errors ===
    /// Impact analysis found blockers and force was not set.
    #[error("Deletion of {identifier} blocked: {}", .blockers.join("; "))]
    Blocked {
        identifier: String,
        blockers: Vec<String>,
    },

    // === Transport / Decoding ===
    /// Opaque failure from the remote workspace client.
    #[error("Remote client error: {0}")]
    Client(#[from] anyhow::Error),

    /// A remote document did not decode into the expected shape.
    #[error("Document decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl TrackerError {
    /// Can the caller fix this by changing the request?
    #[must_use]
    pub const fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ProjectNotFound { .. }
                | Self::IssueNotFound { .. }
                | Self::ComponentNotFound { .. }
                | Self::MilestoneNotFound { .. }
                | Self::TemplateNotFound { .. }
                | Self::AccountNotFound { .. }
                | Self::InvalidIssueCode { .. }
                | Self::Validation { .. }
                | Self::InvalidField { .. }
                | Self::InvalidIndex { .. }
                | Self::Blocked { .. }
        )
    }

    /// Should the dispatch layer suggest retrying with force?
    #[must_use]
    pub const fn suggests_force(&self) -> bool {
        matches!(self, Self::Blocked { .. })
    }

    /// Human-friendly suggestion for fixing this error.
    #[must_use]
    pub const fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::Blocked { .. } => Some("Retry with force: true to override blockers"),
            Self::InvalidIssueCode { .. } => Some("Issue codes look like PROJ-123"),
            Self::InvalidField { .. } => Some("Update one of the allowed fields"),
            Self::InvalidIndex { .. } => Some("Indexes are zero-based"),
            _ => None,
        }
    }

    /// True when the error is a missing-entity condition.
    ///
    /// Force-delete bypasses blockers but never bypasses these.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ProjectNotFound { .. }
                | Self::IssueNotFound { .. }
                | Self::ComponentNotFound { .. }
                | Self::MilestoneNotFound { .. }
                | Self::TemplateNotFound { .. }
                | Self::AccountNotFound { .. }
        )
    }

    /// Create a validation error for a specific field.
    #[must_use]
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Result type using [`TrackerError`].
pub type Result<T> = std::result::Result<T, TrackerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TrackerError::IssueNotFound {
            identifier: "PROJ-42".to_string(),
        };
        assert_eq!(err.to_string(), "Issue not found: PROJ-42");
    }

    #[test]
    fn test_validation_error() {
        let err = TrackerError::validation("title", "cannot be empty");
        assert_eq!(err.to_string(), "Validation failed: title: cannot be empty");
    }

    #[test]
    fn test_blocked_display_joins_blockers() {
        let err = TrackerError::Blocked {
            identifier: "PROJ-1".to_string(),
            blockers: vec!["referenced by PROJ-9".to_string(), "pinned".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Deletion of PROJ-1 blocked: referenced by PROJ-9; pinned"
        );
        assert!(err.suggests_force());
    }

    #[test]
    fn test_not_found_classification() {
        let err = TrackerError::ProjectNotFound {
            identifier: "PROJ".to_string(),
        };
        assert!(err.is_not_found());
        assert!(err.is_user_recoverable());

        let err = TrackerError::Client(anyhow::anyhow!("connection reset"));
        assert!(!err.is_not_found());
        assert!(!err.is_user_recoverable());
    }

    #[test]
    fn test_invalid_field_lists_allowed() {
        let err = TrackerError::InvalidField {
            field: "color".to_string(),
            allowed: vec!["title", "priority"],
        };
        assert_eq!(
            err.to_string(),
            "Invalid field 'color' (allowed: title, priority)"
        );
    }
}
