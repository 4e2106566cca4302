//! Validation helpers for template mutations.
//!
//! Updates go through an enumerated allow-list of fields, each mapped to its
//! own check, instead of accepting arbitrary field names. These routines
//! never touch the remote store.

use crate::error::{Result, TrackerError};
use crate::model::Priority;
use crate::template::TemplateData;
use serde_json::{json, Value};

/// Fields a single-field template update may target.
pub const TEMPLATE_UPDATE_FIELDS: &[&str] = &[
    "title",
    "description",
    "priority",
    "estimation",
    "assignee",
    "component",
    "milestone",
];

/// Validate one template update and return the normalized update object.
///
/// # Errors
///
/// Fails with `InvalidField` for a field outside the allow-list and
/// `Validation` when the value does not pass that field's check.
pub fn template_update_field(field: &str, value: &Value) -> Result<Value> {
    match field {
        "title" => {
            let title = value
                .as_str()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| TrackerError::validation("title", "cannot be empty"))?;
            Ok(json!({ "title": title }))
        }
        "description" => match value {
            Value::Null | Value::String(_) => Ok(json!({ "description": value })),
            _ => Err(TrackerError::validation("description", "must be a string")),
        },
        "priority" => {
            let raw = value
                .as_str()
                .ok_or_else(|| TrackerError::validation("priority", "must be a string"))?;
            let priority: Priority = raw.parse()?;
            Ok(json!({ "priority": priority }))
        }
        "estimation" => {
            let estimation = value
                .as_f64()
                .filter(|v| *v >= 0.0)
                .ok_or_else(|| {
                    TrackerError::validation("estimation", "must be a non-negative number")
                })?;
            Ok(json!({ "estimation": estimation }))
        }
        "assignee" | "component" | "milestone" => match value {
            Value::Null | Value::String(_) => {
                let mut update = serde_json::Map::new();
                update.insert(field.to_string(), value.clone());
                Ok(Value::Object(update))
            }
            _ => Err(TrackerError::validation(field, "must be a string or null")),
        },
        other => Err(TrackerError::InvalidField {
            field: other.to_string(),
            allowed: TEMPLATE_UPDATE_FIELDS.to_vec(),
        }),
    }
}

/// Validate template creation data, children included.
///
/// # Errors
///
/// Fails with `Validation` naming the offending field.
pub fn template_data(data: &TemplateData) -> Result<()> {
    if data.title.trim().is_empty() {
        return Err(TrackerError::validation("title", "cannot be empty"));
    }
    if data.estimation.is_some_and(|e| e < 0.0) {
        return Err(TrackerError::validation(
            "estimation",
            "must be a non-negative number",
        ));
    }
    for (index, child) in data.children.iter().enumerate() {
        if child.title.trim().is_empty() {
            return Err(TrackerError::validation(
                format!("children[{index}].title"),
                "cannot be empty",
            ));
        }
        if child.estimation.is_some_and(|e| e < 0.0) {
            return Err(TrackerError::validation(
                format!("children[{index}].estimation"),
                "must be a non-negative number",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::ChildTemplateData;

    #[test]
    fn test_title_update_trims_and_rejects_blank() {
        let update = template_update_field("title", &json!("  Fix login  ")).unwrap();
        assert_eq!(update, json!({ "title": "Fix login" }));

        let err = template_update_field("title", &json!("   ")).unwrap_err();
        assert!(matches!(err, TrackerError::Validation { .. }));
    }

    #[test]
    fn test_priority_update_parses() {
        let update = template_update_field("priority", &json!("high")).unwrap();
        assert_eq!(update, json!({ "priority": "high" }));

        assert!(template_update_field("priority", &json!("blocker")).is_err());
        assert!(template_update_field("priority", &json!(3)).is_err());
    }

    #[test]
    fn test_estimation_update_rejects_negative() {
        assert!(template_update_field("estimation", &json!(2.5)).is_ok());
        assert!(template_update_field("estimation", &json!(-1)).is_err());
        assert!(template_update_field("estimation", &json!("2")).is_err());
    }

    #[test]
    fn test_reference_fields_accept_null_to_clear() {
        let update = template_update_field("assignee", &Value::Null).unwrap();
        assert_eq!(update, json!({ "assignee": null }));
    }

    #[test]
    fn test_unknown_field_lists_allow_list() {
        let err = template_update_field("color", &json!("red")).unwrap_err();
        match err {
            TrackerError::InvalidField { field, allowed } => {
                assert_eq!(field, "color");
                assert_eq!(allowed, TEMPLATE_UPDATE_FIELDS);
            }
            other => panic!("expected InvalidField, got {other}"),
        }
    }

    #[test]
    fn test_template_data_checks_children() {
        let mut data = TemplateData {
            title: "Release checklist".to_string(),
            ..TemplateData::default()
        };
        assert!(template_data(&data).is_ok());

        data.children.push(ChildTemplateData {
            title: " ".to_string(),
            ..ChildTemplateData::default()
        });
        let err = template_data(&data).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation failed: children[0].title: cannot be empty"
        );
    }
}
