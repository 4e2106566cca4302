#![allow(dead_code)]

//! Shared fixtures for scenario tests: seed a `MemoryClient` with a small
//! workspace without going through the engine (the journal stays empty).

use serde_json::json;
use tracker_ops::client::{DocKind, MemoryClient};

/// Seed a project; the document id is derived from the identifier.
pub fn project(client: &MemoryClient, identifier: &str) -> String {
    client.seed(
        DocKind::Project,
        json!({
            "_id": format!("space-{}", identifier.to_lowercase()),
            "identifier": identifier,
            "name": format!("{identifier} workspace"),
        }),
    )
}

/// Seed an issue; the document id is derived from the code.
pub fn issue(client: &MemoryClient, space: &str, code: &str, parent: Option<&str>) -> String {
    client.seed(
        DocKind::Issue,
        json!({
            "_id": format!("doc-{code}"),
            "identifier": code,
            "title": format!("Issue {code}"),
            "space": space,
            "attachedTo": parent,
        }),
    )
}

/// Seed a closed issue (does not block project deletion).
pub fn done_issue(client: &MemoryClient, space: &str, code: &str) -> String {
    client.seed(
        DocKind::Issue,
        json!({
            "_id": format!("doc-{code}"),
            "identifier": code,
            "title": format!("Issue {code}"),
            "space": space,
            "status": "done",
        }),
    )
}

pub fn component(client: &MemoryClient, space: &str, label: &str) -> String {
    client.seed(
        DocKind::Component,
        json!({ "label": label, "space": space }),
    )
}

pub fn milestone(client: &MemoryClient, space: &str, label: &str) -> String {
    client.seed(
        DocKind::Milestone,
        json!({ "label": label, "space": space }),
    )
}

pub fn template(client: &MemoryClient, space: &str, title: &str) -> String {
    client.seed(
        DocKind::Template,
        json!({ "title": title, "space": space }),
    )
}

pub fn template_child(client: &MemoryClient, template_id: &str, title: &str) -> String {
    client.seed(
        DocKind::TemplateChild,
        json!({ "attachedTo": template_id, "title": title }),
    )
}

pub fn account(client: &MemoryClient, email: &str) -> String {
    client.seed(DocKind::Account, json!({ "email": email }))
}
