//! Template lifecycle and expansion scenarios.

mod common;

use serde_json::json;
use tracker_ops::client::{DocKind, FindOptions, MemoryClient, RemoteCall, WorkspaceClient};
use tracker_ops::template::{
    self, ChildTemplateData, IssueFromTemplate, TemplateData,
};
use tracker_ops::TrackerError;

#[test]
fn full_template_lifecycle() {
    let client = MemoryClient::new();
    common::project(&client, "PROJ");
    common::account(&client, "lead@example.com");

    let created = template::create(
        &client,
        "PROJ",
        &TemplateData {
            title: "Incident response".to_string(),
            description: Some("Runbook for production incidents".to_string()),
            assignee: Some("lead@example.com".to_string()),
            children: vec![
                ChildTemplateData {
                    title: "Triage".to_string(),
                    ..ChildTemplateData::default()
                },
                ChildTemplateData {
                    title: "Postmortem".to_string(),
                    ..ChildTemplateData::default()
                },
            ],
            ..TemplateData::default()
        },
    )
    .unwrap();
    assert_eq!(created.children_created, 2);

    let listed = template::list(&client, "PROJ").unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].children, 2);

    let found = template::search(&client, "incident", Some("PROJ"), None).unwrap();
    assert_eq!(found.len(), 1);
    let missed = template::search(&client, "deploy", Some("PROJ"), None).unwrap();
    assert!(missed.is_empty());

    template::update(&client, &created.template_id, "title", &json!("Incident runbook")).unwrap();
    let details = template::details(&client, &created.template_id).unwrap();
    assert_eq!(details.template.title, "Incident runbook");

    let added = template::add_child(
        &client,
        &created.template_id,
        &ChildTemplateData {
            title: "Notify stakeholders".to_string(),
            ..ChildTemplateData::default()
        },
    )
    .unwrap();
    assert_eq!(
        template::details(&client, &created.template_id)
            .unwrap()
            .children
            .len(),
        3
    );

    let removed = template::remove_child(&client, &created.template_id, 2).unwrap();
    assert_eq!(removed.removed_title, "Notify stakeholders");
    assert!(!client.contains(DocKind::TemplateChild, &added.child_id));

    let deleted = template::delete(&client, &created.template_id).unwrap();
    assert_eq!(deleted.deleted_children, 2);
    assert!(!client.contains(DocKind::Template, &created.template_id));
}

#[test]
fn update_outside_allow_list_is_rejected() {
    let client = MemoryClient::new();
    let space = common::project(&client, "PROJ");
    let template_id = common::template(&client, &space, "Bug report");

    let err = template::update(&client, &template_id, "space", &json!("elsewhere")).unwrap_err();
    assert!(matches!(err, TrackerError::InvalidField { .. }));

    let err = template::update(&client, &template_id, "title", &json!("")).unwrap_err();
    assert!(matches!(err, TrackerError::Validation { .. }));
}

#[test]
fn remove_child_with_bad_index_fails() {
    let client = MemoryClient::new();
    let space = common::project(&client, "PROJ");
    let template_id = common::template(&client, &space, "Bug report");
    common::template_child(&client, &template_id, "Reproduce");

    let err = template::remove_child(&client, &template_id, 1).unwrap_err();
    assert!(matches!(
        err,
        TrackerError::InvalidIndex { index: 1, count: 1 }
    ));
}

#[test]
fn expansion_with_two_children_makes_exactly_three_creation_calls() {
    let client = MemoryClient::new();
    let space = common::project(&client, "PROJ");
    let template_id = common::template(&client, &space, "Bug report");
    common::template_child(&client, &template_id, "Reproduce");
    common::template_child(&client, &template_id, "Fix");
    client.clear_journal();

    let result =
        template::create_issue(&client, &template_id, &IssueFromTemplate::default()).unwrap();

    assert!(result.success);
    assert_eq!(result.children_created, 2);
    let creations = client
        .journal()
        .iter()
        .filter(|call| {
            matches!(
                call,
                RemoteCall::CreateDoc { .. } | RemoteCall::AddCollection { .. }
            )
        })
        .count();
    assert_eq!(creations, 3);

    // Both children are attached under the freshly created parent.
    let children = client
        .find_all(
            DocKind::Issue,
            &json!({ "attachedTo": result.issue_id }),
            &FindOptions::default(),
        )
        .unwrap();
    assert_eq!(children.len(), 2);
}

#[test]
fn expansion_mints_sequential_codes_from_the_project_counter() {
    let client = MemoryClient::new();
    common::project(&client, "PROJ");
    let space = "space-proj";
    client
        .update_doc(DocKind::Project, space, json!({ "sequence": 41 }))
        .unwrap();
    let template_id = common::template(&client, space, "Bug report");
    common::template_child(&client, &template_id, "Reproduce");

    let result =
        template::create_issue(&client, &template_id, &IssueFromTemplate::default()).unwrap();
    assert_eq!(result.identifier, "PROJ-42");

    let project = client.get(DocKind::Project, space).unwrap();
    assert_eq!(project["sequence"], 43);
}

#[test]
fn expansion_without_children_only_creates_the_parent() {
    let client = MemoryClient::new();
    let space = common::project(&client, "PROJ");
    let template_id = common::template(&client, &space, "Bug report");
    common::template_child(&client, &template_id, "Reproduce");

    let overrides = IssueFromTemplate {
        include_children: false,
        ..IssueFromTemplate::default()
    };
    let result = template::create_issue(&client, &template_id, &overrides).unwrap();
    assert_eq!(result.children_created, 0);
    assert!(client.contains(DocKind::Issue, &result.issue_id));
}
