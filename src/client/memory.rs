//! In-memory [`WorkspaceClient`] implementation.
//!
//! Backs the test suite and dry-run experiments: a mutex-guarded document
//! table with monotonic ids and equality filter matching. Every call is
//! journaled as a [`RemoteCall`] so tests can assert properties the result
//! objects alone cannot show — that a dry run issued zero mutations, or that
//! a cascade removed children before their parent.

use super::{DocKind, FindOptions, WorkspaceClient};
use crate::error::Result;
use anyhow::anyhow;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

/// One call issued against the client, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    FindOne { kind: DocKind },
    FindAll { kind: DocKind },
    CreateDoc { kind: DocKind, id: String },
    UpdateDoc { kind: DocKind, id: String },
    RemoveDoc { kind: DocKind, id: String },
    AddCollection { kind: DocKind, id: String },
    RemoveCollection { kind: DocKind, id: String },
}

impl RemoteCall {
    /// True for calls that change remote state.
    #[must_use]
    pub const fn is_mutation(&self) -> bool {
        !matches!(self, Self::FindOne { .. } | Self::FindAll { .. })
    }
}

#[derive(Default)]
struct State {
    docs: BTreeMap<DocKind, Vec<Value>>,
    journal: Vec<RemoteCall>,
    next_id: u64,
    fail_removals_of: HashSet<String>,
}

/// In-memory workspace client with a call journal.
#[derive(Default)]
pub struct MemoryClient {
    state: Mutex<State>,
}

impl MemoryClient {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a document without journaling, returning its id.
    ///
    /// Test fixtures use this so the journal only reflects engine activity.
    /// An `_id` field is minted when the caller does not provide one.
    ///
    /// # Panics
    ///
    /// Panics if `fields` is not a JSON object.
    pub fn seed(&self, kind: DocKind, fields: Value) -> String {
        let mut state = self.state.lock().expect("client state poisoned");
        let mut doc = match fields {
            Value::Object(map) => map,
            other => panic!("seeded document must be an object, got {other}"),
        };
        let id = match doc.get("_id").and_then(Value::as_str) {
            Some(id) => id.to_string(),
            None => {
                state.next_id += 1;
                let id = format!("{}-{}", kind.as_str(), state.next_id);
                doc.insert("_id".to_string(), Value::String(id.clone()));
                id
            }
        };
        state.docs.entry(kind).or_default().push(Value::Object(doc));
        id
    }

    /// Make future removals of `id` fail with a transport error.
    pub fn fail_removal_of(&self, id: impl Into<String>) {
        self.state
            .lock()
            .expect("client state poisoned")
            .fail_removals_of
            .insert(id.into());
    }

    /// Snapshot of every call issued so far, in order.
    #[must_use]
    pub fn journal(&self) -> Vec<RemoteCall> {
        self.state
            .lock()
            .expect("client state poisoned")
            .journal
            .clone()
    }

    /// Number of journaled calls that mutate remote state.
    #[must_use]
    pub fn mutation_count(&self) -> usize {
        self.journal().iter().filter(|c| c.is_mutation()).count()
    }

    /// Ids removed via `remove_doc`/`remove_collection`, in removal order.
    #[must_use]
    pub fn removed_ids(&self) -> Vec<String> {
        self.journal()
            .into_iter()
            .filter_map(|call| match call {
                RemoteCall::RemoveDoc { id, .. } | RemoteCall::RemoveCollection { id, .. } => {
                    Some(id)
                }
                _ => None,
            })
            .collect()
    }

    /// Forget all journaled calls.
    pub fn clear_journal(&self) {
        self.state
            .lock()
            .expect("client state poisoned")
            .journal
            .clear();
    }

    /// True when a document of `kind` with `id` still exists.
    #[must_use]
    pub fn contains(&self, kind: DocKind, id: &str) -> bool {
        self.get(kind, id).is_some()
    }

    /// Current copy of a stored document, if any.
    #[must_use]
    pub fn get(&self, kind: DocKind, id: &str) -> Option<Value> {
        let state = self.state.lock().expect("client state poisoned");
        state
            .docs
            .get(&kind)
            .and_then(|docs| docs.iter().find(|d| doc_id(d) == Some(id)).cloned())
    }
}

fn doc_id(doc: &Value) -> Option<&str> {
    doc.get("_id").and_then(Value::as_str)
}

/// Document-store equality matching: scalar equality, or membership when the
/// document field is an array. A `null` filter value matches a missing or
/// null field.
fn matches(doc: &Value, filter: &Value) -> bool {
    let Some(conditions) = filter.as_object() else {
        return true;
    };
    conditions.iter().all(|(key, wanted)| {
        let actual = doc.get(key).unwrap_or(&Value::Null);
        match actual {
            Value::Array(elements) => elements.contains(wanted) || actual == wanted,
            _ => actual == wanted,
        }
    })
}

impl WorkspaceClient for MemoryClient {
    fn find_one(&self, kind: DocKind, filter: &Value) -> Result<Option<Value>> {
        let mut state = self.state.lock().expect("client state poisoned");
        state.journal.push(RemoteCall::FindOne { kind });
        Ok(state
            .docs
            .get(&kind)
            .and_then(|docs| docs.iter().find(|d| matches(d, filter)).cloned()))
    }

    fn find_all(&self, kind: DocKind, filter: &Value, options: &FindOptions) -> Result<Vec<Value>> {
        let mut state = self.state.lock().expect("client state poisoned");
        state.journal.push(RemoteCall::FindAll { kind });
        let mut found: Vec<Value> = state
            .docs
            .get(&kind)
            .map(|docs| docs.iter().filter(|d| matches(d, filter)).cloned().collect())
            .unwrap_or_default();
        if let Some(limit) = options.limit {
            found.truncate(limit);
        }
        Ok(found)
    }

    fn create_doc(&self, kind: DocKind, fields: Value) -> Result<String> {
        let mut state = self.state.lock().expect("client state poisoned");
        state.next_id += 1;
        let id = format!("{}-{}", kind.as_str(), state.next_id);
        let mut doc = fields.as_object().cloned().unwrap_or_else(Map::new);
        doc.insert("_id".to_string(), Value::String(id.clone()));
        state.docs.entry(kind).or_default().push(Value::Object(doc));
        state
            .journal
            .push(RemoteCall::CreateDoc { kind, id: id.clone() });
        Ok(id)
    }

    fn update_doc(&self, kind: DocKind, id: &str, fields: Value) -> Result<()> {
        let mut state = self.state.lock().expect("client state poisoned");
        state.journal.push(RemoteCall::UpdateDoc {
            kind,
            id: id.to_string(),
        });
        let doc = state
            .docs
            .get_mut(&kind)
            .and_then(|docs| docs.iter_mut().find(|d| doc_id(d) == Some(id)))
            .ok_or_else(|| anyhow!("update target missing: {kind}/{id}"))?;
        if let (Value::Object(target), Value::Object(updates)) = (doc, fields) {
            for (key, value) in updates {
                target.insert(key, value);
            }
        }
        Ok(())
    }

    fn remove_doc(&self, kind: DocKind, id: &str) -> Result<()> {
        self.remove(kind, id, RemoteCall::RemoveDoc {
            kind,
            id: id.to_string(),
        })
    }

    fn add_collection(
        &self,
        kind: DocKind,
        attached_to: &str,
        space: &str,
        _attached_to_kind: DocKind,
        _collection: &str,
        fields: Value,
    ) -> Result<String> {
        let mut state = self.state.lock().expect("client state poisoned");
        state.next_id += 1;
        let id = format!("{}-{}", kind.as_str(), state.next_id);
        let mut doc = fields.as_object().cloned().unwrap_or_else(Map::new);
        doc.insert("_id".to_string(), Value::String(id.clone()));
        doc.insert(
            "attachedTo".to_string(),
            Value::String(attached_to.to_string()),
        );
        doc.insert("space".to_string(), Value::String(space.to_string()));
        state.docs.entry(kind).or_default().push(Value::Object(doc));
        state
            .journal
            .push(RemoteCall::AddCollection { kind, id: id.clone() });
        Ok(id)
    }

    fn remove_collection(&self, kind: DocKind, id: &str) -> Result<()> {
        self.remove(kind, id, RemoteCall::RemoveCollection {
            kind,
            id: id.to_string(),
        })
    }
}

impl MemoryClient {
    fn remove(&self, kind: DocKind, id: &str, call: RemoteCall) -> Result<()> {
        let mut state = self.state.lock().expect("client state poisoned");
        state.journal.push(call);
        if state.fail_removals_of.contains(id) {
            return Err(anyhow!("injected removal failure: {kind}/{id}").into());
        }
        let docs = state
            .docs
            .get_mut(&kind)
            .ok_or_else(|| anyhow!("removal target missing: {kind}/{id}"))?;
        let before = docs.len();
        docs.retain(|d| doc_id(d) != Some(id));
        if docs.len() == before {
            return Err(anyhow!("removal target missing: {kind}/{id}").into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_seed_does_not_journal() {
        let client = MemoryClient::new();
        let id = client.seed(DocKind::Issue, json!({"identifier": "PROJ-1"}));
        assert!(client.journal().is_empty());
        assert!(client.contains(DocKind::Issue, &id));
    }

    #[test]
    fn test_filter_scalar_equality() {
        let client = MemoryClient::new();
        client.seed(DocKind::Issue, json!({"identifier": "PROJ-1", "space": "s1"}));
        client.seed(DocKind::Issue, json!({"identifier": "PROJ-2", "space": "s2"}));

        let found = client
            .find_all(DocKind::Issue, &json!({"space": "s1"}), &FindOptions::default())
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["identifier"], "PROJ-1");
    }

    #[test]
    fn test_filter_matches_array_membership() {
        let client = MemoryClient::new();
        client.seed(DocKind::Issue, json!({"identifier": "PROJ-1", "blockedBy": ["x", "y"]}));

        let found = client
            .find_one(DocKind::Issue, &json!({"blockedBy": "x"}))
            .unwrap();
        assert!(found.is_some());
        let missing = client
            .find_one(DocKind::Issue, &json!({"blockedBy": "z"}))
            .unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_null_filter_matches_missing_field() {
        let client = MemoryClient::new();
        client.seed(DocKind::Issue, json!({"identifier": "PROJ-1"}));
        client.seed(DocKind::Issue, json!({"identifier": "PROJ-2", "attachedTo": "p"}));

        let found = client
            .find_all(DocKind::Issue, &json!({"attachedTo": null}), &FindOptions::default())
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["identifier"], "PROJ-1");
    }

    #[test]
    fn test_update_merges_and_clears_fields() {
        let client = MemoryClient::new();
        let id = client.seed(DocKind::Issue, json!({"title": "a", "component": "c1"}));
        client
            .update_doc(DocKind::Issue, &id, json!({"component": null, "title": "b"}))
            .unwrap();
        let doc = client.get(DocKind::Issue, &id).unwrap();
        assert_eq!(doc["title"], "b");
        assert_eq!(doc["component"], Value::Null);
    }

    #[test]
    fn test_remove_missing_doc_fails() {
        let client = MemoryClient::new();
        assert!(client.remove_doc(DocKind::Issue, "nope").is_err());
    }

    #[test]
    fn test_journal_orders_and_classifies_calls() {
        let client = MemoryClient::new();
        let id = client.create_doc(DocKind::Issue, json!({"title": "t"})).unwrap();
        client.find_one(DocKind::Issue, &json!({"_id": id})).unwrap();
        client.remove_doc(DocKind::Issue, &id).unwrap();

        let journal = client.journal();
        assert_eq!(journal.len(), 3);
        assert!(journal[0].is_mutation());
        assert!(!journal[1].is_mutation());
        assert_eq!(client.mutation_count(), 2);
        assert_eq!(client.removed_ids(), vec![id]);
    }

    #[test]
    fn test_injected_removal_failure() {
        let client = MemoryClient::new();
        let id = client.seed(DocKind::Issue, json!({"title": "t"}));
        client.fail_removal_of(&id);
        assert!(client.remove_doc(DocKind::Issue, &id).is_err());
        // Document survives the failed removal.
        assert!(client.contains(DocKind::Issue, &id));
    }
}
