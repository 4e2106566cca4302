//! The consumed surface of the remote workspace client.
//!
//! Everything this crate does against the remote store goes through the
//! [`WorkspaceClient`] trait: seven primitives, documents in and out as
//! `serde_json::Value` in the remote wire shape. Implementations live
//! outside this crate (the dispatch layer wires a real transport in);
//! [`memory::MemoryClient`] is the in-memory implementation the test suite
//! builds on.
//!
//! All calls may fail or return empty results; the engine never retries.

pub mod memory;

use crate::error::Result;
use serde_json::Value;
use std::fmt;

pub use memory::{MemoryClient, RemoteCall};

/// Document classes known to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DocKind {
    Project,
    Issue,
    Component,
    Milestone,
    Template,
    TemplateChild,
    Comment,
    Attachment,
    Account,
}

impl DocKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Issue => "issue",
            Self::Component => "component",
            Self::Milestone => "milestone",
            Self::Template => "template",
            Self::TemplateChild => "templateChild",
            Self::Comment => "comment",
            Self::Attachment => "attachment",
            Self::Account => "account",
        }
    }
}

impl fmt::Display for DocKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Options for [`WorkspaceClient::find_all`].
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    /// Maximum number of documents to return.
    pub limit: Option<usize>,
}

impl FindOptions {
    #[must_use]
    pub const fn limited(limit: usize) -> Self {
        Self { limit: Some(limit) }
    }
}

/// Narrow interface to the remote document store.
///
/// Filters are JSON objects with document-store equality semantics: a filter
/// value matches a scalar field by equality and an array field when it equals
/// any element.
pub trait WorkspaceClient: Send + Sync {
    /// Find the first document of `kind` matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote call fails.
    fn find_one(&self, kind: DocKind, filter: &Value) -> Result<Option<Value>>;

    /// Find all documents of `kind` matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote call fails.
    fn find_all(&self, kind: DocKind, filter: &Value, options: &FindOptions) -> Result<Vec<Value>>;

    /// Create a document and return its new id.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote call fails.
    fn create_doc(&self, kind: DocKind, fields: Value) -> Result<String>;

    /// Apply a partial update to an existing document.
    ///
    /// A `null` field value clears that field.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote call fails or the document is missing.
    fn update_doc(&self, kind: DocKind, id: &str, fields: Value) -> Result<()>;

    /// Remove a document.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote call fails or the document is missing.
    fn remove_doc(&self, kind: DocKind, id: &str) -> Result<()>;

    /// Create a document inside a parent's named collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote call fails.
    fn add_collection(
        &self,
        kind: DocKind,
        attached_to: &str,
        space: &str,
        attached_to_kind: DocKind,
        collection: &str,
        fields: Value,
    ) -> Result<String>;

    /// Remove a collection-attached document.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote call fails or the document is missing.
    fn remove_collection(&self, kind: DocKind, id: &str) -> Result<()>;
}
