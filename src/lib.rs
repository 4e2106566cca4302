//! `tracker_ops` - project-tracker operations for an agent-facing tool layer.
//!
//! Translates tool invocations (delete an issue tree, archive a project,
//! expand a template) into sequential calls against a remote workspace's
//! document client. The heart of the crate is the cascading deletion engine:
//! impact analysis, children-before-parent traversal, dry-run simulation,
//! force override and batched bulk deletion.
//!
//! The tool-dispatch layer, the concrete remote transport, credential
//! loading and log subscriber setup all live outside this crate; operations
//! take a [`client::WorkspaceClient`] and return plain result objects,
//! throwing only for `NotFound`/validation/blocked conditions.
//!
//! ```
//! use tracker_ops::client::{DocKind, MemoryClient};
//! use tracker_ops::delete::{self, DeleteOptions};
//! use serde_json::json;
//!
//! let client = MemoryClient::new();
//! client.seed(DocKind::Project, json!({"_id": "p1", "identifier": "PROJ", "name": "Demo"}));
//! client.seed(DocKind::Issue, json!({
//!     "_id": "i1", "identifier": "PROJ-1", "title": "Root", "space": "p1"
//! }));
//!
//! let options = DeleteOptions { dry_run: true, ..DeleteOptions::default() };
//! let report = delete::issue(&client, "PROJ-1", &options).unwrap();
//! assert_eq!(report.deleted_count, 1);
//! assert_eq!(client.mutation_count(), 0);
//! ```

pub mod bulk;
pub mod client;
pub mod delete;
pub mod error;
pub mod impact;
pub mod model;
pub mod resolve;
pub mod template;
pub mod validation;

pub use error::{Result, TrackerError};
