//! Bulk deletion orchestration.
//!
//! Sequences the deletion engine over a list of issue codes in fixed-size
//! consecutive batches. Items run strictly sequentially; there is no
//! rollback, so items processed before a failure keep their effects.

use crate::client::WorkspaceClient;
use crate::delete::{self, DeleteOptions};
use crate::error::{Result, TrackerError};
use crate::model::is_false;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default number of issues per batch.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Policy for a bulk deletion.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct BulkOptions {
    /// Issues per batch; must be at least 1.
    pub batch_size: usize,
    /// Record a failed item and keep going instead of aborting.
    pub continue_on_error: bool,
    pub dry_run: bool,
    pub force: bool,
}

impl Default for BulkOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            continue_on_error: false,
            dry_run: false,
            force: false,
        }
    }
}

/// Outcome of one bulk item, in input order.
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkItemOutcome {
    pub identifier: String,
    pub success: bool,
    /// Documents deleted for this item (root plus cascaded sub-issues).
    pub deleted_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregate outcome of a bulk deletion.
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteResult {
    pub success: bool,
    pub total_requested: usize,
    pub success_count: usize,
    pub failed_count: usize,
    /// `ceil(total_requested / batch_size)`.
    pub batches: usize,
    pub results: Vec<BulkItemOutcome>,
    #[serde(skip_serializing_if = "is_false")]
    pub dry_run: bool,
}

/// Delete many issues, each with a full cascade.
///
/// Identifiers are partitioned into consecutive batches of
/// `options.batch_size` and processed sequentially. When
/// `continue_on_error` is set, a failed item becomes a recorded outcome and
/// processing continues; otherwise the failure propagates immediately and no
/// later item is attempted.
///
/// # Errors
///
/// Fails with `Validation` for a zero batch size, or with the first item
/// failure when `continue_on_error` is not set.
pub fn delete_issues(
    client: &dyn WorkspaceClient,
    codes: &[String],
    options: &BulkOptions,
) -> Result<BulkDeleteResult> {
    if options.batch_size == 0 {
        return Err(TrackerError::validation(
            "batch_size",
            "must be at least 1",
        ));
    }

    let per_item = DeleteOptions {
        cascade: true,
        force: options.force,
        dry_run: options.dry_run,
    };
    let batches = codes.len().div_ceil(options.batch_size);
    let mut results = Vec::with_capacity(codes.len());

    for (index, batch) in codes.chunks(options.batch_size).enumerate() {
        tracing::debug!(batch = index + 1, batches, size = batch.len(), "Processing batch");
        for code in batch {
            match delete::issue(client, code, &per_item) {
                Ok(outcome) => results.push(BulkItemOutcome {
                    identifier: code.clone(),
                    success: true,
                    deleted_count: outcome.deleted_count,
                    error: None,
                }),
                Err(err) if options.continue_on_error => {
                    tracing::warn!(identifier = %code, error = %err, "Bulk item failed");
                    results.push(BulkItemOutcome {
                        identifier: code.clone(),
                        success: false,
                        deleted_count: 0,
                        error: Some(err.to_string()),
                    });
                }
                Err(err) => return Err(err),
            }
        }
    }

    let success_count = results.iter().filter(|r| r.success).count();
    let failed_count = results.len() - success_count;
    Ok(BulkDeleteResult {
        success: failed_count == 0,
        total_requested: codes.len(),
        success_count,
        failed_count,
        batches,
        results,
        dry_run: options.dry_run,
    })
}
