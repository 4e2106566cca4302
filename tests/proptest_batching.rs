//! Property-based tests for bulk batch partitioning.
//!
//! Uses proptest to verify that:
//! - Batch count is always `ceil(total / batch_size)`
//! - Per-item results preserve input order
//! - Success and failure tallies always add up

mod common;

use proptest::prelude::*;
use tracker_ops::bulk::{self, BulkOptions};
use tracker_ops::client::MemoryClient;

/// Initialize test logging for proptest (called once per test)
fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_test_writer()
        .try_init();
}

fn workspace(total: usize, missing_every: Option<usize>) -> (MemoryClient, Vec<String>) {
    let client = MemoryClient::new();
    let space = common::project(&client, "PROJ");
    let mut codes = Vec::with_capacity(total);
    for n in 1..=total {
        let code = format!("PROJ-{n}");
        let missing = missing_every.is_some_and(|every| n % every == 0);
        if !missing {
            common::issue(&client, &space, &code, None);
        }
        codes.push(code);
    }
    (client, codes)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        ..Default::default()
    })]

    /// Property: batch count is the ceiling of total over batch size.
    #[test]
    fn batches_is_always_ceiling(total in 0_usize..40, batch_size in 1_usize..16) {
        init_test_logging();
        let (client, codes) = workspace(total, None);
        let options = BulkOptions { batch_size, ..BulkOptions::default() };
        let result = bulk::delete_issues(&client, &codes, &options).unwrap();

        prop_assert_eq!(result.batches, total.div_ceil(batch_size));
        prop_assert_eq!(result.total_requested, total);
        prop_assert_eq!(result.success_count, total);
    }

    /// Property: results preserve input order and tallies add up, even with
    /// failures sprinkled in.
    #[test]
    fn tallies_and_order_hold_under_failures(
        total in 1_usize..30,
        batch_size in 1_usize..8,
        missing_every in 2_usize..6,
    ) {
        init_test_logging();
        let (client, codes) = workspace(total, Some(missing_every));
        let options = BulkOptions {
            batch_size,
            continue_on_error: true,
            ..BulkOptions::default()
        };
        let result = bulk::delete_issues(&client, &codes, &options).unwrap();

        prop_assert_eq!(result.success_count + result.failed_count, total);
        prop_assert_eq!(result.failed_count, total / missing_every);
        prop_assert_eq!(result.success, result.failed_count == 0);
        let order: Vec<&str> = result.results.iter().map(|r| r.identifier.as_str()).collect();
        let expected: Vec<&str> = codes.iter().map(String::as_str).collect();
        prop_assert_eq!(order, expected);
    }

    /// Property: dry-run never mutates, whatever the batching looks like.
    #[test]
    fn dry_run_is_always_read_only(total in 0_usize..20, batch_size in 1_usize..8) {
        init_test_logging();
        let (client, codes) = workspace(total, None);
        let options = BulkOptions { batch_size, dry_run: true, ..BulkOptions::default() };
        let result = bulk::delete_issues(&client, &codes, &options).unwrap();

        prop_assert!(result.dry_run);
        prop_assert_eq!(client.mutation_count(), 0);
        prop_assert_eq!(result.success_count, total);
    }
}
