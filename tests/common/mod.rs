#![allow(dead_code)]

pub use adwatch_test_utils::{builders, fake_runner, init_tracing, with_timeout};

use adwatch::engine::{RunReport, RunSummary};

/// Unwrap a completed run, failing the test on lock contention.
pub fn completed(report: RunReport) -> RunSummary {
    match report {
        RunReport::Completed(summary) => summary,
        other => panic!("expected a completed run, got {other:?}"),
    }
}
