//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `lodestore_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

use lodestore_core::{EnvironmentSnapshot, RunResult, SummaryTree};

fn main() {
    // Tiny probe validating core crate wiring without a host application.
    println!("lodestore_core ping={}", lodestore_core::ping());
    println!("lodestore_core version={}", lodestore_core::core_version());

    // Environment values are snapshotted here, at the process edge; the
    // core never reads them from globals.
    let environment = EnvironmentSnapshot::new(
        std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string()),
        std::env::consts::OS,
        lodestore_core::core_version(),
    );
    let mut tree = SummaryTree::new(environment);
    tree.add_result(RunResult::passed("smoke"));
    let statistics = tree.compute_statistics();
    println!(
        "lodestore_core smoke_total_tests={} smoke_errors={}",
        statistics.total_tests, statistics.errors
    );
}
