//! Lazy aggregate summary tree for one run.
//!
//! # Responsibility
//! - Own the run-level forest of summaries and top-level results.
//! - Provide the upsert/append producer API and the normalize/statistics
//!   consumer API.
//!
//! # Invariants
//! - Summary names are unique after upsert; last write wins by name.
//! - After `normalize()`, no result is present both at top level and
//!   inside a summary's result collection.
//! - `normalize()` is idempotent and rejects cyclic parent chains.

use crate::model::run::{EnvironmentSnapshot, ResultId, ResultOwner, RunResult, RunSummary};
use std::collections::{BTreeMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Result type used by summary tree operations.
pub type SummaryTreeResult<T> = Result<T, SummaryTreeError>;

/// Errors from summary tree normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryTreeError {
    /// A summary's parent chain loops back onto itself.
    CyclicOwnership { name: String },
}

impl Display for SummaryTreeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CyclicOwnership { name } => {
                write!(f, "summary parent chain contains a cycle at `{name}`")
            }
        }
    }
}

impl Error for SummaryTreeError {}

/// Rolled-up counters for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunStatistics {
    /// Total tests across root summaries plus top-level results.
    pub total_tests: u32,
    /// Tests with regular errors.
    pub errors: u32,
    /// Tests with fatal errors.
    pub fatal_errors: u32,
}

/// Deferred-loading forest of summaries and top-level results for one run.
///
/// Backing containers stay unallocated until the first producer call; from
/// the caller's perspective an unmaterialized container reads as empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryTree {
    run_uuid: Uuid,
    environment: EnvironmentSnapshot,
    summaries: Option<Vec<RunSummary>>,
    results: Option<Vec<RunResult>>,
}

impl SummaryTree {
    /// Creates an empty tree for a new run with a generated run id.
    pub fn new(environment: EnvironmentSnapshot) -> Self {
        Self::with_run_id(Uuid::new_v4(), environment)
    }

    /// Creates an empty tree for a run whose identity already exists.
    pub fn with_run_id(run_uuid: Uuid, environment: EnvironmentSnapshot) -> Self {
        Self {
            run_uuid,
            environment,
            summaries: None,
            results: None,
        }
    }

    /// Returns the stable run identity.
    pub fn run_uuid(&self) -> Uuid {
        self.run_uuid
    }

    /// Returns the caller-supplied environment snapshot.
    pub fn environment(&self) -> &EnvironmentSnapshot {
        &self.environment
    }

    /// Returns the summary collection. Never allocates.
    pub fn summaries(&self) -> &[RunSummary] {
        self.summaries.as_deref().unwrap_or(&[])
    }

    /// Returns the top-level result collection. Never allocates.
    pub fn results(&self) -> &[RunResult] {
        self.results.as_deref().unwrap_or(&[])
    }

    /// Inserts one summary, replacing any prior summary with the same name.
    ///
    /// # Contract
    /// - Last write wins by name, not by identity.
    /// - Survivors keep insertion order; the new summary is appended last.
    pub fn upsert_summary(&mut self, summary: RunSummary) {
        let slot = self.summaries_slot();
        slot.retain(|existing| existing.name != summary.name);
        slot.push(summary);
    }

    /// Appends one top-level result.
    ///
    /// No deduplication: results are not expected to collide, and repeated
    /// insertion of an equal-valued result produces duplicate entries.
    pub fn add_result(&mut self, result: RunResult) {
        self.results_slot().push(result);
    }

    /// Assigns owner back-references and removes double-counted results.
    ///
    /// # Contract
    /// - Every reachable summary is stamped with this run; every result
    ///   nested in a summary is stamped with that summary's name.
    /// - Top-level results already owned by some summary are dropped;
    ///   survivors are stamped as run-owned.
    /// - Idempotent: a second call leaves the tree unchanged.
    ///
    /// # Errors
    /// - `CyclicOwnership` when any summary's parent chain loops. The tree
    ///   is left unmodified in that case.
    pub fn normalize(&mut self) -> SummaryTreeResult<()> {
        self.ensure_acyclic()?;

        let run_uuid = self.run_uuid;
        let mut claimed: HashSet<ResultId> = HashSet::new();
        if let Some(summaries) = self.summaries.as_mut() {
            for summary in summaries.iter_mut() {
                summary.claim_results(run_uuid);
                for result in summary.results() {
                    claimed.insert(result.result_uuid);
                }
            }
        }

        if let Some(results) = self.results.as_mut() {
            // Filter semantics instead of forward-scan-with-removal, so
            // dropping element i can never skip element i+1.
            results.retain(|result| {
                !claimed.contains(&result.result_uuid)
                    && !matches!(result.owner, Some(ResultOwner::Summary(_)))
            });
            for result in results.iter_mut() {
                result.owner = Some(ResultOwner::Run);
            }
        }

        Ok(())
    }

    /// Rolls up run statistics from root summaries and top-level results.
    ///
    /// # Contract
    /// - Roots are summaries with no parent; nested summaries contribute
    ///   through their root's stored counters only.
    /// - One top-level result counts as an error or a fatal error, never
    ///   both; the regular error flag wins. This mirrors historical report
    ///   semantics and is deliberate.
    pub fn compute_statistics(&self) -> RunStatistics {
        let mut statistics = RunStatistics::default();

        for summary in self.summaries() {
            if summary.parent.is_some() {
                continue;
            }
            statistics.total_tests += summary.total_tests;
            statistics.errors += summary.errors;
            statistics.fatal_errors += summary.fatal_errors;
        }

        for result in self.results() {
            statistics.total_tests += 1;
            if result.has_error {
                statistics.errors += 1;
            } else if result.has_fatal_error {
                statistics.fatal_errors += 1;
            }
        }

        statistics
    }

    /// Returns whether both collections are empty. Does not recurse into
    /// results nested inside summaries.
    pub fn is_empty(&self) -> bool {
        self.summaries().is_empty() && self.results().is_empty()
    }

    /// Materializes the summary container on first mutable access.
    fn summaries_slot(&mut self) -> &mut Vec<RunSummary> {
        self.summaries.get_or_insert_with(Vec::new)
    }

    /// Materializes the top-level result container on first mutable access.
    fn results_slot(&mut self) -> &mut Vec<RunResult> {
        self.results.get_or_insert_with(Vec::new)
    }

    fn ensure_acyclic(&self) -> SummaryTreeResult<()> {
        let summaries = self.summaries();
        let parents: BTreeMap<&str, Option<&str>> = summaries
            .iter()
            .map(|summary| (summary.name.as_str(), summary.parent.as_deref()))
            .collect();

        for summary in summaries {
            let mut visited = HashSet::new();
            visited.insert(summary.name.as_str());

            let mut cursor = summary.parent.as_deref();
            while let Some(current) = cursor {
                if !visited.insert(current) {
                    return Err(SummaryTreeError::CyclicOwnership {
                        name: summary.name.clone(),
                    });
                }
                // A parent name with no matching summary ends the chain;
                // dangling parents are not this check's concern.
                cursor = parents.get(current).copied().flatten();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{RunStatistics, SummaryTree, SummaryTreeError};
    use crate::model::run::{EnvironmentSnapshot, ResultOwner, RunResult, RunSummary};

    fn environment() -> EnvironmentSnapshot {
        EnvironmentSnapshot::new("ci-host-01", "linux", "rustc 1.80.0")
    }

    #[test]
    fn containers_stay_unmaterialized_until_first_producer_call() {
        let mut tree = SummaryTree::new(environment());
        assert!(tree.summaries.is_none());
        assert!(tree.results.is_none());

        assert!(tree.summaries().is_empty());
        assert!(tree.results().is_empty());
        assert!(tree.summaries.is_none(), "read access must not allocate");
        assert!(tree.results.is_none(), "read access must not allocate");

        tree.add_result(RunResult::passed("t1"));
        assert!(tree.results.is_some());
        assert!(tree.summaries.is_none());
    }

    #[test]
    fn upsert_replaces_by_name_and_appends_last() {
        let mut tree = SummaryTree::new(environment());
        tree.upsert_summary(RunSummary::new("Core").with_counters(1, 0, 0));
        tree.upsert_summary(RunSummary::new("Query"));
        tree.upsert_summary(RunSummary::new("Core").with_counters(9, 2, 1));

        let names: Vec<&str> = tree.summaries().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Query", "Core"]);
        assert_eq!(tree.summaries()[1].total_tests, 9, "second write must win");
    }

    #[test]
    fn add_result_keeps_duplicates() {
        let mut tree = SummaryTree::new(environment());
        let result = RunResult::passed("t1");
        tree.add_result(result.clone());
        tree.add_result(result);
        assert_eq!(tree.results().len(), 2);
    }

    #[test]
    fn normalize_removes_results_owned_by_summaries() {
        let mut tree = SummaryTree::new(environment());

        let nested = RunResult::with_error("nested");
        let mut summary = RunSummary::new("Core");
        summary.add_result(nested.clone());
        tree.upsert_summary(summary);

        // Same result streamed to the top level as well: double counted
        // until normalization.
        tree.add_result(nested);
        tree.add_result(RunResult::passed("top"));

        tree.normalize().expect("acyclic tree must normalize");

        assert_eq!(tree.results().len(), 1);
        assert_eq!(tree.results()[0].test_name, "top");
        assert_eq!(tree.results()[0].owner, Some(ResultOwner::Run));
        assert_eq!(
            tree.summaries()[0].results()[0].owner,
            Some(ResultOwner::Summary("Core".to_string()))
        );
        assert_eq!(tree.summaries()[0].owner_run, Some(tree.run_uuid()));
    }

    #[test]
    fn normalize_is_idempotent() {
        let mut tree = SummaryTree::new(environment());
        let nested = RunResult::with_error("nested");
        let mut summary = RunSummary::new("Core").with_counters(3, 1, 0);
        summary.add_result(nested.clone());
        tree.upsert_summary(summary);
        tree.add_result(nested);
        tree.add_result(RunResult::passed("top"));

        tree.normalize().expect("first normalize must succeed");
        let after_first = tree.clone();
        tree.normalize().expect("second normalize must succeed");
        assert_eq!(tree, after_first);
    }

    #[test]
    fn normalize_rejects_cyclic_parent_chains() {
        let mut tree = SummaryTree::new(environment());
        tree.upsert_summary(RunSummary::new("A").with_parent("B"));
        tree.upsert_summary(RunSummary::new("B").with_parent("A"));

        let err = tree.normalize().expect_err("cycle must be rejected");
        assert!(matches!(err, SummaryTreeError::CyclicOwnership { .. }));
    }

    #[test]
    fn normalize_rejects_self_parenting() {
        let mut tree = SummaryTree::new(environment());
        tree.upsert_summary(RunSummary::new("A").with_parent("A"));

        let err = tree.normalize().expect_err("self-parent must be rejected");
        assert_eq!(
            err,
            SummaryTreeError::CyclicOwnership {
                name: "A".to_string()
            }
        );
    }

    #[test]
    fn normalize_tolerates_dangling_parent_names() {
        let mut tree = SummaryTree::new(environment());
        tree.upsert_summary(RunSummary::new("Child").with_parent("MissingParent"));
        tree.normalize()
            .expect("dangling parent must not be treated as a cycle");
    }

    #[test]
    fn statistics_sum_roots_and_top_level_results() {
        let mut tree = SummaryTree::new(environment());
        tree.upsert_summary(RunSummary::new("Core").with_counters(5, 1, 0));
        tree.add_result(RunResult::with_error("top"));

        let statistics = tree.compute_statistics();
        assert_eq!(
            statistics,
            RunStatistics {
                total_tests: 6,
                errors: 2,
                fatal_errors: 0
            }
        );
    }

    #[test]
    fn statistics_skip_nested_summaries() {
        let mut tree = SummaryTree::new(environment());
        tree.upsert_summary(RunSummary::new("Core").with_counters(5, 0, 0));
        tree.upsert_summary(
            RunSummary::new("Core.Inner")
                .with_parent("Core")
                .with_counters(100, 100, 100),
        );

        let statistics = tree.compute_statistics();
        assert_eq!(statistics.total_tests, 5);
        assert_eq!(statistics.errors, 0);
        assert_eq!(statistics.fatal_errors, 0);
    }

    #[test]
    fn fatal_error_counts_only_when_error_flag_is_clear() {
        let mut tree = SummaryTree::new(environment());
        tree.add_result(RunResult::with_fatal_error("fatal-only"));
        tree.add_result(RunResult::with_flags("both", true, true));

        let statistics = tree.compute_statistics();
        assert_eq!(statistics.total_tests, 2);
        // `both` counts as an error, not a fatal error.
        assert_eq!(statistics.errors, 1);
        assert_eq!(statistics.fatal_errors, 1);
    }

    #[test]
    fn empty_tree_reports_empty_and_zero_statistics() {
        let tree = SummaryTree::new(environment());
        assert!(tree.is_empty());
        assert_eq!(tree.compute_statistics(), RunStatistics::default());
    }

    #[test]
    fn is_empty_does_not_recurse_into_summaries() {
        let mut tree = SummaryTree::new(environment());
        tree.upsert_summary(RunSummary::new("Core"));
        assert!(!tree.is_empty());
    }
}
