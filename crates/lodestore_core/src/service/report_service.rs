//! Run report use-case service.
//!
//! # Responsibility
//! - Run the once-per-run `normalize()` + `compute_statistics()` pair.
//! - Delegate persistence to the report repository.
//!
//! # Invariants
//! - The tree is normalized exactly once before anything is persisted.
//! - Service APIs never persist a tree that failed normalization.

use crate::repo::report_repo::{
    PersistedResult, PersistedSummary, ReportRepoError, ReportRepository,
};
use crate::report::tree::{RunStatistics, SummaryTree, SummaryTreeError};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Errors from report service operations.
#[derive(Debug)]
pub enum ReportServiceError {
    /// Tree-level normalization failure.
    Tree(SummaryTreeError),
    /// Repository-level failure.
    Repo(ReportRepoError),
}

impl Display for ReportServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tree(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ReportServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Tree(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<SummaryTreeError> for ReportServiceError {
    fn from(value: SummaryTreeError) -> Self {
        Self::Tree(value)
    }
}

impl From<ReportRepoError> for ReportServiceError {
    fn from(value: ReportRepoError) -> Self {
        Self::Repo(value)
    }
}

/// Run report service facade.
pub struct ReportService<R: ReportRepository> {
    repo: R,
}

impl<R: ReportRepository> ReportService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Finalizes one run: normalize, roll up statistics, persist.
    ///
    /// # Contract
    /// - Call once after the producing phase completes; readers should use
    ///   the returned statistics or repository queries afterwards.
    ///
    /// # Side effects
    /// - Mutates the tree (ownership stamping, double-count removal).
    /// - Emits `run_finalize` logging events.
    pub fn finalize_run(&self, tree: &mut SummaryTree) -> Result<RunStatistics, ReportServiceError> {
        let run_uuid = tree.run_uuid();
        info!("event=run_finalize module=report status=start run_uuid={run_uuid}");

        if let Err(err) = tree.normalize() {
            error!(
                "event=run_finalize module=report status=error run_uuid={run_uuid} error_code=normalize_failed error={err}"
            );
            return Err(err.into());
        }

        let statistics = tree.compute_statistics();
        if let Err(err) = self.repo.save_run(tree, &statistics) {
            error!(
                "event=run_finalize module=report status=error run_uuid={run_uuid} error_code=save_failed error={err}"
            );
            return Err(err.into());
        }

        info!(
            "event=run_finalize module=report status=ok run_uuid={run_uuid} total_tests={} errors={} fatal_errors={}",
            statistics.total_tests, statistics.errors, statistics.fatal_errors
        );
        Ok(statistics)
    }

    /// Loads persisted statistics for one run.
    pub fn run_statistics(
        &self,
        run_uuid: Uuid,
    ) -> Result<Option<RunStatistics>, ReportServiceError> {
        self.repo.load_run_statistics(run_uuid).map_err(Into::into)
    }

    /// Lists persisted summaries for one run in stored order.
    pub fn summaries(&self, run_uuid: Uuid) -> Result<Vec<PersistedSummary>, ReportServiceError> {
        self.repo.list_summaries(run_uuid).map_err(Into::into)
    }

    /// Lists persisted results for one run, optionally scoped to a summary.
    pub fn results(
        &self,
        run_uuid: Uuid,
        summary_name: Option<&str>,
    ) -> Result<Vec<PersistedResult>, ReportServiceError> {
        self.repo
            .list_results(run_uuid, summary_name)
            .map_err(Into::into)
    }
}
