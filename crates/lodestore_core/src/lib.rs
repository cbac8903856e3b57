//! Core persistence-provider logic for LodeStore.
//! This crate is the single source of truth for cache-visibility and
//! run-report invariants.

pub mod cache;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod report;
pub mod service;

pub use cache::visibility::{resolve_visibility, CacheVisibilityIndex, SharedCacheMode};
pub use config::{ConfigValidationError, PersistenceUnitConfig, SHARED_CACHE_MODE_KEY};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::entity_type::{CacheableHint, EntityTypeDescriptor};
pub use model::run::{EnvironmentSnapshot, ResultId, ResultOwner, RunResult, RunSummary};
pub use repo::report_repo::{
    PersistedResult, PersistedSummary, ReportRepoError, ReportRepoResult, ReportRepository,
    SqliteReportRepository,
};
pub use report::tree::{RunStatistics, SummaryTree, SummaryTreeError, SummaryTreeResult};
pub use service::report_service::{ReportService, ReportServiceError};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
