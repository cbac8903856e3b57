//! Run report domain records.
//!
//! # Responsibility
//! - Define the result leaf and summary node collected during one run.
//! - Carry the environment snapshot supplied by the caller at run start.
//!
//! # Invariants
//! - `result_uuid` is stable and never reused for another result.
//! - Owner fields are non-owning back-references (run id or summary name);
//!   they confer no lifetime or ownership semantics.
//! - Summary counters are producer-set; the tree reads them, never derives
//!   them from child results.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for one run result leaf.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type ResultId = Uuid;

/// Non-owning back-reference from a result to whatever owns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultOwner {
    /// Owned directly by the run root.
    Run,
    /// Owned by the summary with this name.
    Summary(String),
}

/// Single test outcome leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    /// Stable result identity used for ownership bookkeeping.
    pub result_uuid: ResultId,
    /// Test name as reported by the execution layer.
    pub test_name: String,
    /// Outcome flag: the test raised a regular error.
    pub has_error: bool,
    /// Outcome flag: the test raised a fatal error. Not exclusive with
    /// `has_error` at the data level; aggregation treats error as stronger.
    pub has_fatal_error: bool,
    /// Owner back-reference. `None` until normalization assigns it.
    pub owner: Option<ResultOwner>,
}

impl RunResult {
    /// Creates a passing result with a generated stable identity.
    pub fn passed(test_name: impl Into<String>) -> Self {
        Self::with_flags(test_name, false, false)
    }

    /// Creates a result flagged with a regular error.
    pub fn with_error(test_name: impl Into<String>) -> Self {
        Self::with_flags(test_name, true, false)
    }

    /// Creates a result flagged with a fatal error.
    pub fn with_fatal_error(test_name: impl Into<String>) -> Self {
        Self::with_flags(test_name, false, true)
    }

    /// Creates a result with explicit outcome flags.
    pub fn with_flags(test_name: impl Into<String>, has_error: bool, has_fatal_error: bool) -> Self {
        Self {
            result_uuid: Uuid::new_v4(),
            test_name: test_name.into(),
            has_error,
            has_fatal_error,
            owner: None,
        }
    }
}

/// Aggregation node rolling child results into run-level counters.
///
/// Counters are stored, not derived: the producing test-execution layer
/// fills them in as suites complete, and nested child results may stay
/// unmaterialized without changing the counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Unique key within one run; upsert replaces by this name.
    pub name: String,
    /// Parent summary name. `None` means root-level summary.
    pub parent: Option<String>,
    /// Run that owns this summary. Assigned during normalization.
    pub owner_run: Option<Uuid>,
    /// Count of tests rolled up under this summary.
    pub total_tests: u32,
    /// Count of tests with regular errors.
    pub errors: u32,
    /// Count of tests with fatal errors.
    pub fatal_errors: u32,
    results: Option<Vec<RunResult>>,
}

impl RunSummary {
    /// Creates an empty root-level summary.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            owner_run: None,
            total_tests: 0,
            errors: 0,
            fatal_errors: 0,
            results: None,
        }
    }

    /// Sets the parent back-reference by summary name.
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Sets producer-reported counters.
    pub fn with_counters(mut self, total_tests: u32, errors: u32, fatal_errors: u32) -> Self {
        self.total_tests = total_tests;
        self.errors = errors;
        self.fatal_errors = fatal_errors;
        self
    }

    /// Appends one owned result, materializing the backing container on
    /// first access.
    pub fn add_result(&mut self, result: RunResult) {
        self.results_slot().push(result);
    }

    /// Returns owned results. Never allocates: an unmaterialized container
    /// reads as empty.
    pub fn results(&self) -> &[RunResult] {
        self.results.as_deref().unwrap_or(&[])
    }

    /// Stamps this summary and all owned results with their owners.
    pub(crate) fn claim_results(&mut self, run_uuid: Uuid) {
        self.owner_run = Some(run_uuid);
        let name = self.name.clone();
        if let Some(results) = self.results.as_mut() {
            for result in results.iter_mut() {
                result.owner = Some(ResultOwner::Summary(name.clone()));
            }
        }
    }

    /// Materializes the result container on first mutable access.
    fn results_slot(&mut self) -> &mut Vec<RunResult> {
        self.results.get_or_insert_with(Vec::new)
    }
}

/// Environment metadata captured once by the caller at run start.
///
/// The core never reads hostname/OS/runtime state from globals; callers
/// snapshot whatever source they trust and pass it in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentSnapshot {
    /// Machine name of the run host.
    pub hostname: String,
    /// Operating system label.
    pub os_name: String,
    /// Runtime/toolchain version label.
    pub runtime_version: String,
}

impl EnvironmentSnapshot {
    /// Creates a snapshot from caller-sourced values.
    pub fn new(
        hostname: impl Into<String>,
        os_name: impl Into<String>,
        runtime_version: impl Into<String>,
    ) -> Self {
        Self {
            hostname: hostname.into(),
            os_name: os_name.into(),
            runtime_version: runtime_version.into(),
        }
    }
}
