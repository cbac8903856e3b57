//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the report persistence contract for normalized run trees.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`RunNotFound`) in addition to
//!   DB transport errors.
//! - Only normalized trees are persisted; the repository stores what it is
//!   given and never re-normalizes.

pub mod report_repo;
