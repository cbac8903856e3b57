//! Run reporting subsystem.
//!
//! # Responsibility
//! - Collect run results and suite summaries incrementally during execution.
//! - Normalize ownership and roll up run statistics once per run.
//!
//! # Invariants
//! - One producer populates the tree; readers query only after the
//!   normalize/statistics pair has run.
//! - Backing containers are materialized on first access, never eagerly.

pub mod tree;
