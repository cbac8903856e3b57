//! Domain model for persistence-unit metadata and run reporting.
//!
//! # Responsibility
//! - Define canonical records consumed by the cache resolver and report tree.
//! - Keep metadata holders immutable after metadata processing hands them over.
//!
//! # Invariants
//! - Every run record references its owner by name or run id, never through
//!   an owning pointer.
//! - Entity type descriptors do not change after construction.

pub mod entity_type;
pub mod run;
