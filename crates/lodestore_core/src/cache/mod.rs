//! Cache visibility decision model.
//!
//! # Responsibility
//! - Map the persistence-unit cache mode plus per-type declarations to a
//!   shared-vs-isolated placement decision.
//! - Keep decisions deterministic so the session layer can memoize them.
//!
//! # Invariants
//! - Resolution is a pure function of (mode, hint); no hidden state.
//! - Unrecognized deployment settings default to `NONE` instead of failing.

pub mod visibility;
