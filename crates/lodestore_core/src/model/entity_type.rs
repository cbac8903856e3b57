//! Entity type metadata holder.
//!
//! # Responsibility
//! - Carry the per-type cacheability declaration produced by external
//!   annotation/XML metadata processing.
//! - Stay immutable once handed to the cache visibility resolver.
//!
//! # Invariants
//! - `type_name` is stable and unique within one persistence unit.
//! - `cacheable` preserves the declared tri-state verbatim; the resolver,
//!   not this holder, interprets it against the unit cache mode.

use serde::{Deserialize, Serialize};

/// Tri-state per-type cacheability declaration.
///
/// `Unset` means the type carries no declaration at all, so the
/// persistence-unit default policy applies unmodified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheableHint {
    /// The type explicitly opts into the shared cache.
    Cacheable,
    /// The type explicitly opts out of the shared cache.
    NonCacheable,
    /// No declaration present on the type.
    Unset,
}

/// Per-type descriptor consumed by the cache visibility resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityTypeDescriptor {
    /// Fully qualified entity type name within one persistence unit.
    pub type_name: String,
    /// Declared cacheability override, if any.
    pub cacheable: CacheableHint,
}

impl EntityTypeDescriptor {
    /// Creates a descriptor with an explicit cacheability declaration.
    pub fn new(type_name: impl Into<String>, cacheable: CacheableHint) -> Self {
        Self {
            type_name: type_name.into(),
            cacheable,
        }
    }

    /// Creates a descriptor for a type with no cacheability declaration.
    pub fn undeclared(type_name: impl Into<String>) -> Self {
        Self::new(type_name, CacheableHint::Unset)
    }
}
