//! Shared-cache visibility resolver.
//!
//! # Responsibility
//! - Parse the `shared-cache-mode` deployment setting with silent defaulting.
//! - Decide whether instances of one entity type go to the process-wide
//!   shared cache or the per-transaction isolated cache.
//! - Memoize per-type decisions for repeated session-layer lookups.
//!
//! # Invariants
//! - `resolve_visibility` is pure and total: every input maps to a defined
//!   outcome, malformed settings included.
//! - An absent setting parses to `Unspecified`; an unrecognized setting
//!   parses to `None`. Both resolve to isolated placement.

use crate::model::entity_type::{CacheableHint, EntityTypeDescriptor};
use std::collections::BTreeMap;

/// Persistence-unit-level shared-cache policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SharedCacheMode {
    /// Every entity type uses the shared cache.
    All,
    /// No entity type uses the shared cache.
    None,
    /// Only types explicitly declared cacheable use the shared cache.
    EnableSelective,
    /// All types use the shared cache unless explicitly declared non-cacheable.
    DisableSelective,
    /// The deployment descriptor left the mode open.
    Unspecified,
}

impl SharedCacheMode {
    /// Maps the string-valued deployment setting to a mode.
    ///
    /// # Contract
    /// - `None` input (setting absent) maps to `Unspecified`.
    /// - Unrecognized values map to `SharedCacheMode::None`; deployment must
    ///   not fail on a malformed descriptor value.
    pub fn from_setting(value: Option<&str>) -> Self {
        let Some(raw) = value else {
            return Self::Unspecified;
        };
        match raw.trim() {
            "ALL" => Self::All,
            "NONE" => Self::None,
            "ENABLE_SELECTIVE" => Self::EnableSelective,
            "DISABLE_SELECTIVE" => Self::DisableSelective,
            "UNSPECIFIED" => Self::Unspecified,
            _ => Self::None,
        }
    }

    /// Returns the descriptor token for this mode.
    pub fn as_setting(&self) -> &'static str {
        match self {
            Self::All => "ALL",
            Self::None => "NONE",
            Self::EnableSelective => "ENABLE_SELECTIVE",
            Self::DisableSelective => "DISABLE_SELECTIVE",
            Self::Unspecified => "UNSPECIFIED",
        }
    }
}

/// Decides shared-cache eligibility for one (mode, declaration) pair.
///
/// # Contract
/// - `All`: shared, regardless of declaration.
/// - `None` / `Unspecified`: isolated, regardless of declaration.
/// - `EnableSelective`: shared only for an explicit `Cacheable` declaration.
/// - `DisableSelective`: shared unless explicitly declared `NonCacheable`.
pub fn resolve_visibility(mode: SharedCacheMode, hint: CacheableHint) -> bool {
    match mode {
        SharedCacheMode::All => true,
        SharedCacheMode::None | SharedCacheMode::Unspecified => false,
        SharedCacheMode::EnableSelective => hint == CacheableHint::Cacheable,
        SharedCacheMode::DisableSelective => hint != CacheableHint::NonCacheable,
    }
}

/// Per-unit memo of resolved placements keyed by entity type name.
///
/// Resolution is deterministic, so a decision computed once stays valid for
/// the lifetime of the unit configuration this index was built from.
#[derive(Debug)]
pub struct CacheVisibilityIndex {
    mode: SharedCacheMode,
    decisions: BTreeMap<String, bool>,
}

impl CacheVisibilityIndex {
    /// Creates an empty index over one unit-level mode.
    pub fn new(mode: SharedCacheMode) -> Self {
        Self {
            mode,
            decisions: BTreeMap::new(),
        }
    }

    /// Returns the unit-level mode this index resolves against.
    pub fn mode(&self) -> SharedCacheMode {
        self.mode
    }

    /// Returns the shared-cache decision for one type, resolving and
    /// memoizing it on first lookup.
    pub fn shared_for(&mut self, descriptor: &EntityTypeDescriptor) -> bool {
        if let Some(decision) = self.decisions.get(descriptor.type_name.as_str()) {
            return *decision;
        }
        let decision = resolve_visibility(self.mode, descriptor.cacheable);
        self.decisions
            .insert(descriptor.type_name.clone(), decision);
        decision
    }

    /// Returns how many types have been resolved so far.
    pub fn resolved_types(&self) -> usize {
        self.decisions.len()
    }
}
