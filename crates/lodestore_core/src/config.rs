//! Persistence unit configuration.
//!
//! # Responsibility
//! - Carry deployment-descriptor properties for one persistence unit.
//! - Map the `shared-cache-mode` setting with the documented defaulting
//!   rule before the session layer asks for placements.
//!
//! # Invariants
//! - Unknown `shared-cache-mode` values silently resolve to `NONE`; a
//!   malformed descriptor value must never fail deployment.
//! - Unit names are non-blank and stored trimmed.

use crate::cache::visibility::{CacheVisibilityIndex, SharedCacheMode};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Property key selecting the shared-cache policy for one unit.
pub const SHARED_CACHE_MODE_KEY: &str = "shared-cache-mode";

/// Errors from persistence-unit configuration validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    /// Unit name is blank after trim.
    EmptyUnitName,
}

impl Display for ConfigValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyUnitName => write!(f, "persistence unit name must not be blank"),
        }
    }
}

impl Error for ConfigValidationError {}

/// Configuration for one persistence unit, built from descriptor properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistenceUnitConfig {
    unit_name: String,
    shared_cache_mode: SharedCacheMode,
    properties: BTreeMap<String, String>,
}

impl PersistenceUnitConfig {
    /// Builds a unit configuration from raw descriptor properties.
    ///
    /// # Contract
    /// - Reads `shared-cache-mode` through the silent defaulting rule; a
    ///   missing key yields `Unspecified`, an unrecognized value `None`.
    /// - Remaining properties are kept verbatim for other consumers.
    ///
    /// # Errors
    /// - Returns `EmptyUnitName` when `unit_name` is blank after trim.
    pub fn from_properties(
        unit_name: impl Into<String>,
        properties: BTreeMap<String, String>,
    ) -> Result<Self, ConfigValidationError> {
        let unit_name = unit_name.into();
        let trimmed = unit_name.trim();
        if trimmed.is_empty() {
            return Err(ConfigValidationError::EmptyUnitName);
        }

        let shared_cache_mode = SharedCacheMode::from_setting(
            properties.get(SHARED_CACHE_MODE_KEY).map(String::as_str),
        );

        Ok(Self {
            unit_name: trimmed.to_string(),
            shared_cache_mode,
            properties,
        })
    }

    /// Returns the unit name.
    pub fn unit_name(&self) -> &str {
        &self.unit_name
    }

    /// Returns the resolved shared-cache mode for this unit.
    pub fn shared_cache_mode(&self) -> SharedCacheMode {
        self.shared_cache_mode
    }

    /// Returns one raw descriptor property, if present.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Creates a fresh per-type decision memo over this unit's mode.
    pub fn visibility_index(&self) -> CacheVisibilityIndex {
        CacheVisibilityIndex::new(self.shared_cache_mode)
    }
}
