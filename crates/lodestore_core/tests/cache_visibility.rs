use lodestore_core::{
    resolve_visibility, CacheableHint, EntityTypeDescriptor, PersistenceUnitConfig,
    SharedCacheMode, SHARED_CACHE_MODE_KEY,
};
use std::collections::BTreeMap;

fn unit_config(mode_value: &str) -> PersistenceUnitConfig {
    let mut properties = BTreeMap::new();
    properties.insert(SHARED_CACHE_MODE_KEY.to_string(), mode_value.to_string());
    PersistenceUnitConfig::from_properties("orders-unit", properties).unwrap()
}

#[test]
fn mode_all_puts_every_type_in_the_shared_cache() {
    let config = unit_config("ALL");
    let mut index = config.visibility_index();

    assert!(index.shared_for(&EntityTypeDescriptor::undeclared("orders.Order")));
    assert!(index.shared_for(&EntityTypeDescriptor::new(
        "orders.Audit",
        CacheableHint::NonCacheable
    )));
}

#[test]
fn mode_none_isolates_every_type() {
    let config = unit_config("NONE");
    let mut index = config.visibility_index();

    assert!(!index.shared_for(&EntityTypeDescriptor::new(
        "orders.Order",
        CacheableHint::Cacheable
    )));
    assert!(!index.shared_for(&EntityTypeDescriptor::undeclared("orders.OrderLine")));
}

#[test]
fn enable_selective_shares_only_declared_cacheable_types() {
    let config = unit_config("ENABLE_SELECTIVE");
    let mut index = config.visibility_index();

    assert!(index.shared_for(&EntityTypeDescriptor::new(
        "orders.Order",
        CacheableHint::Cacheable
    )));
    assert!(!index.shared_for(&EntityTypeDescriptor::undeclared("orders.OrderLine")));
    assert!(!index.shared_for(&EntityTypeDescriptor::new(
        "orders.Audit",
        CacheableHint::NonCacheable
    )));
}

#[test]
fn disable_selective_shares_unless_declared_non_cacheable() {
    let config = unit_config("DISABLE_SELECTIVE");
    let mut index = config.visibility_index();

    assert!(index.shared_for(&EntityTypeDescriptor::new(
        "orders.Order",
        CacheableHint::Cacheable
    )));
    assert!(index.shared_for(&EntityTypeDescriptor::undeclared("orders.OrderLine")));
    assert!(!index.shared_for(&EntityTypeDescriptor::new(
        "orders.Audit",
        CacheableHint::NonCacheable
    )));
}

#[test]
fn malformed_descriptor_value_deploys_as_isolated() {
    // Deployment must not fail on a bad mode value; placement falls back
    // to the NONE policy.
    let config = unit_config("SHARED_PLEASE");
    assert_eq!(config.shared_cache_mode(), SharedCacheMode::None);

    let mut index = config.visibility_index();
    assert!(!index.shared_for(&EntityTypeDescriptor::new(
        "orders.Order",
        CacheableHint::Cacheable
    )));
}

#[test]
fn absent_setting_behaves_like_none_at_resolution_time() {
    let config = PersistenceUnitConfig::from_properties("orders-unit", BTreeMap::new()).unwrap();
    assert_eq!(config.shared_cache_mode(), SharedCacheMode::Unspecified);

    for hint in [
        CacheableHint::Cacheable,
        CacheableHint::NonCacheable,
        CacheableHint::Unset,
    ] {
        assert!(!resolve_visibility(config.shared_cache_mode(), hint));
    }
}

#[test]
fn resolution_is_deterministic_across_fresh_indexes() {
    let config = unit_config("ENABLE_SELECTIVE");
    let descriptor = EntityTypeDescriptor::new("orders.Order", CacheableHint::Cacheable);

    let first = config.visibility_index().shared_for(&descriptor);
    let second = config.visibility_index().shared_for(&descriptor);
    assert_eq!(first, second);
}
