//! Recursive-replace merging of settings trees.
//!
//! Mappings are merged key by key with the overlay winning. Everything else,
//! lists included, is replaced wholesale.

use super::value::{ConfigTree, SettingValue};

/// Merge two values, with `overlay` taking precedence over `base`.
///
/// - Mappings are merged recursively: keys in overlay override keys in base
/// - Lists, strings, numbers, booleans and nulls are replaced entirely
///
/// Neither input is modified.
///
/// # Example
/// ```
/// use settings_resolver::config::{SettingValue, deep_merge};
///
/// let base: SettingValue = serde_yaml::from_str("redis: {host: localhost, port: 6379}").unwrap();
/// let overlay: SettingValue = serde_yaml::from_str("redis: {port: 6380}").unwrap();
/// let merged = deep_merge(&base, &overlay);
/// let redis = merged.as_mapping().unwrap()["redis"].as_mapping().unwrap();
/// assert_eq!(redis["host"].as_str(), Some("localhost"));
/// assert_eq!(redis["port"].as_i64(), Some(6380));
/// ```
pub fn deep_merge(base: &SettingValue, overlay: &SettingValue) -> SettingValue {
    match (base, overlay) {
        (SettingValue::Mapping(base_map), SettingValue::Mapping(overlay_map)) => {
            SettingValue::Mapping(merge_recursive(base_map, overlay_map))
        }
        (_, overlay) => overlay.clone(),
    }
}

/// Merge two trees, with `overlay` taking precedence over `base`.
///
/// Keys only in `base` are kept, keys only in `overlay` are added, and keys
/// in both are combined with [`deep_merge`].
pub fn merge_recursive(base: &ConfigTree, overlay: &ConfigTree) -> ConfigTree {
    let mut result = base.clone();

    for (key, overlay_value) in overlay {
        let merged = match result.get(key) {
            Some(base_value) => deep_merge(base_value, overlay_value),
            None => overlay_value.clone(),
        };
        result.insert(key.clone(), merged);
    }

    result
}
