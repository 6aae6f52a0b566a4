//! Field-by-field merging of configuration tiers.
//!
//! Each tier is parsed into a `serde_json::Value` and laid over the previous
//! one. Objects merge key by key; anything else in the overlay replaces the
//! base. A `null` in the overlay means "not specified" and keeps the base.

use serde_json::Value;

/// Lay `overlay` over `base`.
///
/// ```
/// use serde_json::json;
/// use wise_tasks::config::deep_merge;
///
/// let defaults = json!({"server": {"host": "127.0.0.1", "port": 8787}});
/// let project = json!({"server": {"port": 9000}});
/// assert_eq!(
///     deep_merge(defaults, project),
///     json!({"server": {"host": "127.0.0.1", "port": 9000}})
/// );
/// ```
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut merged), Value::Object(overlay)) => {
            for (key, value) in overlay {
                let value = match merged.remove(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value,
                };
                merged.insert(key, value);
            }
            Value::Object(merged)
        }
        (base, Value::Null) => base,
        (_, overlay) => overlay,
    }
}

/// Merge tiers in order, later tiers winning.
pub fn deep_merge_all(values: impl IntoIterator<Item = Value>) -> Value {
    values.into_iter().fold(Value::Null, deep_merge)
}
