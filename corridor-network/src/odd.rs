//! The ODD specification: a map from feature attribute to allowed values.
//!
//! Values arrive scalar-or-list from clients; everything is normalized to a
//! list at the boundary. The sentinel `"ALL"` inside a list lifts the
//! restriction on that attribute, as does leaving the attribute out.

use std::collections::BTreeMap;
use std::path::Path;

use corridor_common::Result;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, Serialize)]
pub struct OddSpec(pub BTreeMap<String, Vec<Value>>);

impl<'de> Deserialize<'de> for OddSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw: BTreeMap<String, Value> = BTreeMap::deserialize(deserializer)?;
        Ok(OddSpec(
            raw.into_iter()
                .map(|(k, v)| {
                    let list = match v {
                        Value::Array(items) => items,
                        scalar => vec![scalar],
                    };
                    (k, list)
                })
                .collect(),
        ))
    }
}

impl OddSpec {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        Ok(serde_json::from_str(&std::fs::read_to_string(path)?)?)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// The active allow-list for an attribute. `None` when the attribute is
    /// unrestricted, by absence or by an `"ALL"` member.
    pub fn allow_list(&self, key: &str) -> Option<&[Value]> {
        let list = self.0.get(key)?;
        if list.iter().any(|v| v.as_str() == Some("ALL")) {
            return None;
        }
        Some(list)
    }

    /// Policy of a boolean attribute: the first listed value coerced to a
    /// truth value. Missing or empty attributes are permissive.
    pub fn bool_policy(&self, key: &str) -> bool {
        match self.0.get(key).and_then(|list| list.first()) {
            None => true,
            Some(v) => truthy(v),
        }
    }

    /// Whether a presence filter for this attribute admits the feature:
    /// `None` when the attribute is not in the specification (no filtering),
    /// otherwise whether `true` is among the allowed values.
    pub fn allows_presence(&self, key: &str) -> Option<bool> {
        let list = self.0.get(key)?;
        Some(list.contains(&Value::Bool(true)))
    }

    /// Minimum numeric value listed for an attribute; non-numeric entries
    /// are skipped.
    pub fn min_numeric(&self, key: &str) -> Option<f64> {
        self.0
            .get(key)?
            .iter()
            .filter_map(as_f64)
            .min_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
    }
}

fn truthy(v: &Value) -> bool {
    match v {
        Value::Bool(b) => *b,
        Value::Null => false,
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

fn as_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Minimum numeric value of a scalar-or-list JSON value.
pub fn min_numeric_value(v: &Value) -> Option<f64> {
    match v {
        Value::Array(items) => items
            .iter()
            .filter_map(as_f64)
            .min_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal)),
        scalar => as_f64(scalar),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn odd(json: &str) -> OddSpec {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_scalars_become_lists() {
        let o = odd(r#"{"highway_type": "primary", "junction_type": ["CROSSROAD"]}"#);
        assert_eq!(o.allow_list("highway_type"), Some(&[json!("primary")][..]));
        assert_eq!(o.allow_list("junction_type"), Some(&[json!("CROSSROAD")][..]));
    }

    #[test]
    fn test_all_sentinel_lifts_restriction() {
        let o = odd(r#"{"junction_type": ["ALL", "CROSSROAD"]}"#);
        assert_eq!(o.allow_list("junction_type"), None);
        assert_eq!(o.allow_list("missing"), None);
        assert!(o.contains("junction_type"));
        assert!(!o.contains("missing"));
    }

    #[test]
    fn test_bool_policy_first_value() {
        let o = odd(r#"{"oneway": [false, true], "is_major_road": true, "empty": []}"#);
        assert!(!o.bool_policy("oneway"));
        assert!(o.bool_policy("is_major_road"));
        assert!(o.bool_policy("empty"));
        assert!(o.bool_policy("missing"));
    }

    #[test]
    fn test_presence_filter() {
        let o = odd(r#"{"school_zone": [false], "parking_lot": [true, false]}"#);
        assert_eq!(o.allows_presence("school_zone"), Some(false));
        assert_eq!(o.allows_presence("parking_lot"), Some(true));
        assert_eq!(o.allows_presence("traffic_signals"), None);
    }

    #[test]
    fn test_min_numeric_mixed_types() {
        let o = odd(r#"{"speed_limit": [60, "40", "fast"], "lane_width": 3.5}"#);
        assert_eq!(o.min_numeric("speed_limit"), Some(40.0));
        assert_eq!(o.min_numeric("lane_width"), Some(3.5));
        assert_eq!(o.min_numeric("missing"), None);
    }
}
