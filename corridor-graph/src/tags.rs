//! OSM-style tag maps.
//!
//! Tag values in exported graphs are loosely typed: strings, numbers,
//! booleans, or lists of those (when parallel ways were consolidated).
//! Everything is normalized to strings at the boundary so the analysis code
//! never matches on raw JSON.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A single tag value: one scalar or a list of scalars.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TagValue {
    One(String),
    Many(Vec<String>),
}

impl TagValue {
    fn as_slice(&self) -> &[String] {
        match self {
            TagValue::One(s) => std::slice::from_ref(s),
            TagValue::Many(v) => v.as_slice(),
        }
    }

    /// First value, empty string when the list is empty.
    pub fn first(&self) -> &str {
        self.as_slice().first().map(String::as_str).unwrap_or("")
    }

    /// All values in order.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.as_slice().iter().map(String::as_str)
    }

    pub fn is_list(&self) -> bool {
        matches!(self, TagValue::Many(_))
    }
}

fn scalar_to_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

impl From<Value> for TagValue {
    fn from(v: Value) -> Self {
        match v {
            Value::Array(items) => TagValue::Many(items.iter().map(scalar_to_string).collect()),
            other => TagValue::One(scalar_to_string(&other)),
        }
    }
}

impl From<&str> for TagValue {
    fn from(s: &str) -> Self {
        TagValue::One(s.to_string())
    }
}

impl From<String> for TagValue {
    fn from(s: String) -> Self {
        TagValue::One(s)
    }
}

impl<'de> Deserialize<'de> for TagValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(TagValue::from(Value::deserialize(deserializer)?))
    }
}

/// Tag map for a node or edge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tags(pub BTreeMap<String, TagValue>);

impl Tags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&TagValue> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// First value of a tag, if present.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(TagValue::first)
    }

    /// All values of a tag (empty when absent).
    pub fn values(&self, key: &str) -> impl Iterator<Item = &str> {
        self.0
            .get(key)
            .map(TagValue::as_slice)
            .unwrap_or(&[])
            .iter()
            .map(String::as_str)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get_str(key)?.trim().parse().ok()
    }

    pub fn get_usize(&self, key: &str) -> Option<usize> {
        self.get_str(key)?.trim().parse().ok()
    }

    /// Truthiness of OSM flag tags: `yes` / `true` / `1`.
    pub fn get_bool(&self, key: &str) -> bool {
        matches!(
            self.get_str(key)
                .map(|s| s.trim().to_ascii_lowercase())
                .as_deref(),
            Some("yes") | Some("true") | Some("1")
        )
    }

    pub fn insert(&mut self, key: &str, value: impl Into<TagValue>) {
        self.0.insert(key.to_string(), value.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Tags {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_scalar_values_become_strings() {
        let tags = parse(r#"{"lanes": 2, "oneway": true, "highway": "primary"}"#);
        assert_eq!(tags.get_str("lanes"), Some("2"));
        assert_eq!(tags.get_usize("lanes"), Some(2));
        assert!(tags.get_bool("oneway"));
        assert_eq!(tags.get_str("highway"), Some("primary"));
    }

    #[test]
    fn test_list_values() {
        let tags = parse(r#"{"highway": ["primary", "secondary"], "lanes": ["2", 3]}"#);
        let values: Vec<&str> = tags.values("highway").collect();
        assert_eq!(values, vec!["primary", "secondary"]);
        assert_eq!(tags.get_str("lanes"), Some("2"));
        assert!(tags.get("lanes").unwrap().is_list());
    }

    #[test]
    fn test_missing_key() {
        let tags = parse(r#"{}"#);
        assert_eq!(tags.get_str("highway"), None);
        assert_eq!(tags.values("highway").count(), 0);
        assert!(!tags.get_bool("oneway"));
    }

    #[test]
    fn test_bool_spellings() {
        let tags = parse(r#"{"a": "yes", "b": "1", "c": "no", "d": false}"#);
        assert!(tags.get_bool("a"));
        assert!(tags.get_bool("b"));
        assert!(!tags.get_bool("c"));
        assert!(!tags.get_bool("d"));
    }
}
