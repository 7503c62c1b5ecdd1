//! Feature catalog: the dictionary of feature attributes and their possible
//! values, exported so ODD specifications can be authored against it.

use serde::Serialize;
use serde_json::Value;

/// One attribute of a feature type and the values it can take. An empty
/// value list marks a free numeric attribute (thresholds, not an allow-list).
#[derive(Debug, Clone, Serialize)]
pub struct FeatureAttribute {
    pub feature_attr: String,
    pub values: Vec<Value>,
}

impl FeatureAttribute {
    pub fn new(name: &str, values: Vec<Value>) -> Self {
        Self {
            feature_attr: name.to_string(),
            values,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct FeatureTypeEntry {
    feature_type: String,
    features: Vec<FeatureAttribute>,
}

/// All feature types and their attributes, in registration order.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct FeatureCatalog {
    entries: Vec<FeatureTypeEntry>,
}

impl FeatureCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_feature_type(&mut self, feature_type: &str, features: Vec<FeatureAttribute>) {
        self.entries.push(FeatureTypeEntry {
            feature_type: feature_type.to_string(),
            features,
        });
    }
}
