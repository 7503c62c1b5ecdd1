//! The in-memory store and its JSON persistence.

use std::collections::BTreeMap;
use std::path::Path;

use corridor_common::Result;
use geojson::Feature;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Junction documents are keyed by exact node coordinates; re-analysis of
/// the same node lands on the same key.
pub type CoordKey = (OrderedFloat<f64>, OrderedFloat<f64>);

pub fn coord_key(x: f64, y: f64) -> CoordKey {
    (OrderedFloat(x), OrderedFloat(y))
}

/// One entry of a per-node feature-tag document: the feature type plus its
/// flat metadata fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeFeature {
    pub feature_type: String,
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl NodeFeature {
    pub fn new(feature_type: &str, metadata: Map<String, Value>) -> Self {
        Self {
            feature_type: feature_type.to_string(),
            metadata,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    junctions: BTreeMap<CoordKey, Feature>,
    node_features: BTreeMap<i64, Vec<NodeFeature>>,
    edges: BTreeMap<String, Feature>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn junction(&self, x: f64, y: f64) -> Option<&Feature> {
        self.junctions.get(&coord_key(x, y))
    }

    pub fn upsert_junction(&mut self, x: f64, y: f64, feature: Feature) {
        self.junctions.insert(coord_key(x, y), feature);
    }

    pub fn junctions(&self) -> impl Iterator<Item = &Feature> {
        self.junctions.values()
    }

    pub fn junction_count(&self) -> usize {
        self.junctions.len()
    }

    /// Append a feature to a node's document with set semantics: an entry
    /// equal to an existing one is not duplicated.
    pub fn append_node_feature(&mut self, node_id: i64, feature: NodeFeature) {
        let entry = self.node_features.entry(node_id).or_default();
        if !entry.contains(&feature) {
            entry.push(feature);
        }
    }

    pub fn node_feature_docs(&self) -> impl Iterator<Item = (i64, &[NodeFeature])> {
        self.node_features.iter().map(|(&id, v)| (id, v.as_slice()))
    }

    pub fn upsert_edge(&mut self, edge_id: &str, feature: Feature) {
        self.edges.insert(edge_id.to_string(), feature);
    }

    pub fn edge(&self, edge_id: &str) -> Option<&Feature> {
        self.edges.get(edge_id)
    }

    pub fn edges(&self) -> impl Iterator<Item = (&str, &Feature)> {
        self.edges.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = StoreFile {
            junctions: self
                .junctions
                .iter()
                .map(|(&(x, y), feature)| JunctionEntry {
                    x: x.0,
                    y: y.0,
                    feature: feature.clone(),
                })
                .collect(),
            node_features: self
                .node_features
                .iter()
                .map(|(&node_id, features)| NodeFeatureDoc {
                    node_id,
                    features: features.clone(),
                })
                .collect(),
            edges: self
                .edges
                .iter()
                .map(|(edge_id, feature)| EdgeEntry {
                    edge_id: edge_id.clone(),
                    feature: feature.clone(),
                })
                .collect(),
        };
        std::fs::write(path, serde_json::to_string_pretty(&file)?)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file: StoreFile = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        let mut store = Self::new();
        for entry in file.junctions {
            store.upsert_junction(entry.x, entry.y, entry.feature);
        }
        for doc in file.node_features {
            for feature in doc.features {
                store.append_node_feature(doc.node_id, feature);
            }
        }
        for entry in file.edges {
            store.upsert_edge(&entry.edge_id, entry.feature);
        }
        Ok(store)
    }
}

#[derive(Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    junctions: Vec<JunctionEntry>,
    #[serde(default)]
    node_features: Vec<NodeFeatureDoc>,
    #[serde(default)]
    edges: Vec<EdgeEntry>,
}

#[derive(Serialize, Deserialize)]
struct JunctionEntry {
    x: f64,
    y: f64,
    feature: Feature,
}

#[derive(Serialize, Deserialize)]
struct NodeFeatureDoc {
    node_id: i64,
    features: Vec<NodeFeature>,
}

#[derive(Serialize, Deserialize)]
struct EdgeEntry {
    edge_id: String,
    feature: Feature,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn feature_with(value: Value) -> Feature {
        let mut properties = Map::new();
        properties.insert("marker".to_string(), value);
        Feature {
            bbox: None,
            geometry: None,
            id: None,
            properties: Some(properties),
            foreign_members: None,
        }
    }

    #[test]
    fn test_junction_upsert_replaces() {
        let mut store = MemoryStore::new();
        store.upsert_junction(1.0, 2.0, feature_with(json!(1)));
        store.upsert_junction(1.0, 2.0, feature_with(json!(2)));
        assert_eq!(store.junction_count(), 1);
        let props = store.junction(1.0, 2.0).unwrap().properties.as_ref().unwrap();
        assert_eq!(props["marker"], json!(2));
    }

    #[test]
    fn test_node_feature_set_semantics() {
        let mut store = MemoryStore::new();
        let f = NodeFeature::new("junction", Map::new());
        store.append_node_feature(7, f.clone());
        store.append_node_feature(7, f);
        store.append_node_feature(7, NodeFeature::new("school_zone", Map::new()));
        let (_, features) = store.node_feature_docs().next().unwrap();
        assert_eq!(features.len(), 2);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = std::env::temp_dir().join("corridor-store-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("store.json");

        let mut store = MemoryStore::new();
        store.upsert_junction(139.7, 35.6, feature_with(json!("a")));
        store.append_node_feature(5, NodeFeature::new("junction", Map::new()));
        store.upsert_edge("1_2_0", feature_with(json!("e")));
        store.save(&path).unwrap();

        let loaded = MemoryStore::load(&path).unwrap();
        assert_eq!(loaded.junction_count(), 1);
        assert!(loaded.junction(139.7, 35.6).is_some());
        assert_eq!(loaded.node_feature_docs().count(), 1);
        assert_eq!(loaded.edge_count(), 1);
        std::fs::remove_file(&path).ok();
    }
}
