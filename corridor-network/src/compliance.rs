//! Node and edge compliance against an ODD specification.

use std::collections::BTreeSet;

use corridor_store::MemoryStore;
use geo_types::LineString;
use geojson::Feature;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::longest;
use crate::odd::{min_numeric_value, OddSpec};

// Node feature types carrying a presence filter in the ODD.
const PRESENCE_FILTERS: [&str; 3] = ["school_zone", "parking_lot", "traffic_signals"];

// Fallbacks when edge metadata is missing: an untagged speed limit fails any
// speed restriction, an untagged lane width fails any width floor.
const SPEED_LIMIT_FALLBACK: f64 = 999.0;
const LANE_WIDTH_FALLBACK: f64 = 0.0;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JunctionMetadata {
    #[serde(default)]
    pub junc_type: Option<String>,
    #[serde(default)]
    pub conflict_counter: std::collections::BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EdgeMetadata {
    #[serde(default)]
    pub node_from: Option<i64>,
    #[serde(default)]
    pub node_to: Option<i64>,
    #[serde(default)]
    pub highway_type: Option<String>,
    #[serde(default)]
    pub lane_markings_forward: Vec<String>,
    #[serde(default)]
    pub oneway: bool,
    #[serde(default)]
    pub is_major_road: bool,
    #[serde(default)]
    pub speed_limit: Value,
    #[serde(default)]
    pub lane_width: Value,
}

/// Whether a junction violates the ODD: its type is outside the allowed
/// types, or any conflict class it actually exhibits is outside the allowed
/// conflicts.
pub fn junction_incompliant(odd: &OddSpec, metadata: &JunctionMetadata) -> bool {
    if let Some(allowed) = odd.allow_list("junction_type") {
        match &metadata.junc_type {
            None => return true,
            Some(t) if !allowed.contains(&Value::String(t.clone())) => return true,
            Some(_) => {}
        }
    }
    if let Some(allowed) = odd.allow_list("junction_conflict") {
        for (name, &count) in &metadata.conflict_counter {
            if count > 0 && !allowed.contains(&Value::String(name.clone())) {
                return true;
            }
        }
    }
    false
}

/// Whether an edge satisfies the ODD's road restrictions.
pub fn edge_compliant(odd: &OddSpec, metadata: &EdgeMetadata) -> bool {
    if let Some(allowed) = odd.allow_list("highway_type") {
        match &metadata.highway_type {
            None => return false,
            Some(t) if !allowed.contains(&Value::String(t.clone())) => return false,
            Some(_) => {}
        }
    }

    // Every marking present on the road must be admitted.
    if let Some(allowed) = odd.allow_list("lane_markings") {
        for marking in &metadata.lane_markings_forward {
            if !allowed.contains(&Value::String(marking.clone())) {
                return false;
            }
        }
    }

    // A false policy excludes roads without the property.
    if !odd.bool_policy("oneway") && !metadata.oneway {
        return false;
    }
    if !odd.bool_policy("is_major_road") && !metadata.is_major_road {
        return false;
    }

    if let Some(odd_speed) = odd.min_numeric("speed_limit") {
        let speed = min_numeric_value(&metadata.speed_limit).unwrap_or(SPEED_LIMIT_FALLBACK);
        if speed > odd_speed {
            return false;
        }
    }
    if let Some(odd_width) = odd.min_numeric("lane_width") {
        let width = min_numeric_value(&metadata.lane_width).unwrap_or(LANE_WIDTH_FALLBACK);
        if width < odd_width {
            return false;
        }
    }

    true
}

/// The compliant slice of the network.
#[derive(Debug, Clone, Default)]
pub struct ComplianceResult {
    pub incompliant_nodes: BTreeSet<i64>,
    pub compliant_lines: Vec<LineString<f64>>,
}

/// Evaluate the whole store against an ODD. With no ODD every stored edge
/// geometry is compliant.
pub fn evaluate(store: &MemoryStore, odd: Option<&OddSpec>) -> ComplianceResult {
    let mut result = ComplianceResult::default();

    let Some(odd) = odd else {
        result.compliant_lines = store
            .edges()
            .filter_map(|(_, feature)| line_of(feature))
            .collect();
        return result;
    };

    for (node_id, features) in store.node_feature_docs() {
        for feature in features {
            if PRESENCE_FILTERS.contains(&feature.feature_type.as_str()) {
                if odd.allows_presence(&feature.feature_type) == Some(false) {
                    result.incompliant_nodes.insert(node_id);
                }
                continue;
            }
            if feature.feature_type == "junction" {
                let metadata: JunctionMetadata =
                    match serde_json::from_value(Value::Object(feature.metadata.clone())) {
                        Ok(m) => m,
                        Err(err) => {
                            warn!(node = node_id, %err, "unreadable junction metadata");
                            result.incompliant_nodes.insert(node_id);
                            continue;
                        }
                    };
                if junction_incompliant(odd, &metadata) {
                    result.incompliant_nodes.insert(node_id);
                }
            }
        }
    }

    for (edge_id, feature) in store.edges() {
        let Some(properties) = feature.properties.clone() else {
            continue;
        };
        let metadata: EdgeMetadata = match serde_json::from_value(Value::Object(properties)) {
            Ok(m) => m,
            Err(err) => {
                warn!(edge = edge_id, %err, "unreadable edge metadata");
                continue;
            }
        };

        let endpoint_blocked = [metadata.node_from, metadata.node_to]
            .into_iter()
            .flatten()
            .any(|id| result.incompliant_nodes.contains(&id));
        if endpoint_blocked || !edge_compliant(odd, &metadata) {
            continue;
        }
        if let Some(line) = line_of(feature) {
            result.compliant_lines.push(line);
        }
    }

    info!(
        incompliant_nodes = result.incompliant_nodes.len(),
        compliant_edges = result.compliant_lines.len(),
        "odd compliance evaluated"
    );
    result
}

/// Full pipeline: compliance filter plus longest connected network.
pub fn odd_compliant_network(store: &MemoryStore, odd: Option<&OddSpec>) -> Option<Feature> {
    let result = evaluate(store, odd);
    longest::longest_network(&result.compliant_lines)
}

fn line_of(feature: &Feature) -> Option<LineString<f64>> {
    let geometry = feature.geometry.as_ref()?;
    match &geometry.value {
        geojson::Value::LineString(_) => LineString::try_from(geometry.value.clone()).ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corridor_store::NodeFeature;
    use geojson::Geometry;
    use serde_json::{json, Map};

    fn odd(json: &str) -> OddSpec {
        serde_json::from_str(json).unwrap()
    }

    fn junction_meta(junc_type: Option<&str>, conflicts: &[(&str, u64)]) -> JunctionMetadata {
        JunctionMetadata {
            junc_type: junc_type.map(str::to_string),
            conflict_counter: conflicts
                .iter()
                .map(|&(k, v)| (k.to_string(), v))
                .collect(),
        }
    }

    #[test]
    fn test_junction_type_restriction() {
        let o = odd(r#"{"junction_type": ["CROSSROAD"]}"#);
        assert!(!junction_incompliant(&o, &junction_meta(Some("CROSSROAD"), &[])));
        assert!(junction_incompliant(&o, &junction_meta(Some("T_JUNCTION"), &[])));
        assert!(junction_incompliant(&o, &junction_meta(None, &[])));
    }

    #[test]
    fn test_junction_conflict_restriction_ignores_zero_counts() {
        let o = odd(r#"{"junction_conflict": ["NO_CONFLICT", "MERGE"]}"#);
        let ok = junction_meta(Some("CROSSROAD"), &[("MERGE", 2), ("INTERSECT", 0)]);
        assert!(!junction_incompliant(&o, &ok));
        let bad = junction_meta(Some("CROSSROAD"), &[("INTERSECT", 1)]);
        assert!(junction_incompliant(&o, &bad));
    }

    #[test]
    fn test_all_sentinel_allows_everything() {
        let o = odd(r#"{"junction_type": ["ALL"], "junction_conflict": ["ALL"]}"#);
        let m = junction_meta(None, &[("INTERSECT", 9)]);
        assert!(!junction_incompliant(&o, &m));
    }

    fn edge_meta(json: Value) -> EdgeMetadata {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_highway_type_allow_list() {
        let o = odd(r#"{"highway_type": ["primary", "secondary"]}"#);
        assert!(edge_compliant(&o, &edge_meta(json!({"highway_type": "primary"}))));
        assert!(!edge_compliant(&o, &edge_meta(json!({"highway_type": "residential"}))));
        assert!(!edge_compliant(&o, &edge_meta(json!({}))));
    }

    #[test]
    fn test_lane_markings_must_all_be_admitted() {
        let o = odd(r#"{"lane_markings": ["through", "left"]}"#);
        let ok = edge_meta(json!({"lane_markings_forward": ["through", "left"]}));
        assert!(edge_compliant(&o, &ok));
        let bad = edge_meta(json!({"lane_markings_forward": ["through", "reverse"]}));
        assert!(!edge_compliant(&o, &bad));
        // No markings at all violates nothing.
        assert!(edge_compliant(&o, &edge_meta(json!({}))));
    }

    #[test]
    fn test_false_boolean_policy_excludes_unflagged_roads() {
        // A [false] policy arriving as a list must behave like the scalar.
        let o = odd(r#"{"oneway": [false]}"#);
        assert!(!edge_compliant(&o, &edge_meta(json!({"oneway": false}))));
        assert!(edge_compliant(&o, &edge_meta(json!({"oneway": true}))));

        let scalar = odd(r#"{"oneway": false}"#);
        assert!(!edge_compliant(&scalar, &edge_meta(json!({"oneway": false}))));
    }

    #[test]
    fn test_speed_limit_threshold() {
        let o = odd(r#"{"speed_limit": 50}"#);
        assert!(edge_compliant(&o, &edge_meta(json!({"speed_limit": 40.0}))));
        assert!(!edge_compliant(&o, &edge_meta(json!({"speed_limit": 60.0}))));
        // Untagged speed fails a speed restriction.
        assert!(!edge_compliant(&o, &edge_meta(json!({}))));
        // List-valued metadata compares its minimum.
        assert!(edge_compliant(&o, &edge_meta(json!({"speed_limit": [60, 30]}))));
    }

    #[test]
    fn test_lane_width_floor() {
        let o = odd(r#"{"lane_width": 3.0}"#);
        assert!(edge_compliant(&o, &edge_meta(json!({"lane_width": 3.5}))));
        assert!(!edge_compliant(&o, &edge_meta(json!({"lane_width": 2.5}))));
        assert!(!edge_compliant(&o, &edge_meta(json!({}))));
    }

    fn line_feature(props: Value, coords: &[(f64, f64)]) -> Feature {
        let properties = match props {
            Value::Object(m) => m,
            _ => Map::new(),
        };
        Feature {
            bbox: None,
            geometry: Some(Geometry::new(geojson::Value::LineString(
                coords.iter().map(|&(x, y)| vec![x, y]).collect(),
            ))),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        }
    }

    fn store_with_edges() -> MemoryStore {
        let mut store = MemoryStore::new();
        store.upsert_edge(
            "1_2_0",
            line_feature(
                json!({"feature_type": "road_segment", "node_from": 1, "node_to": 2,
                       "highway_type": "primary", "oneway": false}),
                &[(0.0, 0.0), (1.0, 0.0)],
            ),
        );
        store.upsert_edge(
            "2_3_0",
            line_feature(
                json!({"feature_type": "road_segment", "node_from": 2, "node_to": 3,
                       "highway_type": "residential", "oneway": false}),
                &[(1.0, 0.0), (2.0, 0.0)],
            ),
        );
        store
    }

    #[test]
    fn test_evaluate_without_odd_keeps_all_edges() {
        let store = store_with_edges();
        let result = evaluate(&store, None);
        assert_eq!(result.compliant_lines.len(), 2);
        assert!(result.incompliant_nodes.is_empty());
    }

    #[test]
    fn test_evaluate_filters_edges_by_metadata() {
        let store = store_with_edges();
        let o = odd(r#"{"highway_type": ["primary"]}"#);
        let result = evaluate(&store, Some(&o));
        assert_eq!(result.compliant_lines.len(), 1);
    }

    #[test]
    fn test_incompliant_node_blocks_touching_edges() {
        let mut store = store_with_edges();
        let mut metadata = Map::new();
        metadata.insert("junc_type".to_string(), json!("T_JUNCTION"));
        metadata.insert("conflict_counter".to_string(), json!({}));
        store.append_node_feature(2, NodeFeature::new("junction", metadata));

        let o = odd(r#"{"junction_type": ["CROSSROAD"]}"#);
        let result = evaluate(&store, Some(&o));
        assert_eq!(result.incompliant_nodes, BTreeSet::from([2]));
        // Both edges touch node 2.
        assert!(result.compliant_lines.is_empty());
    }

    #[test]
    fn test_presence_filter_marks_node() {
        let mut store = store_with_edges();
        store.append_node_feature(1, NodeFeature::new("school_zone", Map::new()));

        let exclude = odd(r#"{"school_zone": [false]}"#);
        let result = evaluate(&store, Some(&exclude));
        assert_eq!(result.incompliant_nodes, BTreeSet::from([1]));
        assert_eq!(result.compliant_lines.len(), 1);

        // Wanting school zones, or not mentioning them, filters nothing.
        let include = odd(r#"{"school_zone": [true]}"#);
        assert!(evaluate(&store, Some(&include)).incompliant_nodes.is_empty());
        let silent = odd("{}");
        assert!(evaluate(&store, Some(&silent)).incompliant_nodes.is_empty());
    }

    #[test]
    fn test_evaluate_is_idempotent() {
        let store = store_with_edges();
        let o = odd(r#"{"highway_type": ["primary"]}"#);
        let first = evaluate(&store, Some(&o));
        let second = evaluate(&store, Some(&o));
        assert_eq!(first.incompliant_nodes, second.incompliant_nodes);
        assert_eq!(first.compliant_lines, second.compliant_lines);
    }

    #[test]
    fn test_full_pipeline_returns_feature() {
        let store = store_with_edges();
        let feature = odd_compliant_network(&store, None).unwrap();
        assert!(matches!(
            feature.geometry.unwrap().value,
            geojson::Value::MultiLineString(_)
        ));
    }
}
