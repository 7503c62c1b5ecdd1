//! Road segment extraction: per-edge attribute documents for the network
//! compliance stage.

use corridor_common::{units, Result};
use corridor_graph::{NodeId, RoadEdge, RoadGraph, Tags};
use corridor_store::{FeatureAttribute, FeatureCatalog, MemoryStore};
use geo_types::LineString;
use geojson::{Feature, Geometry};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{info, warn};

pub const ROAD_SEGMENT_FEATURE_TYPE: &str = "road_segment";

/// Car-accessible highway classifications. Edges tagged with anything else
/// (footways, cycleways, service roads) are not extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HighwayType {
    Motorway,
    MotorwayLink,
    Trunk,
    TrunkLink,
    Primary,
    PrimaryLink,
    Secondary,
    SecondaryLink,
    Tertiary,
    TertiaryLink,
    Residential,
    Escape,
    Road,
}

impl HighwayType {
    pub const ALL: [HighwayType; 13] = [
        HighwayType::Motorway,
        HighwayType::MotorwayLink,
        HighwayType::Trunk,
        HighwayType::TrunkLink,
        HighwayType::Primary,
        HighwayType::PrimaryLink,
        HighwayType::Secondary,
        HighwayType::SecondaryLink,
        HighwayType::Tertiary,
        HighwayType::TertiaryLink,
        HighwayType::Residential,
        HighwayType::Escape,
        HighwayType::Road,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            HighwayType::Motorway => "motorway",
            HighwayType::MotorwayLink => "motorway_link",
            HighwayType::Trunk => "trunk",
            HighwayType::TrunkLink => "trunk_link",
            HighwayType::Primary => "primary",
            HighwayType::PrimaryLink => "primary_link",
            HighwayType::Secondary => "secondary",
            HighwayType::SecondaryLink => "secondary_link",
            HighwayType::Tertiary => "tertiary",
            HighwayType::TertiaryLink => "tertiary_link",
            HighwayType::Residential => "residential",
            HighwayType::Escape => "escape",
            HighwayType::Road => "road",
        }
    }

    pub fn from_tag(raw: &str) -> Option<Self> {
        let key = raw.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|t| t.name() == key)
    }

    pub fn is_major(&self) -> bool {
        matches!(
            self,
            HighwayType::Motorway
                | HighwayType::MotorwayLink
                | HighwayType::Trunk
                | HighwayType::TrunkLink
                | HighwayType::Primary
                | HighwayType::PrimaryLink
                | HighwayType::Secondary
                | HighwayType::SecondaryLink
        )
    }
}

/// Per-lane marking vocabulary as painted on the carriageway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaneMarking {
    Through,
    Left,
    Right,
    SlightLeft,
    SlightRight,
    SharpLeft,
    SharpRight,
    Reverse,
    MergeToLeft,
    MergeToRight,
    None,
    Unknown,
}

impl LaneMarking {
    pub const ALL: [LaneMarking; 12] = [
        LaneMarking::Through,
        LaneMarking::Left,
        LaneMarking::Right,
        LaneMarking::SlightLeft,
        LaneMarking::SlightRight,
        LaneMarking::SharpLeft,
        LaneMarking::SharpRight,
        LaneMarking::Reverse,
        LaneMarking::MergeToLeft,
        LaneMarking::MergeToRight,
        LaneMarking::None,
        LaneMarking::Unknown,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            LaneMarking::Through => "through",
            LaneMarking::Left => "left",
            LaneMarking::Right => "right",
            LaneMarking::SlightLeft => "slight_left",
            LaneMarking::SlightRight => "slight_right",
            LaneMarking::SharpLeft => "sharp_left",
            LaneMarking::SharpRight => "sharp_right",
            LaneMarking::Reverse => "reverse",
            LaneMarking::MergeToLeft => "merge_to_left",
            LaneMarking::MergeToRight => "merge_to_right",
            LaneMarking::None => "none",
            LaneMarking::Unknown => "unknown",
        }
    }

    fn parse(token: &str) -> Self {
        match token.trim().to_ascii_lowercase().as_str() {
            "through" | "straight" => LaneMarking::Through,
            "left" => LaneMarking::Left,
            "right" => LaneMarking::Right,
            "slight_left" => LaneMarking::SlightLeft,
            "slight_right" => LaneMarking::SlightRight,
            "sharp_left" => LaneMarking::SharpLeft,
            "sharp_right" => LaneMarking::SharpRight,
            "reverse" => LaneMarking::Reverse,
            "merge_to_left" => LaneMarking::MergeToLeft,
            "merge_to_right" => LaneMarking::MergeToRight,
            "none" => LaneMarking::None,
            _ => LaneMarking::Unknown,
        }
    }
}

/// Markings of every lane in one direction, in tag order. Unknown tokens are
/// kept as `unknown` here so the compliance check can reject them.
fn parse_markings(tags: &Tags, key: &str) -> Vec<LaneMarking> {
    let Some(value) = tags.get(key) else {
        return Vec::new();
    };
    let lanes: Vec<&str> = if value.is_list() {
        value.values().collect()
    } else if value.first().is_empty() {
        Vec::new()
    } else {
        value.first().split('|').collect()
    };
    lanes
        .iter()
        .flat_map(|lane| lane.split(';'))
        .map(LaneMarking::parse)
        .collect()
}

/// One extracted car-accessible edge.
#[derive(Debug, Clone)]
pub struct RoadSegmentRecord {
    pub node_from: NodeId,
    pub node_to: NodeId,
    pub key: u32,
    pub highway_type: HighwayType,
    pub speed_limit: Option<f64>,
    pub total_lanes: Option<u32>,
    pub lanes_forward: Option<u32>,
    pub lanes_backward: Option<u32>,
    pub lane_width: Option<f64>,
    pub lane_markings_forward: Vec<LaneMarking>,
    pub lane_markings_backward: Vec<LaneMarking>,
    pub turn_lanes_forward: Option<Value>,
    pub turn_lanes_backward: Option<Value>,
    pub name: Option<Value>,
    pub oneway: bool,
    pub coordinates: LineString<f64>,
}

impl RoadSegmentRecord {
    pub fn edge_id(&self) -> String {
        format!("{}_{}_{}", self.node_from, self.node_to, self.key)
    }

    pub fn is_major_road(&self) -> bool {
        self.highway_type.is_major()
    }

    pub fn to_feature(&self) -> Result<Feature> {
        let mut properties = Map::new();
        properties.insert(
            "feature_type".to_string(),
            json!(ROAD_SEGMENT_FEATURE_TYPE),
        );
        properties.insert("node_from".to_string(), json!(self.node_from));
        properties.insert("node_to".to_string(), json!(self.node_to));
        properties.insert("highway_type".to_string(), json!(self.highway_type.name()));
        properties.insert("speed_limit".to_string(), json!(self.speed_limit));
        properties.insert("total_lanes".to_string(), json!(self.total_lanes));
        properties.insert("lanes_forward".to_string(), json!(self.lanes_forward));
        properties.insert("lanes_backward".to_string(), json!(self.lanes_backward));
        properties.insert("lane_width".to_string(), json!(self.lane_width));
        properties.insert("name".to_string(), self.name.clone().unwrap_or(Value::Null));
        properties.insert("oneway".to_string(), json!(self.oneway));
        properties.insert(
            "lane_markings_forward".to_string(),
            serde_json::to_value(&self.lane_markings_forward)?,
        );
        properties.insert(
            "lane_markings_backward".to_string(),
            serde_json::to_value(&self.lane_markings_backward)?,
        );
        properties.insert(
            "turn_lanes_forward".to_string(),
            self.turn_lanes_forward.clone().unwrap_or(Value::Null),
        );
        properties.insert(
            "turn_lanes_backward".to_string(),
            self.turn_lanes_backward.clone().unwrap_or(Value::Null),
        );
        properties.insert("is_major_road".to_string(), json!(self.is_major_road()));

        Ok(Feature {
            bbox: None,
            geometry: Some(Geometry::new(geojson::Value::from(&self.coordinates))),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        })
    }
}

/// Directional lane counts: explicit tags first, then the total, then an
/// equal split of the total on bidirectional roads.
fn lane_counts(tags: &Tags, oneway: bool) -> (Option<u32>, Option<u32>, Option<u32>) {
    let mut total = tags.get_usize("lanes").map(|n| n as u32);
    let mut forward = tags.get_usize("lanes:forward").map(|n| n as u32);
    let mut backward = tags.get_usize("lanes:backward").map(|n| n as u32);

    if total.is_none() {
        if let (Some(f), Some(b)) = (forward, backward) {
            total = Some(f + b);
        }
    }
    if let Some(t) = total {
        if t > 0 && !oneway && forward.is_none() && backward.is_none() {
            forward = Some(t / 2);
            backward = Some(t - t / 2);
        }
    }
    (total, forward, backward)
}

/// Per-lane width: the carriageway `width` tag divided by the lane count
/// when one is tagged, the full width otherwise.
fn lane_width(tags: &Tags) -> Option<f64> {
    let width = tags.get_f64("width")?;
    match tags.get_usize("lanes") {
        Some(lanes) if lanes > 0 => Some(width / lanes as f64),
        _ => Some(width),
    }
}

fn raw_tag_value(tags: &Tags, key: &str) -> Option<Value> {
    tags.get(key).map(|v| {
        if v.is_list() {
            Value::Array(v.values().map(|s| Value::String(s.to_string())).collect())
        } else {
            Value::String(v.first().to_string())
        }
    })
}

fn extract_edge(graph: &RoadGraph, edge: &RoadEdge) -> Option<RoadSegmentRecord> {
    let highway_type = edge
        .tags
        .values("highway")
        .find_map(HighwayType::from_tag)?;

    let coordinates = match &edge.geometry {
        Some(g) => match g.to_line() {
            Ok(line) => line,
            Err(err) => {
                warn!(edge = %edge.id_string(), %err, "unusable segment geometry");
                return None;
            }
        },
        None => {
            let a = graph.node(edge.from)?;
            let b = graph.node(edge.to)?;
            LineString::new(vec![a.coord(), b.coord()])
        }
    };

    let oneway = edge.tags.get_bool("oneway");
    let (total_lanes, lanes_forward, lanes_backward) = lane_counts(&edge.tags, oneway);

    Some(RoadSegmentRecord {
        node_from: edge.from,
        node_to: edge.to,
        key: edge.key,
        highway_type,
        speed_limit: edge
            .tags
            .get_str("maxspeed")
            .and_then(units::speed_kmh),
        total_lanes,
        lanes_forward,
        lanes_backward,
        lane_width: lane_width(&edge.tags),
        lane_markings_forward: parse_markings(&edge.tags, "turn:lanes:forward"),
        lane_markings_backward: parse_markings(&edge.tags, "turn:lanes:backward"),
        turn_lanes_forward: raw_tag_value(&edge.tags, "turn:lanes:forward"),
        turn_lanes_backward: raw_tag_value(&edge.tags, "turn:lanes:backward"),
        name: raw_tag_value(&edge.tags, "name"),
        oneway,
        coordinates,
    })
}

/// Extract every car-accessible edge of the graph.
pub fn extract_road_segments(graph: &RoadGraph) -> Vec<RoadSegmentRecord> {
    graph
        .edges()
        .filter_map(|edge| extract_edge(graph, edge))
        .collect()
}

/// Extract and upsert segment documents into the store.
pub fn run(graph: &RoadGraph, store: &mut MemoryStore) -> Result<u64> {
    let segments = extract_road_segments(graph);
    let mut written = 0u64;
    for segment in &segments {
        store.upsert_edge(&segment.edge_id(), segment.to_feature()?);
        written += 1;
    }
    info!(
        extracted = written,
        edges = graph.edge_count(),
        "road segment extraction finished"
    );
    Ok(written)
}

/// The catalog entry describing road segment attributes, for authoring ODD
/// specifications.
pub fn catalog() -> FeatureCatalog {
    let mut catalog = FeatureCatalog::new();
    catalog.add_feature_type(
        ROAD_SEGMENT_FEATURE_TYPE,
        vec![
            FeatureAttribute::new(
                "highway_type",
                HighwayType::ALL.iter().map(|t| json!(t.name())).collect(),
            ),
            FeatureAttribute::new(
                "lane_markings",
                LaneMarking::ALL.iter().map(|m| json!(m.name())).collect(),
            ),
            FeatureAttribute::new("speed_limit", vec![]),
            FeatureAttribute::new("oneway", vec![json!(true), json!(false)]),
            FeatureAttribute::new("is_major_road", vec![json!(true), json!(false)]),
            FeatureAttribute::new("lane_width", vec![]),
        ],
    );
    catalog
}
