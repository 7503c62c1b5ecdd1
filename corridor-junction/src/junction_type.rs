//! Junction type classification.
//!
//! Three tiers, first match wins: an explicit junction tag on an incident
//! edge, an explicit junction/highway tag on the node itself, then a
//! degree/angle heuristic. Nodes with two or fewer distinct neighbors are
//! not junctions.

use corridor_geometry::angles;
use corridor_graph::{NodeId, RoadGraph};
use geo_types::Coord;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JunctionType {
    // from edge tags
    Roundabout,
    Circular,
    Jughandle,
    // from node tags
    MiniRoundabout,
    TurningCircle,
    TurningLoop,
    MotorwayJunction,
    Island,
    PassingPlace,
    // from the shape heuristic
    TJunction,
    YJunction,
    Crossroad,
}

impl JunctionType {
    pub fn name(&self) -> &'static str {
        match self {
            JunctionType::Roundabout => "ROUNDABOUT",
            JunctionType::Circular => "CIRCULAR",
            JunctionType::Jughandle => "JUGHANDLE",
            JunctionType::MiniRoundabout => "MINI_ROUNDABOUT",
            JunctionType::TurningCircle => "TURNING_CIRCLE",
            JunctionType::TurningLoop => "TURNING_LOOP",
            JunctionType::MotorwayJunction => "MOTORWAY_JUNCTION",
            JunctionType::Island => "ISLAND",
            JunctionType::PassingPlace => "PASSING_PLACE",
            JunctionType::TJunction => "T_JUNCTION",
            JunctionType::YJunction => "Y_JUNCTION",
            JunctionType::Crossroad => "CROSSROAD",
        }
    }

    pub const ALL: [JunctionType; 12] = [
        JunctionType::Roundabout,
        JunctionType::Circular,
        JunctionType::Jughandle,
        JunctionType::MiniRoundabout,
        JunctionType::TurningCircle,
        JunctionType::TurningLoop,
        JunctionType::MotorwayJunction,
        JunctionType::Island,
        JunctionType::PassingPlace,
        JunctionType::TJunction,
        JunctionType::YJunction,
        JunctionType::Crossroad,
    ];

    /// Match a raw tag value against the type names, normalizing case and
    /// the `:` separator (`mini:roundabout` == `MINI_ROUNDABOUT`).
    pub fn from_tag(raw: &str) -> Option<Self> {
        let key = raw.trim().replace(':', "_").to_ascii_uppercase();
        Self::ALL.into_iter().find(|t| t.name() == key)
    }
}

impl std::fmt::Display for JunctionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Full three-tier classification.
pub fn classify(graph: &RoadGraph, node_id: NodeId, angle_threshold: f64) -> Option<JunctionType> {
    classify_edge_tag(graph, node_id)
        .or_else(|| classify_node_tag(graph, node_id))
        .or_else(|| classify_by_shape(graph, node_id, angle_threshold))
}

/// Tier 1: junction tags on incident edges (roundabout, circular, ...).
pub fn classify_edge_tag(graph: &RoadGraph, node_id: NodeId) -> Option<JunctionType> {
    graph
        .incident_edges(node_id)
        .into_iter()
        .flat_map(|edge| edge.tags.values("junction"))
        .find_map(JunctionType::from_tag)
}

/// Tier 2: the node's own junction tag, falling back to its highway tag
/// (mini_roundabout, turning_circle, motorway_junction, ...).
pub fn classify_node_tag(graph: &RoadGraph, node_id: NodeId) -> Option<JunctionType> {
    let node = graph.node(node_id)?;
    let tag = node
        .tags
        .get("junction")
        .or_else(|| node.tags.get("highway"))?;
    tag.values().find_map(JunctionType::from_tag)
}

/// Tier 3: degree and leg angles on the undirected projection.
///
/// Degree <= 2 is not a junction, degree >= 4 is a crossroad. With exactly
/// three legs, the angles between consecutive node-to-neighbor rays decide:
/// one leg pair nearly straight (max angle above the threshold) makes a T,
/// otherwise a Y.
pub fn classify_by_shape(
    graph: &RoadGraph,
    node_id: NodeId,
    angle_threshold: f64,
) -> Option<JunctionType> {
    let node = graph.node(node_id)?;
    let neighbors = graph.undirected_neighbors(node_id);
    if neighbors.len() <= 2 {
        return None;
    }
    if neighbors.len() >= 4 {
        return Some(JunctionType::Crossroad);
    }

    let points: Vec<Coord<f64>> = neighbors
        .iter()
        .filter_map(|&id| graph.node(id))
        .map(|n| n.coord())
        .collect();
    if points.len() < 3 {
        return None;
    }

    let center = node.coord();
    let mut max_angle = 0.0f64;
    for i in 0..3 {
        if let Some(angle) = angles::angle_at(center, points[i], points[(i + 1) % 3]) {
            max_angle = max_angle.max(angle);
        }
    }
    if max_angle > angle_threshold {
        Some(JunctionType::TJunction)
    } else {
        Some(JunctionType::YJunction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corridor_graph::{RoadEdge, RoadNode, Tags};

    fn node(id: NodeId, x: f64, y: f64) -> RoadNode {
        RoadNode {
            id,
            x,
            y,
            tags: Tags::new(),
        }
    }

    fn edge(from: NodeId, to: NodeId) -> RoadEdge {
        RoadEdge {
            from,
            to,
            key: 0,
            geometry: None,
            tags: Tags::new(),
        }
    }

    /// Star graph: node 0 at the origin, neighbors placed at unit bearings.
    fn star(bearings_deg: &[f64]) -> RoadGraph {
        let mut g = RoadGraph::new();
        g.add_node(node(0, 0.0, 0.0));
        for (i, b) in bearings_deg.iter().enumerate() {
            let id = i as NodeId + 1;
            g.add_node(node(id, b.to_radians().cos(), b.to_radians().sin()));
            g.add_edge(edge(id, 0));
            g.add_edge(edge(0, id));
        }
        g
    }

    #[test]
    fn test_tag_normalization() {
        assert_eq!(JunctionType::from_tag("roundabout"), Some(JunctionType::Roundabout));
        assert_eq!(
            JunctionType::from_tag("mini:roundabout"),
            Some(JunctionType::MiniRoundabout)
        );
        assert_eq!(
            JunctionType::from_tag("Motorway_Junction"),
            Some(JunctionType::MotorwayJunction)
        );
        assert_eq!(JunctionType::from_tag("signal"), None);
    }

    #[test]
    fn test_degree_two_is_not_a_junction() {
        let g = star(&[0.0, 180.0]);
        assert_eq!(classify(&g, 0, 110.0), None);
    }

    #[test]
    fn test_four_way_is_crossroad() {
        // Skewed bearings: angles are irrelevant at degree four.
        let g = star(&[0.0, 80.0, 170.0, 260.0]);
        assert_eq!(classify(&g, 0, 110.0), Some(JunctionType::Crossroad));
    }

    #[test]
    fn test_three_way_with_straight_pair_is_t() {
        // Legs east, west and north: the east-west pair spans 180 degrees.
        let g = star(&[0.0, 180.0, 90.0]);
        assert_eq!(classify(&g, 0, 110.0), Some(JunctionType::TJunction));
    }

    #[test]
    fn test_three_way_fan_is_y() {
        // Legs fanning out on one side: pair angles 50, 100 and 50 degrees,
        // all below the 110 threshold.
        let g = star(&[0.0, 50.0, 310.0]);
        assert_eq!(classify(&g, 0, 110.0), Some(JunctionType::YJunction));
    }

    #[test]
    fn test_edge_tag_beats_shape() {
        let mut g = star(&[0.0, 180.0, 90.0]);
        let mut e = edge(0, 5);
        e.tags.insert("junction", "roundabout");
        g.add_node(node(5, 0.0, 2.0));
        g.add_edge(e);
        assert_eq!(classify(&g, 0, 110.0), Some(JunctionType::Roundabout));
    }

    #[test]
    fn test_node_tag_fallback_to_highway() {
        let mut g = RoadGraph::new();
        let mut n = node(0, 0.0, 0.0);
        n.tags.insert("highway", "turning_circle");
        g.add_node(n);
        assert_eq!(classify(&g, 0, 110.0), Some(JunctionType::TurningCircle));
    }

    #[test]
    fn test_list_valued_node_tag() {
        let mut g = RoadGraph::new();
        let mut n = node(0, 0.0, 0.0);
        n.tags.insert(
            "highway",
            corridor_graph::TagValue::Many(vec!["crossing".to_string(), "passing_place".to_string()]),
        );
        g.add_node(n);
        assert_eq!(classify(&g, 0, 110.0), Some(JunctionType::PassingPlace));
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(
            serde_json::to_string(&JunctionType::TJunction).unwrap(),
            "\"T_JUNCTION\""
        );
        let parsed: JunctionType = serde_json::from_str("\"MINI_ROUNDABOUT\"").unwrap();
        assert_eq!(parsed, JunctionType::MiniRoundabout);
    }
}
