//! Leg extraction: the road segments meeting at a junction node.

use std::collections::BTreeSet;

use corridor_graph::{NodeId, RoadEdge, RoadGraph};
use geo_types::{Coord, LineString};
use tracing::warn;

use crate::lanes::{self, LaneTurn};

/// One road segment incident to a junction node.
///
/// `incoming` holds the turns allowed when arriving at the node from this
/// leg; it is `None` for legs known only from an outgoing edge, where no
/// inbound turn data exists.
#[derive(Debug, Clone)]
pub struct Leg {
    pub neighbor: NodeId,
    pub neighbor_coord: Coord<f64>,
    pub incoming: Option<BTreeSet<LaneTurn>>,
    pub geometry: Option<LineString<f64>>,
}

/// Gather the legs of a node. Incoming edges take precedence; an outgoing
/// edge only contributes a leg when its neighbor was not already seen.
pub fn legs(graph: &RoadGraph, node_id: NodeId) -> Vec<Leg> {
    let mut out = Vec::new();
    let mut seen: BTreeSet<NodeId> = BTreeSet::new();

    for edge in graph.in_edges(node_id) {
        let Some(neighbor) = graph.node(edge.from) else {
            continue;
        };
        let info = lanes::parse_lane_data(&edge.tags, edge.is_reversed());
        out.push(Leg {
            neighbor: neighbor.id,
            neighbor_coord: neighbor.coord(),
            incoming: Some(info.turns),
            geometry: resolve_geometry(edge),
        });
        seen.insert(neighbor.id);
    }

    for edge in graph.out_edges(node_id) {
        if seen.contains(&edge.to) {
            continue;
        }
        let Some(neighbor) = graph.node(edge.to) else {
            continue;
        };
        out.push(Leg {
            neighbor: neighbor.id,
            neighbor_coord: neighbor.coord(),
            incoming: None,
            geometry: resolve_geometry(edge),
        });
        seen.insert(edge.to);
    }

    out
}

fn resolve_geometry(edge: &RoadEdge) -> Option<LineString<f64>> {
    let geometry = edge.geometry.as_ref()?;
    match geometry.to_line() {
        Ok(line) => Some(line),
        Err(err) => {
            warn!(edge = %edge.id_string(), %err, "unusable leg geometry");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corridor_graph::{EdgeGeometry, RoadNode, Tags};

    fn node(id: NodeId, x: f64, y: f64) -> RoadNode {
        RoadNode {
            id,
            x,
            y,
            tags: Tags::new(),
        }
    }

    fn edge(from: NodeId, to: NodeId, tags_json: &str) -> RoadEdge {
        RoadEdge {
            from,
            to,
            key: 0,
            geometry: Some(EdgeGeometry::Points(vec![(0.0, 0.0), (1.0, 1.0)])),
            tags: serde_json::from_str(tags_json).unwrap(),
        }
    }

    #[test]
    fn test_incoming_edge_carries_turns() {
        let mut g = RoadGraph::new();
        g.add_node(node(0, 0.0, 0.0));
        g.add_node(node(1, 1.0, 1.0));
        g.add_edge(edge(1, 0, r#"{"turn:lanes:forward": "left|right"}"#));
        let legs = legs(&g, 0);
        assert_eq!(legs.len(), 1);
        assert_eq!(
            legs[0].incoming,
            Some(BTreeSet::from([LaneTurn::Left, LaneTurn::Right]))
        );
    }

    #[test]
    fn test_incoming_takes_precedence_over_outgoing() {
        let mut g = RoadGraph::new();
        g.add_node(node(0, 0.0, 0.0));
        g.add_node(node(1, 1.0, 1.0));
        g.add_edge(edge(1, 0, "{}"));
        g.add_edge(edge(0, 1, "{}"));
        let legs = legs(&g, 0);
        assert_eq!(legs.len(), 1);
        assert!(legs[0].incoming.is_some());
    }

    #[test]
    fn test_outgoing_only_leg_has_no_turn_data() {
        let mut g = RoadGraph::new();
        g.add_node(node(0, 0.0, 0.0));
        g.add_node(node(1, 1.0, 1.0));
        g.add_edge(edge(0, 1, "{}"));
        let legs = legs(&g, 0);
        assert_eq!(legs.len(), 1);
        assert!(legs[0].incoming.is_none());
    }

    #[test]
    fn test_wkt_geometry_is_parsed() {
        let mut g = RoadGraph::new();
        g.add_node(node(0, 0.0, 0.0));
        g.add_node(node(1, 1.0, 0.0));
        let mut e = edge(1, 0, "{}");
        e.geometry = Some(EdgeGeometry::Wkt("LINESTRING (1 0, 0 0)".to_string()));
        g.add_edge(e);
        let legs = legs(&g, 0);
        assert_eq!(legs[0].geometry.as_ref().unwrap().0.len(), 2);
    }

    #[test]
    fn test_reversed_edge_reads_backward_tags() {
        let mut g = RoadGraph::new();
        g.add_node(node(0, 0.0, 0.0));
        g.add_node(node(1, 1.0, 1.0));
        g.add_edge(edge(
            1,
            0,
            r#"{"reversed": true, "turn:lanes:backward": "sharp_right"}"#,
        ));
        let legs = legs(&g, 0);
        assert_eq!(
            legs[0].incoming,
            Some(BTreeSet::from([LaneTurn::SharpRight]))
        );
    }
}
