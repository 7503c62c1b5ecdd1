//! The road network graph: a directed multigraph keyed by OSM node ids.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use corridor_common::{units, Error, Result};
use geo_types::{Coord, LineString, Point};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::tags::{TagValue, Tags};

pub type NodeId = i64;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadNode {
    pub id: NodeId,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub tags: Tags,
}

impl RoadNode {
    pub fn coord(&self) -> Coord<f64> {
        Coord {
            x: self.x,
            y: self.y,
        }
    }

    pub fn point(&self) -> Point<f64> {
        Point::new(self.x, self.y)
    }
}

/// Edge geometry as stored in exported graphs: either inline coordinates or
/// a WKT `LINESTRING` string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EdgeGeometry {
    Wkt(String),
    Points(Vec<(f64, f64)>),
}

impl EdgeGeometry {
    pub fn to_line(&self) -> Result<LineString<f64>> {
        match self {
            EdgeGeometry::Wkt(s) => corridor_geometry::polyline::linestring_from_wkt(s),
            EdgeGeometry::Points(pts) => {
                if pts.len() < 2 {
                    return Err(Error::InvalidGeometry(format!(
                        "polyline with {} coordinate(s)",
                        pts.len()
                    )));
                }
                Ok(LineString::new(
                    pts.iter().map(|&(x, y)| Coord { x, y }).collect(),
                ))
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadEdge {
    pub from: NodeId,
    pub to: NodeId,
    #[serde(default)]
    pub key: u32,
    #[serde(default)]
    pub geometry: Option<EdgeGeometry>,
    #[serde(default)]
    pub tags: Tags,
}

impl RoadEdge {
    /// Stable identifier, also the persistence key for edge documents.
    pub fn id_string(&self) -> String {
        format!("{}_{}_{}", self.from, self.to, self.key)
    }

    /// Whether this edge traverses its source way against the stored
    /// orientation (the exporter's `reversed` marker).
    pub fn is_reversed(&self) -> bool {
        self.tags.get_bool("reversed")
    }
}

#[derive(Debug, Clone, Default)]
pub struct RoadGraph {
    nodes: BTreeMap<NodeId, RoadNode>,
    edges: Vec<RoadEdge>,
    out_by_node: BTreeMap<NodeId, Vec<usize>>,
    in_by_node: BTreeMap<NodeId, Vec<usize>>,
}

impl RoadGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a graph from a JSON file of `{nodes: [...], edges: [...]}`.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let graph = Self::from_json_str(&raw)?;
        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            path = %path.display(),
            "loaded road graph"
        );
        Ok(graph)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let file: GraphFile = serde_json::from_str(raw)?;
        let mut graph = Self::new();
        for node in file.nodes {
            graph.add_node(node);
        }
        for edge in file.edges {
            graph.add_edge(edge);
        }
        Ok(graph)
    }

    pub fn add_node(&mut self, node: RoadNode) {
        self.nodes.insert(node.id, node);
    }

    pub fn add_edge(&mut self, edge: RoadEdge) {
        let idx = self.edges.len();
        self.out_by_node.entry(edge.from).or_default().push(idx);
        self.in_by_node.entry(edge.to).or_default().push(idx);
        self.edges.push(edge);
    }

    pub fn node(&self, id: NodeId) -> Option<&RoadNode> {
        self.nodes.get(&id)
    }

    pub fn require_node(&self, id: NodeId) -> Result<&RoadNode> {
        self.nodes.get(&id).ok_or(Error::NodeNotFound(id))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &RoadNode> {
        self.nodes.values()
    }

    pub fn edges(&self) -> impl Iterator<Item = &RoadEdge> {
        self.edges.iter()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Edges arriving at `id` (neighbor -> id).
    pub fn in_edges(&self, id: NodeId) -> impl Iterator<Item = &RoadEdge> {
        self.in_by_node
            .get(&id)
            .into_iter()
            .flatten()
            .map(|&i| &self.edges[i])
    }

    /// Edges leaving `id` (id -> neighbor).
    pub fn out_edges(&self, id: NodeId) -> impl Iterator<Item = &RoadEdge> {
        self.out_by_node
            .get(&id)
            .into_iter()
            .flatten()
            .map(|&i| &self.edges[i])
    }

    /// All edges touching `id`; self-loops appear once.
    pub fn incident_edges(&self, id: NodeId) -> Vec<&RoadEdge> {
        let mut seen: BTreeSet<usize> = BTreeSet::new();
        for list in [self.in_by_node.get(&id), self.out_by_node.get(&id)] {
            seen.extend(list.into_iter().flatten().copied());
        }
        seen.into_iter().map(|i| &self.edges[i]).collect()
    }

    /// Distinct neighbor ids, ignoring edge direction and self-loops.
    pub fn undirected_neighbors(&self, id: NodeId) -> BTreeSet<NodeId> {
        let mut out = BTreeSet::new();
        for edge in self.incident_edges(id) {
            let other = if edge.from == id { edge.to } else { edge.from };
            if other != id {
                out.insert(other);
            }
        }
        out
    }

    pub fn undirected_degree(&self, id: NodeId) -> usize {
        self.undirected_neighbors(id).len()
    }

    /// Discharge analysis preconditions: every edge gets a geometry (a
    /// straight segment between its endpoints when none is stored) and
    /// `width` / `est_width` tags are normalized to numeric meters.
    pub fn prepare(&mut self) {
        let coords: BTreeMap<NodeId, (f64, f64)> =
            self.nodes.values().map(|n| (n.id, (n.x, n.y))).collect();

        let mut synthesized = 0usize;
        for edge in &mut self.edges {
            if edge.geometry.is_none() {
                if let (Some(&a), Some(&b)) = (coords.get(&edge.from), coords.get(&edge.to)) {
                    edge.geometry = Some(EdgeGeometry::Points(vec![a, b]));
                    synthesized += 1;
                }
            }
            for key in ["width", "est_width"] {
                let raw = edge.tags.get(key).map(|v| v.first().to_string());
                if let Some(raw) = raw {
                    let meters = units::length_meters(&raw);
                    edge.tags.insert(key, TagValue::One(format!("{meters}")));
                }
            }
        }
        if synthesized > 0 {
            info!(synthesized, "synthesized straight edge geometries");
        }
    }
}

#[derive(Deserialize)]
struct GraphFile {
    #[serde(default)]
    nodes: Vec<RoadNode>,
    #[serde(default)]
    edges: Vec<RoadEdge>,
}
