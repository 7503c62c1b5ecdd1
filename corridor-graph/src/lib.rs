//! Directed road multigraph with OSM-style tags.
//!
//! The graph is the read-only input of every analysis stage: nodes carry
//! lon/lat coordinates and tags, edges carry an optional polyline (inline
//! coordinates or a WKT string) plus tags. [`RoadGraph::prepare`] discharges
//! the preconditions the analysis stages rely on.

pub mod core_match;
pub mod graph;
pub mod tags;

pub use graph::{EdgeGeometry, NodeId, RoadEdge, RoadGraph, RoadNode};
pub use tags::{TagValue, Tags};
