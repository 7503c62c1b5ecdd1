//! Mapping core-graph nodes onto the padded full graph.
//!
//! Analysis runs over a full graph padded with boundary neighbors so that
//! edge nodes keep their real degree; the caller's area of interest is a
//! separate core graph. Core nodes are matched back onto full-graph ids by
//! nearest coordinate.

use rstar::primitives::GeomWithData;
use rstar::RTree;
use tracing::warn;

use crate::graph::{NodeId, RoadGraph};

/// Default coordinate match tolerance in degrees (~1 m).
pub const MATCH_TOLERANCE_DEG: f64 = 1e-5;

/// Ids of full-graph nodes coinciding with core-graph nodes.
///
/// Core nodes with no full-graph node within `tolerance` are dropped with a
/// warning; the result is sorted and deduplicated.
pub fn match_core_nodes(full: &RoadGraph, core: &RoadGraph, tolerance: f64) -> Vec<NodeId> {
    let tree: RTree<GeomWithData<[f64; 2], NodeId>> =
        RTree::bulk_load(full.nodes().map(|n| GeomWithData::new([n.x, n.y], n.id)).collect());

    let mut matched = Vec::new();
    for node in core.nodes() {
        let Some(nearest) = tree.nearest_neighbor(&[node.x, node.y]) else {
            continue;
        };
        let dx = nearest.geom()[0] - node.x;
        let dy = nearest.geom()[1] - node.y;
        if (dx * dx + dy * dy).sqrt() <= tolerance {
            matched.push(nearest.data);
        } else {
            warn!(core_node = node.id, "no full-graph node within match tolerance");
        }
    }
    matched.sort_unstable();
    matched.dedup();
    matched
}
