//! Junction corridor synthesis.
//!
//! Every incident edge contributes a leg centerline. Legs are projected into
//! a meter frame at the node, oriented away from it, trimmed to the analysis
//! distance and buffered by the carriageway width; the union of the buffers
//! is the junction's paved footprint.

use corridor_common::{Error, Result};
use corridor_geometry::{buffer, polyline, LocalFrame};
use corridor_graph::{NodeId, RoadGraph, Tags};
use geo_types::{Coord, LineString, MultiLineString, MultiPolygon};
use tracing::warn;

use crate::lanes;
use crate::params::AnalysisParams;

const ORIGIN_TOL: f64 = 1e-6;

/// Trimmed leg centerlines and the buffered footprint, both in geographic
/// coordinates. `footprint` is `None` when no leg produced a usable buffer.
#[derive(Debug, Clone)]
pub struct CorridorGeometry {
    pub centerlines: MultiLineString<f64>,
    pub footprint: Option<MultiPolygon<f64>>,
}

/// Carriageway width of one edge in meters, with an `estimated` flag.
///
/// Resolution order: the surveyed `width` tag, the `est_width` tag, then
/// lane count times the default lane width. Everything past the first step
/// is an estimate.
pub fn resolve_edge_width(tags: &Tags, default_lane_width: f64) -> (f64, bool) {
    if let Some(w) = tags.get_f64("width") {
        if w > 0.0 {
            return (w, false);
        }
    }
    if let Some(w) = tags.get_f64("est_width") {
        if w > 0.0 {
            return (w, true);
        }
    }
    (total_lane_count(tags) as f64 * default_lane_width, true)
}

/// Lane count of the whole edge: a scalar `lanes` tag, the turn-lane data,
/// the first value of a list-shaped `lanes` tag, then a single lane.
fn total_lane_count(tags: &Tags) -> usize {
    if let Some(v) = tags.get("lanes") {
        if !v.is_list() {
            if let Ok(n) = v.first().trim().parse::<usize>() {
                if n >= 1 {
                    return n;
                }
            }
        }
    }
    let info = lanes::parse_lane_data(tags, false);
    if !info.estimated {
        return info.lane_count;
    }
    if let Some(v) = tags.get("lanes") {
        if let Ok(n) = v.first().trim().parse::<usize>() {
            if n >= 1 {
                return n;
            }
        }
    }
    1
}

/// Build the corridor around `node_id` from its incident edges.
pub fn build_corridor(
    graph: &RoadGraph,
    node_id: NodeId,
    params: &AnalysisParams,
) -> Result<CorridorGeometry> {
    let node = graph.require_node(node_id)?;
    let frame = LocalFrame::centered_on(node.coord());

    let mut centerlines: Vec<LineString<f64>> = Vec::new();
    let mut buffers = Vec::new();

    // Reciprocal edges trace the same carriageway; buffer it once.
    let mut seen: std::collections::BTreeSet<(NodeId, NodeId, u32)> = std::collections::BTreeSet::new();
    for edge in graph.incident_edges(node_id) {
        let pair = (edge.from.min(edge.to), edge.from.max(edge.to), edge.key);
        if !seen.insert(pair) {
            continue;
        }
        let line = match edge_line(graph, edge.from, edge.to, &edge.geometry) {
            Ok(line) => line,
            Err(err) => {
                warn!(edge = %edge.id_string(), %err, "skipping leg with unusable geometry");
                continue;
            }
        };

        let plane = frame.line_to_plane(&line);
        let oriented = polyline::orient_from(&plane, Coord { x: 0.0, y: 0.0 }, ORIGIN_TOL);
        let trimmed = polyline::trim_from_start(&oriented, params.trim_distance);

        let (width, _estimated) = resolve_edge_width(&edge.tags, params.default_lane_width);
        if let Some(poly) = buffer::buffer_line(&trimmed, width) {
            buffers.push(poly);
        } else {
            warn!(edge = %edge.id_string(), "leg buffer degenerate");
        }
        centerlines.push(frame.line_to_geographic(&trimmed));
    }

    let footprint = buffer::union_all(&buffers).map(|mp| frame.multi_polygon_to_geographic(&mp));
    Ok(CorridorGeometry {
        centerlines: polyline::merge_lines(centerlines),
        footprint,
    })
}

/// Geographic centerline of an edge: the stored geometry when present,
/// otherwise the straight chord between its endpoint nodes.
fn edge_line(
    graph: &RoadGraph,
    from: NodeId,
    to: NodeId,
    geometry: &Option<corridor_graph::EdgeGeometry>,
) -> Result<LineString<f64>> {
    if let Some(g) = geometry {
        return g.to_line();
    }
    if from == to {
        return Err(Error::InvalidGeometry(format!("self loop at node {from}")));
    }
    let a = graph.require_node(from)?;
    let b = graph.require_node(to)?;
    Ok(LineString::new(vec![a.coord(), b.coord()]))
}
