//! Longest connected network.
//!
//! Compliant edge geometries are decomposed into unit segments between
//! consecutive coordinates; segments shared by several edges collapse into
//! one. The connected component with the greatest total length wins and is
//! returned as a multi-linestring of its unit segments.

use std::collections::{BTreeMap, BTreeSet};

use geo_types::{Coord, LineString};
use geojson::{Feature, Geometry};
use ordered_float::OrderedFloat;
use petgraph::unionfind::UnionFind;
use serde_json::Map;

type CoordKey = (OrderedFloat<f64>, OrderedFloat<f64>);

fn key(c: Coord<f64>) -> CoordKey {
    (OrderedFloat(c.x), OrderedFloat(c.y))
}

/// The longest connected component of the segment graph, as a GeoJSON
/// feature with empty properties. `None` when no segments exist.
pub fn longest_network(lines: &[LineString<f64>]) -> Option<Feature> {
    let mut index: BTreeMap<CoordKey, usize> = BTreeMap::new();
    let mut coords: Vec<Coord<f64>> = Vec::new();
    let mut id_of = |c: Coord<f64>, coords: &mut Vec<Coord<f64>>| -> usize {
        *index.entry(key(c)).or_insert_with(|| {
            coords.push(c);
            coords.len() - 1
        })
    };

    let mut segments: BTreeSet<(usize, usize)> = BTreeSet::new();
    for line in lines {
        for pair in line.0.windows(2) {
            let a = id_of(pair[0], &mut coords);
            let b = id_of(pair[1], &mut coords);
            if a == b {
                continue;
            }
            segments.insert((a.min(b), a.max(b)));
        }
    }
    if segments.is_empty() {
        return None;
    }

    let mut components: UnionFind<usize> = UnionFind::new(coords.len());
    for &(a, b) in &segments {
        components.union(a, b);
    }

    let mut totals: BTreeMap<usize, f64> = BTreeMap::new();
    for &(a, b) in &segments {
        let d = (coords[a].x - coords[b].x).hypot(coords[a].y - coords[b].y);
        *totals.entry(components.find(a)).or_insert(0.0) += d;
    }
    // Strict comparison keeps the first component on ties.
    let (winner, _) = totals
        .iter()
        .fold(None::<(usize, f64)>, |best, (&root, &len)| match best {
            Some((_, best_len)) if len <= best_len => best,
            _ => Some((root, len)),
        })?;

    let parts: Vec<Vec<Vec<f64>>> = segments
        .iter()
        .filter(|&&(a, _)| components.find(a) == winner)
        .map(|&(a, b)| {
            vec![
                vec![coords[a].x, coords[a].y],
                vec![coords[b].x, coords[b].y],
            ]
        })
        .collect();

    Some(Feature {
        bbox: None,
        geometry: Some(Geometry::new(geojson::Value::MultiLineString(parts))),
        id: None,
        properties: Some(Map::new()),
        foreign_members: None,
    })
}
