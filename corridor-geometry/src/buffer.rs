//! Corridor buffering: symmetric parallel offset with mitred joins.

use geo::BooleanOps;
use geo_types::{Coord, LineString, MultiPolygon, Polygon};

/// Buffer a centerline symmetrically by `width / 2` on each side.
///
/// Each side is built by offsetting every segment along its left/right
/// normal and mitring consecutive offset segments at their line
/// intersection; the two sides are stitched into one closed ring. Returns
/// `None` for non-positive widths and degenerate lines.
pub fn buffer_line(line: &LineString<f64>, width: f64) -> Option<Polygon<f64>> {
    if width <= 0.0 {
        return None;
    }
    let mut coords: Vec<Coord<f64>> = Vec::with_capacity(line.0.len());
    for c in &line.0 {
        if coords.last() != Some(c) {
            coords.push(*c);
        }
    }
    if coords.len() < 2 {
        return None;
    }

    let half = width / 2.0;
    let left = shift_side(&coords, half)?;
    let mut right = shift_side(&coords, -half)?;
    right.reverse();

    let mut ring = left;
    ring.extend(right);
    ring.push(ring[0]);
    Some(Polygon::new(LineString::new(ring), vec![]))
}

/// Union a set of polygons into one (multi)polygon.
pub fn union_all(polys: &[Polygon<f64>]) -> Option<MultiPolygon<f64>> {
    let mut iter = polys.iter();
    let mut acc = MultiPolygon::new(vec![iter.next()?.clone()]);
    for p in iter {
        acc = acc.union(&MultiPolygon::new(vec![p.clone()]));
    }
    Some(acc)
}

/// Offset a polyline by `distance` along its left normal (negative for the
/// right side), mitring joins.
fn shift_side(coords: &[Coord<f64>], distance: f64) -> Option<Vec<Coord<f64>>> {
    let mut segments: Vec<(Coord<f64>, Coord<f64>)> = Vec::with_capacity(coords.len() - 1);
    for pair in coords.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        let len = (dx * dx + dy * dy).sqrt();
        if len == 0.0 {
            return None;
        }
        // left normal of the travel direction
        let nx = -dy / len * distance;
        let ny = dx / len * distance;
        segments.push((
            Coord {
                x: a.x + nx,
                y: a.y + ny,
            },
            Coord {
                x: b.x + nx,
                y: b.y + ny,
            },
        ));
    }

    let mut out = Vec::with_capacity(coords.len());
    out.push(segments[0].0);
    for pair in segments.windows(2) {
        let (s1, s2) = (pair[0], pair[1]);
        // Parallel consecutive segments meet at the shared shifted point.
        let joint = line_intersection(s1.0, s1.1, s2.0, s2.1).unwrap_or(s1.1);
        out.push(joint);
    }
    out.push(segments[segments.len() - 1].1);
    Some(out)
}

/// Intersection of the infinite lines through (p1, p2) and (p3, p4).
fn line_intersection(
    p1: Coord<f64>,
    p2: Coord<f64>,
    p3: Coord<f64>,
    p4: Coord<f64>,
) -> Option<Coord<f64>> {
    let d1 = Coord {
        x: p2.x - p1.x,
        y: p2.y - p1.y,
    };
    let d2 = Coord {
        x: p4.x - p3.x,
        y: p4.y - p3.y,
    };
    let denom = d1.x * d2.y - d1.y * d2.x;
    if denom.abs() < 1e-12 {
        return None;
    }
    let t = ((p3.x - p1.x) * d2.y - (p3.y - p1.y) * d2.x) / denom;
    Some(Coord {
        x: p1.x + t * d1.x,
        y: p1.y + t * d1.y,
    })
}
