//! Polyline helpers: orientation, trimming, local direction, merging.

use corridor_common::{Error, Result};
use geo::{EuclideanLength, LineInterpolatePoint, LineLocatePoint};
use geo_types::{Coord, LineString, MultiLineString, Point};
use wkt::TryFromWkt;

/// Parse a WKT linestring. A `MULTILINESTRING` is accepted by chaining its
/// parts and keeping the longest chain; exporters occasionally fragment a
/// way's geometry that way.
pub fn linestring_from_wkt(s: &str) -> Result<LineString<f64>> {
    if let Ok(line) = LineString::try_from_wkt_str(s) {
        return Ok(line);
    }
    let ml = MultiLineString::try_from_wkt_str(s)
        .map_err(|e| Error::InvalidGeometry(format!("wkt: {e}")))?;
    longest_part(&merge_lines(ml.0))
        .ok_or_else(|| Error::InvalidGeometry("empty multi-linestring".to_string()))
}

/// Orient `line` so that its first coordinate is `origin`, reversing when
/// the origin sits at the far end. Lines not touching the origin at either
/// end are returned unchanged.
pub fn orient_from(line: &LineString<f64>, origin: Coord<f64>, tol: f64) -> LineString<f64> {
    if let Some(last) = line.0.last() {
        if (last.x - origin.x).abs() <= tol && (last.y - origin.y).abs() <= tol {
            let mut coords = line.0.clone();
            coords.reverse();
            return LineString::new(coords);
        }
    }
    line.clone()
}

/// Trim `line` to at most `max_len` measured from its first coordinate.
///
/// A trimmed line is collapsed to the chord from the start to the cut point;
/// intermediate vertices inside the kept stretch are dropped. Corridors only
/// need the immediate departure stretch, not the full curve.
pub fn trim_from_start(line: &LineString<f64>, max_len: f64) -> LineString<f64> {
    let total = line.euclidean_length();
    if total <= max_len || total == 0.0 {
        return line.clone();
    }
    match line.line_interpolate_point(max_len / total) {
        Some(cut) => LineString::new(vec![line.0[0], cut.0]),
        None => line.clone(),
    }
}

/// Local departure direction of `line` at the point nearest to `at`.
///
/// Projects `at` onto the line, steps a small distance further along it
/// (backward when already at the end) and returns the chord vector. `None`
/// for degenerate lines or zero-length steps.
pub fn departure_direction(line: &LineString<f64>, at: Point<f64>) -> Option<Coord<f64>> {
    let total = line.euclidean_length();
    if total <= 0.0 {
        return None;
    }
    let frac = line.line_locate_point(&at)?;
    let step = (total * 0.01).min(1e-3) / total;
    let (f1, f2) = if frac + step <= 1.0 {
        (frac, frac + step)
    } else {
        ((frac - step).max(0.0), frac)
    };
    let p1 = line.line_interpolate_point(f1)?;
    let p2 = line.line_interpolate_point(f2)?;
    let v = Coord {
        x: p2.x() - p1.x(),
        y: p2.y() - p1.y(),
    };
    if v.x == 0.0 && v.y == 0.0 {
        None
    } else {
        Some(v)
    }
}

/// Merge lines that share endpoints into maximal chains.
///
/// Greedy endpoint stitching with an exact-match tolerance; anything that
/// does not chain stays a separate part.
pub fn merge_lines(lines: Vec<LineString<f64>>) -> MultiLineString<f64> {
    const TOL: f64 = 1e-9;
    let same = |a: Coord<f64>, b: Coord<f64>| (a.x - b.x).abs() <= TOL && (a.y - b.y).abs() <= TOL;

    let mut pool: Vec<Vec<Coord<f64>>> = lines
        .into_iter()
        .map(|l| l.0)
        .filter(|c| c.len() >= 2)
        .collect();
    let mut merged: Vec<Vec<Coord<f64>>> = Vec::new();

    while let Some(mut chain) = pool.pop() {
        let mut grew = true;
        while grew {
            grew = false;
            let head = chain[0];
            let tail = chain[chain.len() - 1];
            let mut idx = None;
            for (i, cand) in pool.iter().enumerate() {
                let (cs, ce) = (cand[0], cand[cand.len() - 1]);
                if same(tail, cs) || same(tail, ce) || same(head, cs) || same(head, ce) {
                    idx = Some(i);
                    break;
                }
            }
            if let Some(i) = idx {
                let mut cand = pool.swap_remove(i);
                let (cs, ce) = (cand[0], cand[cand.len() - 1]);
                if same(tail, cs) {
                    chain.extend(cand.into_iter().skip(1));
                } else if same(tail, ce) {
                    cand.reverse();
                    chain.extend(cand.into_iter().skip(1));
                } else if same(head, ce) {
                    cand.pop();
                    cand.extend(chain);
                    chain = cand;
                } else {
                    cand.reverse();
                    cand.pop();
                    cand.extend(chain);
                    chain = cand;
                }
                grew = true;
            }
        }
        merged.push(chain);
    }

    MultiLineString::new(merged.into_iter().map(LineString::new).collect())
}

/// The longest part of a multi-linestring, if any.
pub fn longest_part(ml: &MultiLineString<f64>) -> Option<LineString<f64>> {
    ml.iter()
        .max_by(|a, b| {
            a.euclidean_length()
                .partial_cmp(&b.euclidean_length())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .cloned()
}
