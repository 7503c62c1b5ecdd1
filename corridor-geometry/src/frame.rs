//! Node-centered planar reference frame.
//!
//! Corridor trimming and buffering need meters, not degrees. Instead of a
//! full projection library we use an equirectangular frame anchored at the
//! junction node: accurate to well under a centimeter at the ~100 m scale
//! these corridors live at.

use geo_types::{Coord, LineString, MultiPolygon, Polygon};

const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Planar frame anchored at a reference coordinate, x/y in meters.
#[derive(Debug, Clone, Copy)]
pub struct LocalFrame {
    lon0: f64,
    lat0: f64,
    /// cos(lat0), longitude compression at the anchor latitude
    scale: f64,
}

impl LocalFrame {
    pub fn centered_on(origin: Coord<f64>) -> Self {
        Self {
            lon0: origin.x,
            lat0: origin.y,
            scale: origin.y.to_radians().cos(),
        }
    }

    pub fn to_plane(&self, c: Coord<f64>) -> Coord<f64> {
        Coord {
            x: (c.x - self.lon0).to_radians() * EARTH_RADIUS_M * self.scale,
            y: (c.y - self.lat0).to_radians() * EARTH_RADIUS_M,
        }
    }

    pub fn to_geographic(&self, c: Coord<f64>) -> Coord<f64> {
        Coord {
            x: self.lon0 + (c.x / (EARTH_RADIUS_M * self.scale)).to_degrees(),
            y: self.lat0 + (c.y / EARTH_RADIUS_M).to_degrees(),
        }
    }

    pub fn line_to_plane(&self, line: &LineString<f64>) -> LineString<f64> {
        LineString::new(line.coords().map(|c| self.to_plane(*c)).collect())
    }

    pub fn line_to_geographic(&self, line: &LineString<f64>) -> LineString<f64> {
        LineString::new(line.coords().map(|c| self.to_geographic(*c)).collect())
    }

    pub fn polygon_to_geographic(&self, poly: &Polygon<f64>) -> Polygon<f64> {
        Polygon::new(
            self.line_to_geographic(poly.exterior()),
            poly.interiors()
                .iter()
                .map(|ring| self.line_to_geographic(ring))
                .collect(),
        )
    }

    pub fn multi_polygon_to_geographic(&self, mp: &MultiPolygon<f64>) -> MultiPolygon<f64> {
        MultiPolygon::new(mp.iter().map(|p| self.polygon_to_geographic(p)).collect())
    }
}
