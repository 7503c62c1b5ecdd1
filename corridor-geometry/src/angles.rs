//! Vector angle helpers.

use geo_types::Coord;

/// Angle in degrees between two vectors, `None` when either is degenerate.
///
/// The acos argument is clamped to [-1, 1]; floating-point drift on nearly
/// collinear vectors would otherwise leave the domain.
pub fn vector_angle_degrees(a: Coord<f64>, b: Coord<f64>) -> Option<f64> {
    let na = (a.x * a.x + a.y * a.y).sqrt();
    let nb = (b.x * b.x + b.y * b.y).sqrt();
    if na == 0.0 || nb == 0.0 {
        return None;
    }
    let cos = ((a.x * b.x + a.y * b.y) / (na * nb)).clamp(-1.0, 1.0);
    Some(cos.acos().to_degrees())
}

/// Angle at `vertex` between the rays towards `a` and `b`, in degrees.
pub fn angle_at(vertex: Coord<f64>, a: Coord<f64>, b: Coord<f64>) -> Option<f64> {
    vector_angle_degrees(a - vertex, b - vertex)
}

/// 2-D cross product (z component), sign gives the turn direction.
pub fn cross(a: Coord<f64>, b: Coord<f64>) -> f64 {
    a.x * b.y - a.y * b.x
}
