//! Relative position of one junction leg with respect to another.
//!
//! Both legs are characterized by their departure direction, the direction
//! the road leaves the node in. Legs leaving in roughly opposite directions
//! are OPP; legs at roughly right angles fall on the NEAR or FAR side of the
//! reference leg depending on the driving side; everything else is FAR.

use corridor_geometry::angles;
use geo_types::{Coord, Point};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::legs::Leg;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NeighborPosition {
    Opp,
    Near,
    Far,
}

impl NeighborPosition {
    pub fn name(&self) -> &'static str {
        match self {
            NeighborPosition::Opp => "OPP",
            NeighborPosition::Near => "NEAR",
            NeighborPosition::Far => "FAR",
        }
    }

    pub const ALL: [NeighborPosition; 3] = [
        NeighborPosition::Opp,
        NeighborPosition::Near,
        NeighborPosition::Far,
    ];
}

impl std::fmt::Display for NeighborPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Departure direction of a leg at the node, from the leg geometry when it
/// is usable, otherwise the straight ray towards the neighbor node.
fn leg_direction(node: Point<f64>, leg: &Leg) -> Option<Coord<f64>> {
    if let Some(line) = &leg.geometry {
        if let Some(dir) = corridor_geometry::polyline::departure_direction(line, node) {
            return Some(dir);
        }
        warn!(neighbor = leg.neighbor, "degenerate leg geometry, using straight ray");
    }
    let dx = leg.neighbor_coord.x - node.x();
    let dy = leg.neighbor_coord.y - node.y();
    if dx == 0.0 && dy == 0.0 {
        return None;
    }
    Some(Coord { x: dx, y: dy })
}

/// Classify where `other` sits relative to `this`, seen from a vehicle
/// arriving at the node along `this`.
pub fn relative_position(
    node: Point<f64>,
    this: &Leg,
    other: &Leg,
    angle_threshold: f64,
    right_hand_traffic: bool,
) -> NeighborPosition {
    let (Some(v1), Some(v2)) = (leg_direction(node, this), leg_direction(node, other)) else {
        return NeighborPosition::Far;
    };
    let Some(angle) = angles::vector_angle_degrees(v1, v2) else {
        return NeighborPosition::Far;
    };

    if angle > 180.0 - angle_threshold {
        return NeighborPosition::Opp;
    }
    if (angle - 90.0).abs() < angle_threshold {
        let cross = angles::cross(v1, v2);
        let near = if right_hand_traffic {
            cross < 0.0
        } else {
            cross > 0.0
        };
        return if near {
            NeighborPosition::Near
        } else {
            NeighborPosition::Far
        };
    }
    NeighborPosition::Far
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::point;

    fn leg_towards(x: f64, y: f64) -> Leg {
        Leg {
            neighbor: 1,
            neighbor_coord: Coord { x, y },
            incoming: None,
            geometry: None,
        }
    }

    #[test]
    fn test_opposite_legs() {
        let node = point! { x: 0.0, y: 0.0 };
        let east = leg_towards(1.0, 0.0);
        let west = leg_towards(-1.0, 0.0);
        assert_eq!(
            relative_position(node, &east, &west, 30.0, true),
            NeighborPosition::Opp
        );
    }

    #[test]
    fn test_right_angle_sides_under_rht() {
        let node = point! { x: 0.0, y: 0.0 };
        let east = leg_towards(1.0, 0.0);
        let north = leg_towards(0.0, 1.0);
        let south = leg_towards(0.0, -1.0);
        // Arriving along the eastern leg, the southern leg is on the right.
        assert_eq!(
            relative_position(node, &east, &south, 30.0, true),
            NeighborPosition::Near
        );
        assert_eq!(
            relative_position(node, &east, &north, 30.0, true),
            NeighborPosition::Far
        );
    }

    #[test]
    fn test_sides_invert_under_lht() {
        let node = point! { x: 0.0, y: 0.0 };
        let east = leg_towards(1.0, 0.0);
        let north = leg_towards(0.0, 1.0);
        assert_eq!(
            relative_position(node, &east, &north, 30.0, false),
            NeighborPosition::Near
        );
    }

    #[test]
    fn test_shallow_angle_is_far() {
        let node = point! { x: 0.0, y: 0.0 };
        let east = leg_towards(1.0, 0.0);
        let near_east = leg_towards(1.0, 0.2);
        assert_eq!(
            relative_position(node, &east, &near_east, 30.0, true),
            NeighborPosition::Far
        );
    }

    #[test]
    fn test_geometry_overrides_straight_ray() {
        use geo_types::line_string;
        let node = point! { x: 0.0, y: 0.0 };
        let east = leg_towards(1.0, 0.0);
        // Neighbor sits east, but the road geometry leaves the node heading
        // south before curving away.
        let mut curved = leg_towards(1.0, 0.0);
        curved.geometry = Some(line_string![
            (x: 0.0, y: 0.0),
            (x: 0.0, y: -0.5),
            (x: 1.0, y: -0.5),
            (x: 1.0, y: 0.0),
        ]);
        assert_eq!(
            relative_position(node, &east, &curved, 30.0, true),
            NeighborPosition::Near
        );
    }

    #[test]
    fn test_degenerate_leg_is_far() {
        let node = point! { x: 0.0, y: 0.0 };
        let east = leg_towards(1.0, 0.0);
        let zero = leg_towards(0.0, 0.0);
        assert_eq!(
            relative_position(node, &east, &zero, 30.0, true),
            NeighborPosition::Far
        );
    }
}
