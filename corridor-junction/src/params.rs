//! Analysis parameters.

use std::path::Path;

use corridor_common::Result;
use serde::{Deserialize, Serialize};

/// Thresholds and conventions for a junction analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisParams {
    /// Distance in meters from the node at which leg centerlines are cut.
    pub trim_distance: f64,
    /// Max leg-pair angle in degrees separating T from Y junctions.
    pub junction_angle_threshold: f64,
    /// Angle window in degrees for the neighbor position classifier.
    pub neighbor_angle_threshold: f64,
    /// Whether vehicles drive on the right side of the road.
    pub right_hand_traffic: bool,
    /// Carriageway width per lane in meters when no width tag resolves.
    pub default_lane_width: f64,
    /// Recompute junctions already present in the store.
    pub overwrite: bool,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            trim_distance: 10.0,
            junction_angle_threshold: 110.0,
            neighbor_angle_threshold: 30.0,
            right_hand_traffic: true,
            default_lane_width: 4.0,
            overwrite: false,
        }
    }
}

impl AnalysisParams {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        Ok(serde_json::from_str(&std::fs::read_to_string(path)?)?)
    }
}
