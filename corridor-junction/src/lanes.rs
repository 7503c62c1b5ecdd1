//! Lane movement parsing.
//!
//! `turn:lanes:forward` / `turn:lanes:backward` tags encode per-lane
//! movements, lanes separated by `|` and movements within a lane by `;`.
//! Unknown movement tokens are dropped; a tag that resolves to nothing is
//! read as a single through lane.

use std::collections::BTreeSet;

use corridor_graph::Tags;
use serde::{Deserialize, Serialize};

/// Raw turn-lane vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LaneTurn {
    Through,
    Left,
    SlightLeft,
    SharpLeft,
    Right,
    SlightRight,
    SharpRight,
    Reverse,
    MergeToLeft,
    MergeToRight,
}

impl LaneTurn {
    pub fn parse(token: &str) -> Option<Self> {
        match token.trim().to_ascii_uppercase().as_str() {
            "THROUGH" => Some(LaneTurn::Through),
            "LEFT" => Some(LaneTurn::Left),
            "SLIGHT_LEFT" => Some(LaneTurn::SlightLeft),
            "SHARP_LEFT" => Some(LaneTurn::SharpLeft),
            "RIGHT" => Some(LaneTurn::Right),
            "SLIGHT_RIGHT" => Some(LaneTurn::SlightRight),
            "SHARP_RIGHT" => Some(LaneTurn::SharpRight),
            "REVERSE" => Some(LaneTurn::Reverse),
            "MERGE_TO_LEFT" => Some(LaneTurn::MergeToLeft),
            "MERGE_TO_RIGHT" => Some(LaneTurn::MergeToRight),
            _ => None,
        }
    }
}

/// Coarse movement category through a junction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Movement {
    Thru,
    Turn,
    Cross,
    Reverse,
}

impl Movement {
    pub fn name(&self) -> &'static str {
        match self {
            Movement::Thru => "THRU",
            Movement::Turn => "TURN",
            Movement::Cross => "CROSS",
            Movement::Reverse => "REVERSE",
        }
    }

    pub const ALL: [Movement; 4] = [
        Movement::Thru,
        Movement::Turn,
        Movement::Cross,
        Movement::Reverse,
    ];
}

impl std::fmt::Display for Movement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Map a lane turn to a movement under the given driving side. A turn
/// towards the near side of the road (right under right-hand traffic) stays
/// a TURN; turning across oncoming traffic is a CROSS.
pub fn movement_for(turn: LaneTurn, right_hand_traffic: bool) -> Movement {
    match turn {
        LaneTurn::Through => Movement::Thru,
        LaneTurn::Reverse => Movement::Reverse,
        t => {
            let rightward = matches!(
                t,
                LaneTurn::Right
                    | LaneTurn::SlightRight
                    | LaneTurn::SharpRight
                    | LaneTurn::MergeToRight
            );
            if rightward == right_hand_traffic {
                Movement::Turn
            } else {
                Movement::Cross
            }
        }
    }
}

/// Parsed lane data for one direction of an edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaneInfo {
    pub turns: BTreeSet<LaneTurn>,
    pub lane_count: usize,
    pub estimated: bool,
}

/// Parse the turn and lane-count tags of one edge direction. `reversed`
/// selects the `backward` tag family (the edge traverses its source way
/// against the stored orientation).
pub fn parse_lane_data(tags: &Tags, reversed: bool) -> LaneInfo {
    let side = if reversed { "backward" } else { "forward" };
    let turn_key = format!("turn:lanes:{side}");

    // one string per lane, regardless of tag shape
    let lane_strings: Vec<String> = match tags.get(&turn_key) {
        None => Vec::new(),
        Some(v) if v.is_list() => v.values().map(str::to_string).collect(),
        Some(v) if v.first().is_empty() => Vec::new(),
        Some(v) => v.first().split('|').map(str::to_string).collect(),
    };

    let mut turns: BTreeSet<LaneTurn> = BTreeSet::new();
    for lane in &lane_strings {
        for token in lane.split(';') {
            if let Some(turn) = LaneTurn::parse(token) {
                turns.insert(turn);
            }
        }
    }
    if turns.is_empty() {
        turns.insert(LaneTurn::Through);
    }

    let lanes_key = format!("lanes:{side}");
    let (lane_count, estimated) = if !lane_strings.is_empty() {
        (lane_strings.len(), false)
    } else if let Some(v) = tags.get(&lanes_key) {
        match v.first().trim().parse::<usize>() {
            Ok(n) if n >= 1 => (n, true),
            _ => (1, true),
        }
    } else {
        (1, true)
    };

    LaneInfo {
        turns,
        lane_count,
        estimated,
    }
}
