//! Movement conflict classification.
//!
//! A rule table maps (this movement, other movement, neighbor position) to a
//! conflict class. The table must be total over the 48 combinations so every
//! movement pair at a junction classifies without fallthrough.

use std::collections::BTreeMap;
use std::path::Path;

use corridor_common::{Error, Result};
use geo_types::Point;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::lanes::{self, Movement};
use crate::legs::Leg;
use crate::position::{self, NeighborPosition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictType {
    Intersect,
    Merge,
    NoConflict,
}

impl ConflictType {
    pub fn name(&self) -> &'static str {
        match self {
            ConflictType::Intersect => "INTERSECT",
            ConflictType::Merge => "MERGE",
            ConflictType::NoConflict => "NO_CONFLICT",
        }
    }
}

impl std::fmt::Display for ConflictType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One rule of the classifier, as stored in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictRule {
    pub this_move: Movement,
    pub other_move: Movement,
    #[serde(rename = "nbr_pos")]
    pub position: NeighborPosition,
    pub conflict: ConflictType,
}

/// Total lookup table over movement pairs and neighbor positions.
#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: BTreeMap<(Movement, Movement, NeighborPosition), ConflictType>,
}

impl RuleTable {
    /// Build a table from explicit rules, rejecting duplicates and gaps.
    pub fn from_rules(rules: &[ConflictRule]) -> Result<Self> {
        let mut map = BTreeMap::new();
        for rule in rules {
            let key = (rule.this_move, rule.other_move, rule.position);
            if map.insert(key, rule.conflict).is_some() {
                return Err(Error::DuplicateRule {
                    this: rule.this_move.name().to_string(),
                    other: rule.other_move.name().to_string(),
                    position: rule.position.name().to_string(),
                });
            }
        }
        let expected = Movement::ALL.len() * Movement::ALL.len() * NeighborPosition::ALL.len();
        if map.len() != expected {
            return Err(Error::IncompleteRuleTable {
                covered: map.len(),
                expected,
            });
        }
        Ok(Self { rules: map })
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let rules: Vec<ConflictRule> = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        Self::from_rules(&rules)
    }

    pub fn classify(
        &self,
        this: Movement,
        other: Movement,
        position: NeighborPosition,
    ) -> ConflictType {
        self.rules
            .get(&(this, other, position))
            .copied()
            .unwrap_or(ConflictType::NoConflict)
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        let mut rules = BTreeMap::new();
        for (this, other, position, conflict) in DEFAULT_RULES {
            rules.insert((this, other, position), conflict);
        }
        Self { rules }
    }
}

/// Count potential conflicts over every unordered pair of legs. Pairs where
/// either leg lacks inbound turn data count as a single NO_CONFLICT.
pub fn count_conflicts(
    node: Point<f64>,
    legs: &[Leg],
    table: &RuleTable,
    angle_threshold: f64,
    right_hand_traffic: bool,
) -> BTreeMap<ConflictType, u64> {
    let mut counts: BTreeMap<ConflictType, u64> = BTreeMap::new();
    for (a, b) in legs.iter().tuple_combinations() {
        let (Some(turns_a), Some(turns_b)) = (&a.incoming, &b.incoming) else {
            *counts.entry(ConflictType::NoConflict).or_insert(0) += 1;
            continue;
        };
        let pos = position::relative_position(node, a, b, angle_threshold, right_hand_traffic);
        for &ta in turns_a {
            for &tb in turns_b {
                let this = lanes::movement_for(ta, right_hand_traffic);
                let other = lanes::movement_for(tb, right_hand_traffic);
                let conflict = table.classify(this, other, pos);
                *counts.entry(conflict).or_insert(0) += 1;
            }
        }
    }
    counts
}

use ConflictType::{Intersect, Merge, NoConflict};
use Movement::{Cross, Reverse, Thru, Turn};
use NeighborPosition::{Far, Near, Opp};

const DEFAULT_RULES: [(Movement, Movement, NeighborPosition, ConflictType); 48] = [
    (Thru, Thru, Opp, NoConflict),
    (Thru, Thru, Near, Intersect),
    (Thru, Thru, Far, Intersect),
    (Thru, Turn, Opp, NoConflict),
    (Thru, Turn, Near, Merge),
    (Thru, Turn, Far, NoConflict),
    (Thru, Cross, Opp, Intersect),
    (Thru, Cross, Near, Intersect),
    (Thru, Cross, Far, Merge),
    (Thru, Reverse, Opp, Merge),
    (Thru, Reverse, Near, Intersect),
    (Thru, Reverse, Far, Intersect),
    (Turn, Thru, Opp, NoConflict),
    (Turn, Thru, Near, NoConflict),
    (Turn, Thru, Far, Merge),
    (Turn, Turn, Opp, NoConflict),
    (Turn, Turn, Near, NoConflict),
    (Turn, Turn, Far, NoConflict),
    (Turn, Cross, Opp, Merge),
    (Turn, Cross, Near, NoConflict),
    (Turn, Cross, Far, NoConflict),
    (Turn, Reverse, Opp, NoConflict),
    (Turn, Reverse, Near, Merge),
    (Turn, Reverse, Far, NoConflict),
    (Cross, Thru, Opp, Intersect),
    (Cross, Thru, Near, Merge),
    (Cross, Thru, Far, Intersect),
    (Cross, Turn, Opp, Merge),
    (Cross, Turn, Near, NoConflict),
    (Cross, Turn, Far, NoConflict),
    (Cross, Cross, Opp, Intersect),
    (Cross, Cross, Near, Intersect),
    (Cross, Cross, Far, Intersect),
    (Cross, Reverse, Opp, Intersect),
    (Cross, Reverse, Near, Intersect),
    (Cross, Reverse, Far, Merge),
    (Reverse, Thru, Opp, Merge),
    (Reverse, Thru, Near, Intersect),
    (Reverse, Thru, Far, Intersect),
    (Reverse, Turn, Opp, NoConflict),
    (Reverse, Turn, Near, NoConflict),
    (Reverse, Turn, Far, Merge),
    (Reverse, Cross, Opp, Intersect),
    (Reverse, Cross, Near, Merge),
    (Reverse, Cross, Far, Intersect),
    (Reverse, Reverse, Opp, Intersect),
    (Reverse, Reverse, Near, Intersect),
    (Reverse, Reverse, Far, Intersect),
];

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{point, Coord};
    use std::collections::BTreeSet;

    use crate::lanes::LaneTurn;

    #[test]
    fn test_default_table_is_total() {
        let table = RuleTable::default();
        assert_eq!(table.rules.len(), 48);
        for this in Movement::ALL {
            for other in Movement::ALL {
                for pos in NeighborPosition::ALL {
                    // Every combination resolves through an explicit rule.
                    assert!(table.rules.contains_key(&(this, other, pos)));
                }
            }
        }
    }

    #[test]
    fn test_spot_checks_against_defaults() {
        let table = RuleTable::default();
        assert_eq!(
            table.classify(Movement::Thru, Movement::Thru, NeighborPosition::Opp),
            ConflictType::NoConflict
        );
        assert_eq!(
            table.classify(Movement::Thru, Movement::Cross, NeighborPosition::Near),
            ConflictType::Intersect
        );
        assert_eq!(
            table.classify(Movement::Turn, Movement::Thru, NeighborPosition::Far),
            ConflictType::Merge
        );
        assert_eq!(
            table.classify(Movement::Reverse, Movement::Reverse, NeighborPosition::Far),
            ConflictType::Intersect
        );
    }

    #[test]
    fn test_from_rules_rejects_missing_entries() {
        let rules = vec![ConflictRule {
            this_move: Movement::Thru,
            other_move: Movement::Thru,
            position: NeighborPosition::Opp,
            conflict: ConflictType::NoConflict,
        }];
        assert!(RuleTable::from_rules(&rules).is_err());
    }

    #[test]
    fn test_from_rules_rejects_duplicates() {
        let rule = ConflictRule {
            this_move: Movement::Thru,
            other_move: Movement::Thru,
            position: NeighborPosition::Opp,
            conflict: ConflictType::NoConflict,
        };
        let mut dup = rule;
        dup.conflict = ConflictType::Merge;
        assert!(RuleTable::from_rules(&[rule, dup]).is_err());
    }

    #[test]
    fn test_rule_json_shape() {
        let rule: ConflictRule = serde_json::from_str(
            r#"{"this_move": "THRU", "other_move": "CROSS", "nbr_pos": "NEAR", "conflict": "INTERSECT"}"#,
        )
        .unwrap();
        assert_eq!(rule.position, NeighborPosition::Near);
        assert_eq!(rule.conflict, ConflictType::Intersect);
    }

    fn leg(x: f64, y: f64, turns: Option<&[LaneTurn]>) -> Leg {
        Leg {
            neighbor: 1,
            neighbor_coord: Coord { x, y },
            incoming: turns.map(|t| t.iter().copied().collect::<BTreeSet<_>>()),
            geometry: None,
        }
    }

    #[test]
    fn test_count_conflicts_crossroad() {
        // Four through legs at right angles: each of the six pairs lands on
        // the THRU/THRU row. Two OPP pairs (NO_CONFLICT) plus four
        // right-angle pairs (INTERSECT).
        let node = point! { x: 0.0, y: 0.0 };
        let legs = vec![
            leg(1.0, 0.0, Some(&[LaneTurn::Through])),
            leg(0.0, 1.0, Some(&[LaneTurn::Through])),
            leg(-1.0, 0.0, Some(&[LaneTurn::Through])),
            leg(0.0, -1.0, Some(&[LaneTurn::Through])),
        ];
        let counts = count_conflicts(node, &legs, &RuleTable::default(), 30.0, true);
        assert_eq!(counts.get(&ConflictType::NoConflict), Some(&2));
        assert_eq!(counts.get(&ConflictType::Intersect), Some(&4));
        assert_eq!(counts.get(&ConflictType::Merge), None);
    }

    #[test]
    fn test_missing_turn_data_counts_one_no_conflict() {
        let node = point! { x: 0.0, y: 0.0 };
        let legs = vec![
            leg(1.0, 0.0, Some(&[LaneTurn::Through])),
            leg(-1.0, 0.0, None),
        ];
        let counts = count_conflicts(node, &legs, &RuleTable::default(), 30.0, true);
        assert_eq!(counts.get(&ConflictType::NoConflict), Some(&1));
        assert_eq!(counts.len(), 1);
    }

    #[test]
    fn test_cartesian_product_over_turn_sets() {
        // Two turns on each of two opposite legs: four classified pairs.
        let node = point! { x: 0.0, y: 0.0 };
        let legs = vec![
            leg(1.0, 0.0, Some(&[LaneTurn::Through, LaneTurn::Left])),
            leg(-1.0, 0.0, Some(&[LaneTurn::Through, LaneTurn::Left])),
        ];
        let counts = count_conflicts(node, &legs, &RuleTable::default(), 30.0, true);
        let total: u64 = counts.values().sum();
        assert_eq!(total, 4);
        // THRU/CROSS and CROSS/THRU at OPP are INTERSECT, CROSS/CROSS at
        // OPP is INTERSECT, THRU/THRU at OPP is NO_CONFLICT.
        assert_eq!(counts.get(&ConflictType::Intersect), Some(&3));
        assert_eq!(counts.get(&ConflictType::NoConflict), Some(&1));
    }
}
