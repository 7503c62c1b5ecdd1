//! Junction analysis: type classification, movement conflict counting and
//! corridor footprint synthesis.
//!
//! The pipeline per node: classify the junction type (tags first, shape
//! heuristic last), gather the legs meeting at the node, count potential
//! movement conflicts over every leg pair via the rule table, and buffer the
//! trimmed leg centerlines into the junction's paved footprint. Results are
//! upserted into the document store keyed by node coordinates.

pub mod analyzer;
pub mod conflict;
pub mod corridor;
pub mod junction_type;
pub mod lanes;
pub mod legs;
pub mod params;
pub mod position;
pub mod record;
pub mod road_segments;

pub use analyzer::{JunctionAnalyzer, RunReport};
pub use conflict::{ConflictRule, ConflictType, RuleTable};
pub use junction_type::JunctionType;
pub use lanes::{LaneTurn, Movement};
pub use params::AnalysisParams;
pub use position::NeighborPosition;
pub use record::JunctionRecord;
pub use road_segments::{HighwayType, LaneMarking, RoadSegmentRecord};
