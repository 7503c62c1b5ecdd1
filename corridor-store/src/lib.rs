//! Analysis document store.
//!
//! Holds the three document families the extractors produce: junction
//! features keyed by node coordinates, per-node feature-tag documents keyed
//! by node id, and road-segment features keyed by edge id. Writes are
//! idempotent upserts so re-running an analysis (or running it from several
//! workers) converges to the same state. This crate is the seam a document
//! database would occupy in a deployed system.

pub mod catalog;
pub mod store;

pub use catalog::{FeatureAttribute, FeatureCatalog};
pub use store::{coord_key, CoordKey, MemoryStore, NodeFeature};
