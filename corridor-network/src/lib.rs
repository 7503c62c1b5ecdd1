//! ODD-compliant network extraction.
//!
//! Given the analyzed store and an ODD specification (attribute to
//! allowed-values map), mark incompliant nodes from their feature-tag
//! documents, keep the edges whose endpoints and metadata are compliant, and
//! return the longest connected compliant network as one multi-linestring.

pub mod compliance;
pub mod longest;
pub mod odd;

pub use compliance::{odd_compliant_network, ComplianceResult};
pub use odd::OddSpec;
