//! Shared foundations for the corridor toolkit: the common error type and
//! parsing of OSM-style quantity strings (lengths, speeds).

pub mod error;
pub mod units;

pub use error::{Error, Result};
