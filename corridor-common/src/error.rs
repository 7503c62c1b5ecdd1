//! Error types for the corridor toolkit.

use thiserror::Error;

/// Main error type for corridor operations
#[derive(Debug, Error)]
pub enum Error {
    /// A node id was requested that the graph does not contain
    #[error("node {0} not found in graph")]
    NodeNotFound(i64),

    /// An edge geometry could not be interpreted
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// The conflict rule table does not cover every movement/position combination
    #[error("conflict rule table covers {covered} of {expected} combinations")]
    IncompleteRuleTable { covered: usize, expected: usize },

    /// Two rules claim the same movement/position combination
    #[error("duplicate conflict rule for ({this}, {other}, {position})")]
    DuplicateRule {
        this: String,
        other: String,
        position: String,
    },

    /// A stored document is missing fields or has the wrong shape
    #[error("malformed document: {0}")]
    MalformedDocument(String),

    /// Invalid configuration or parameters
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// JSON (de)serialization failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for corridor operations
pub type Result<T> = std::result::Result<T, Error>;
