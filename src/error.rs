//! Error type and `Result` alias shared by the crate.

use std::io;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GraphError>;

/// Errors raised by graph construction, lookups and the I/O adapters.
///
/// An infection that cannot meet its target is not an error; it is reported
/// through [`crate::InfectionOutcome::Infeasible`].
#[derive(Debug, Error)]
pub enum GraphError {
    /// A user id is not present in the graph.
    #[error("user '{0}' not found")]
    NotFound(String),
    /// A graph document references ids it never declares.
    #[error("malformed input: {0}")]
    MalformedInput(String),
    /// A caller-supplied argument is out of range or empty.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// I/O error while reading or writing a graph document.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// JSON (de)serialization error.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GraphError {
    pub(crate) fn not_found(id: impl Into<String>) -> Self {
        GraphError::NotFound(id.into())
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        GraphError::InvalidArgument(message.into())
    }
}
