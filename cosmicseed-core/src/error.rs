//! Error types for cosmicseed-core.

use thiserror::Error;

/// Result type alias for cosmicseed operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types.
///
/// Clusters that fail a threshold or do not converge are not errors; see
/// [`crate::statistics::Rejection`]. Errors here abort a whole event.
#[derive(Error, Debug)]
pub enum Error {
    /// An index held by one collection points outside the collection it refers to.
    #[error("{collection} hit index {index} out of range (len {len}) in entry {owner}")]
    InvalidHitIndex {
        collection: &'static str,
        owner: usize,
        index: usize,
        len: usize,
    },

    /// No calibration is available for the requested run.
    #[error("no conditions available for run {run}")]
    MissingConditions { run: u32 },

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Malformed JSON configuration or conditions.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// File I/O while loading configuration or conditions.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
