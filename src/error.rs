//! Error types surfaced by the explorer core.

use std::path::PathBuf;

use thiserror::Error;

/// Failure of the graph collaborator for one filter selection.
///
/// Fetch errors are terminal for the selection that triggered them; the core
/// never retries on its own.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The collaborator could not be reached or refused the request.
    #[error("graph source unavailable: {0}")]
    Unavailable(String),

    /// The collaborator answered with something that is not a graph payload.
    #[error("malformed graph payload: {0}")]
    Malformed(String),

    /// The background worker went away before reporting a result.
    #[error("fetch worker disconnected")]
    Disconnected,
}

/// Failure while loading an explorer configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config value: {0}")]
    Invalid(String),
}
