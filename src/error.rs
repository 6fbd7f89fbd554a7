//! Error types for the wallboard client

use thiserror::Error;

/// Result type alias for wallboard operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while watching a board
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to build the HTTP client
    #[error("Client initialization failed: {0}")]
    InitializationError(String),

    /// The board URL did not parse
    #[error("Invalid board URL: {0}")]
    UrlError(String),

    /// Failed to fetch the board document
    #[error("Failed to fetch board: {0}")]
    FetchError(String),

    /// Failed to serialize the page snapshot
    #[error("Snapshot failed: {0}")]
    SnapshotError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
