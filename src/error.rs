//! Error types for the interpreter state crate.
//!
//! Store operations never fail; these errors come from loading startup
//! configuration and from the host bridge protocol.

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// Configuration file could not be parsed or is otherwise unusable.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode/decode error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Host command envelope or payload was rejected.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Reading from or writing to the host channel failed.
    #[error("channel error: {0}")]
    Channel(String),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, StateError>;
