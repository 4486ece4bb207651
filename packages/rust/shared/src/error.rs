//! Error types for pubtrace.
//!
//! Library crates use [`PubtraceError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all pubtrace operations.
///
/// Every variant here is fatal for a run. Per-record and per-step failures
/// never surface as a `PubtraceError`; they degrade to absent values instead.
#[derive(Debug, thiserror::Error)]
pub enum PubtraceError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while fetching a required document.
    #[error("network error: {0}")]
    Network(String),

    /// Content could not be parsed.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// The seed catalog is malformed or has the wrong shape.
    #[error("catalog error at {location}: {message}")]
    Catalog { location: String, message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Output could not be serialized.
    #[error("serialization error: {0}")]
    Serialize(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PubtraceError>;

impl PubtraceError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a catalog error tied to the location it was read from.
    pub fn catalog(location: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Catalog {
            location: location.into(),
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
