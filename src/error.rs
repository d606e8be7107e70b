//! Error types for file-backed operations.
//!
//! Lookup misses (unknown template, protocol or task ids) are not errors: the
//! store reports them through [`crate::store::Lookup`] and
//! [`crate::store::ToggleOutcome`]. Only I/O, parsing and configuration
//! failures end up here.

use std::path::PathBuf;

/// Errors raised while loading or saving catalogs and sessions.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// Reading or writing a file failed.
    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file was readable but its JSON did not match the expected shape.
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Serializing in-memory state failed.
    #[error("failed to serialize session: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Invalid configuration value.
    #[error("configuration error: {0}")]
    Config(String),
}

impl TrackerError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TrackerError::Io { path: path.into(), source }
    }

    pub(crate) fn parse(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        TrackerError::Parse { path: path.into(), source }
    }
}

pub type Result<T> = std::result::Result<T, TrackerError>;
