//! # World Error Types
//!
//! All errors that can occur while streaming, saving or configuring chunks.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in the chunk store.
#[derive(Error, Debug)]
pub enum WorldError {
    /// A chunk file could not be read or written.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// A chunk file exists but does not hold a valid chunk image.
    #[error("corrupt chunk file {}: {reason}", path.display())]
    CorruptChunk {
        /// File that failed to decode.
        path: PathBuf,
        /// What was wrong with it.
        reason: String,
    },

    /// Configuration values are inconsistent.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration text could not be parsed.
    #[error("configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

impl WorldError {
    /// Wraps an I/O error with the path it concerns.
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for chunk store operations.
pub type WorldResult<T> = Result<T, WorldError>;
