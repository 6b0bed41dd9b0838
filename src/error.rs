//! Error taxonomy for archive operations
//!
//! Library operations return [`ArchiveError`] so callers can tell a dead
//! network apart from a malformed response or a bad snapshot file. The CLI
//! layer wraps these in `eyre` reports with extra context.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for archive operations.
pub type Result<T> = std::result::Result<T, ArchiveError>;

#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Network failure or non-2xx status from the search endpoint
    #[error("transport error: {message}")]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// Response missing the expected structure, a server-reported query
    /// error, or a cursor that cannot be derived
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Snapshot file that is not a JSON array of records
    #[error("format error in {}: {message}", .path.display())]
    Format { path: PathBuf, message: String },

    /// Filesystem failure while reading or writing
    #[error("I/O error on {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ArchiveError {
    pub fn transport(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Transport {
            status,
            message: message.into(),
        }
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    pub fn format(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::Format {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// HTTP status attached to a transport failure, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => *status,
            _ => None,
        }
    }
}
