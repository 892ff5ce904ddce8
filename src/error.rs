//! error.rs
//!
//! Error types for reference resolution, book matching, backend access,
//! searching and provisioning.
//!
//! [`Error`] is what every `get`/`resolve`/`search` caller eventually sees.
//! It is cheap to clone because one completed resolution is replayed to
//! every caller waiting on the same reference.

use std::io;
use std::process::ExitStatus;

use thiserror::Error;

/// A reference string that does not match the accepted grammar
/// (`Book chapter`, `Book chapter:verse[,verse...]`, `Book chapter:first-last`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("reference {reference:?} has no chapter token")]
    MissingChapter { reference: String },

    #[error("reference {reference:?} has an invalid chapter {chapter:?}")]
    InvalidChapter { reference: String, chapter: String },

    #[error("reference {reference:?} has an invalid verse {verse:?}")]
    InvalidVerse { reference: String, verse: String },

    #[error("reference {reference:?} has a reversed verse range {first}-{last}")]
    ReversedRange {
        reference: String,
        first: u32,
        last: u32,
    },

    #[error("reference {reference:?} has more than one ':' separator")]
    TooManySeparators { reference: String },
}

/// Failure reported by a lookup backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("backend error: {message}")]
pub struct BackendError {
    pub message: String,
}

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        BackendError {
            message: message.into(),
        }
    }

    /// Returned by the default implementation of an optional backend operation.
    pub fn unsupported(operation: &str) -> Self {
        BackendError::new(format!("operation `{}` is not supported", operation))
    }
}

impl From<io::Error> for BackendError {
    fn from(err: io::Error) -> Self {
        BackendError::new(err.to_string())
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        BackendError::new(err.to_string())
    }
}

/// Invalid search requests. These are never sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("query must be a regular expression or a string")]
    Empty,

    #[error("invalid search pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("backend does not support search")]
    Unsupported,
}

/// Everything a resolution or a search can fail with.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("no canonical book matches {candidate:?}")]
    BookNotFound { candidate: String },

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("language {0:?} not found; add a version for it to the configuration")]
    LanguageNotFound(String),
}

/// Failures while materializing the per-language working copies.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("no Bible versions are configured")]
    NoVersions,

    #[error("cannot determine the home directory")]
    HomeDirectory,

    #[error("i/o error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("`{command}` failed with {status}: {stderr}")]
    Git {
        command: String,
        status: ExitStatus,
        stderr: String,
    },
}

/// Configuration files that cannot be read or decoded.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read configuration: {0}")]
    Io(#[from] io::Error),

    #[error("malformed configuration: {0}")]
    Json(#[from] serde_json::Error),
}
