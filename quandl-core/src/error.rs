//! Structured error types for the pull pipeline.
//!
//! Every stage returns a `PullError` to its caller without local recovery.
//! The driver is the only place that inspects errors, and it only ever skips
//! the two remote conditions reported by [`PullError::is_skippable`].

use std::fmt;
use thiserror::Error;

use crate::config::ConfigError;

/// Classification of a logical error reported by the upstream API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteErrorKind {
    /// The dataset code does not exist (bad ticker for the database).
    InvalidCode,
    /// The request path could not be parsed upstream (malformed symbol).
    UnrecognizedUrl,
    /// Anything else: auth failures, rate limits, premium datasets.
    Other,
}

impl fmt::Display for RemoteErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RemoteErrorKind::InvalidCode => "invalid code",
            RemoteErrorKind::UnrecognizedUrl => "URL not recognized",
            RemoteErrorKind::Other => "other",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum PullError {
    #[error("invalid service request: '{0}'")]
    InvalidService(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("remote error ({kind}): {message}")]
    Remote {
        kind: RemoteErrorKind,
        code: Option<String>,
        message: String,
    },

    #[error("invalid date '{value}': {reason}")]
    DateParse { value: String, reason: String },

    #[error("row {row} has {found} values but there are {expected} column names")]
    IndexOutOfRange {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("file system error: {0}")]
    FileSystem(String),

    #[error("unsupported response format: {0}")]
    UnsupportedFormat(String),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

impl PullError {
    /// True for remote conditions that end processing of one ticker only.
    pub fn is_skippable(&self) -> bool {
        matches!(
            self,
            PullError::Remote {
                kind: RemoteErrorKind::InvalidCode | RemoteErrorKind::UnrecognizedUrl,
                ..
            }
        )
    }
}
