// error.rs
// Error type shared by the writer and the reader

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Why a line failed the structural parsing rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedReason {
    /// Fewer than `MIN_LINE_LEN` characters
    TooShort,
    /// No delimiter at all
    NoDelimiter,
    /// Only the delimiter after the writer id, none after the record key
    SingleDelimiter,
}

impl fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MalformedReason::TooShort => write!(f, "line too short"),
            MalformedReason::NoDelimiter => write!(f, "line has no delimiters"),
            MalformedReason::SingleDelimiter => write!(f, "line has only one delimiter"),
        }
    }
}

#[derive(Error, Debug)]
pub enum CommitLogError {
    /// Empty or missing input, or an operation invoked before an identity was set
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Commit log [{}] does not exist", .0.display())]
    NotFound(PathBuf),

    #[error("IO error on commit log [{}]: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `line` is the 0-based ordinal of the offending line
    #[error("Malformed record at line {line}: {reason}")]
    MalformedRecord { line: usize, reason: MalformedReason },
}

impl CommitLogError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        CommitLogError::Configuration(msg.into())
    }

    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        CommitLogError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, CommitLogError::Configuration(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CommitLogError::NotFound(_))
    }

    pub fn is_io(&self) -> bool {
        matches!(self, CommitLogError::Io { .. })
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, CommitLogError::MalformedRecord { .. })
    }
}

pub type Result<T> = std::result::Result<T, CommitLogError>;
