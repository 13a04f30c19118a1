//! Error taxonomy for scan runs.
//!
//! Only `ScanError` crosses the `ScanManager::run` boundary. `FileError` and
//! `CheckFault` are absorbed per file or per check and surface through logs,
//! metadata records and `RunSummary::failures`.

use crate::parser::ParseError;
use crate::scan::RunSummary;
use std::path::PathBuf;
use thiserror::Error;

/// Invalid configuration. Always raised before any file is processed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("check '{0}' is registered more than once")]
    DuplicateCheck(String),

    #[error("unknown check '{0}'")]
    UnknownCheck(String),

    #[error("progress batch size must be greater than zero")]
    InvalidBatchSize,

    #[error("jobs must be greater than zero")]
    InvalidJobs,

    #[error("invalid value '{value}' for '{key}'")]
    InvalidValue { key: String, value: String },

    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Run-level failure returned to the caller.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The run was cancelled. Holds everything committed before the signal.
    #[error("scan interrupted after {} file(s)", .0.files_attempted)]
    Interrupted(Box<RunSummary>),
}

/// Recoverable failure of one file.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("syntax error while parsing {path}: {source}")]
    Syntax {
        path: String,
        #[source]
        source: ParseError,
    },
}

/// Internal fault raised by a check implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CheckFault {
    pub message: String,
}

impl CheckFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
