//! Error types for docscout.
//!
//! Two families exist. [`SearchError`] covers failures at the session level:
//! bad criteria, a second session while one is running, a directory walk that
//! cannot continue. [`ExtractError`] covers failures scoped to a single file;
//! those are reported on the file's result and never abort a scan.
use std::path::PathBuf;
use thiserror::Error;

/// Result type for session-level operations
pub type SearchResult<T> = Result<T, SearchError>;

/// Result type for per-file extraction
pub type ExtractResult<T> = Result<T, ExtractError>;

/// Errors that stop a session from starting or from continuing
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Invalid search criteria: {0}")]
    InvalidCriteria(String),
    #[error("A search session is already running")]
    SessionActive,
    #[error("Cannot access {path}: {source}")]
    ScanAccess {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to scan directory {path}: {message}")]
    ScanFatal { path: PathBuf, message: String },
    #[error("Failed to open {path}: {message}")]
    Launch { path: PathBuf, message: String },
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl SearchError {
    pub fn invalid_criteria(msg: impl Into<String>) -> Self {
        Self::InvalidCriteria(msg.into())
    }

    pub fn scan_access(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ScanAccess {
            path: path.into(),
            source,
        }
    }

    pub fn scan_fatal(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ScanFatal {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn launch(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Launch {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}

impl From<config::ConfigError> for SearchError {
    fn from(err: config::ConfigError) -> Self {
        Self::ConfigError(err.to_string())
    }
}

/// Errors confined to one file's evaluation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("Unreadable file {path}: {reason}")]
    UnreadableFile { path: PathBuf, reason: String },
    #[error("Protected document: {0}")]
    ProtectedDocument(PathBuf),
    #[error("Document has no pages: {0}")]
    EmptyDocument(PathBuf),
    #[error("Failed to read {unit} in {path}: {reason}")]
    PartialRead {
        path: PathBuf,
        unit: String,
        reason: String,
    },
    #[error("Unexpected error evaluating {path}: {reason}")]
    UnexpectedEvaluation { path: PathBuf, reason: String },
}

impl ExtractError {
    pub fn unreadable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::UnreadableFile {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn protected(path: impl Into<PathBuf>) -> Self {
        Self::ProtectedDocument(path.into())
    }

    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self::EmptyDocument(path.into())
    }

    pub fn partial_read(
        path: impl Into<PathBuf>,
        unit: impl Into<String>,
        reason: impl ToString,
    ) -> Self {
        Self::PartialRead {
            path: path.into(),
            unit: unit.into(),
            reason: reason.to_string(),
        }
    }

    pub fn unexpected(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::UnexpectedEvaluation {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Stable name of the failure class, used in diagnostic labels
    pub fn category(&self) -> &'static str {
        match self {
            Self::UnreadableFile { .. } => "UnreadableFile",
            Self::ProtectedDocument(_) => "ProtectedDocument",
            Self::EmptyDocument(_) => "EmptyDocument",
            Self::PartialRead { .. } => "PartialReadError",
            Self::UnexpectedEvaluation { .. } => "UnexpectedEvaluationError",
        }
    }
}
