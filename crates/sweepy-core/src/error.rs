//! Error taxonomy for the analyzer.
//!
//! Errors at or above the repository boundary ([`AcquisitionError`],
//! [`InvariantError`], cancellation) abort the whole analysis. [`FileError`]s
//! are contained: the offending file is dropped from the result and recorded
//! as a diagnostic.

use crate::types::{Diagnostic, DiagnosticKind};

/// Failure to turn a repository location into a local snapshot.
#[derive(Debug, thiserror::Error)]
pub enum AcquisitionError {
    #[error("invalid repository location '{0}'")]
    InvalidLocation(String),

    #[error("repository not found: {0}")]
    NotFound(String),

    #[error("branch '{branch}' not found in {location}")]
    BranchNotFound { location: String, branch: String },

    #[error("failed to clone {location}: {message}")]
    Clone { location: String, message: String },

    #[error("acquiring {location} exceeded the {secs}s deadline")]
    Timeout { location: String, secs: u64 },

    #[error("acquisition cancelled")]
    Cancelled,

    #[error("I/O error during acquisition: {0}")]
    Io(#[from] std::io::Error),
}

/// Per-file failure. Never fatal to the batch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FileError {
    #[error("failed to read {file}: {message}")]
    Read { file: String, message: String },

    #[error("syntax error in {file} at line {line}")]
    Parse { file: String, line: usize },

    #[error("parsing {file} exceeded {timeout_ms}ms")]
    Timeout { file: String, timeout_ms: u64 },

    #[error("parser unavailable for {file}: {message}")]
    Language { file: String, message: String },
}

impl FileError {
    pub fn file(&self) -> &str {
        match self {
            FileError::Read { file, .. }
            | FileError::Parse { file, .. }
            | FileError::Timeout { file, .. }
            | FileError::Language { file, .. } => file,
        }
    }

    /// Convert into the diagnostic recorded alongside the analysis result.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let (kind, line) = match self {
            FileError::Read { .. } | FileError::Language { .. } => (DiagnosticKind::ReadError, None),
            FileError::Parse { line, .. } => (DiagnosticKind::ParseError, Some(*line)),
            FileError::Timeout { .. } => (DiagnosticKind::Timeout, None),
        };
        Diagnostic {
            kind,
            file: Some(self.file().to_string()),
            line,
            message: self.to_string(),
        }
    }
}

/// The extractor emitted a record that breaks the data model. Signals a bug,
/// never user input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("import record at {file}:{line} has no bindings and is not a wildcard")]
pub struct InvariantError {
    pub file: String,
    pub line: usize,
}

/// Top-level error for a whole analysis request.
#[derive(Debug, thiserror::Error)]
pub enum SweepyError {
    #[error(transparent)]
    Acquisition(#[from] AcquisitionError),

    #[error("internal invariant violated: {0}")]
    Invariant(#[from] InvariantError),

    #[error("invalid exclude pattern: {0}")]
    Pattern(#[from] globset::Error),

    #[error("failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("analysis cancelled")]
    Cancelled,
}

pub type SweepyResult<T> = Result<T, SweepyError>;
