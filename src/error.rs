//! Error taxonomy of the dataflow engine
//!
//! Backend-level failures always travel to the caller unchanged; only
//! per-path scan problems are downgraded, and those never become an `Err`
//! (see [`crate::artifacts::status::path_entry::PartialScanWarning`]).

use std::path::PathBuf;
use std::time::Duration;

pub type Result<T> = std::result::Result<T, DataflowError>;

#[derive(Debug, thiserror::Error)]
pub enum DataflowError {
    #[error("backend '{program}' unavailable for dataset {root:?}: {reason}")]
    BackendUnavailable {
        root: PathBuf,
        program: String,
        reason: String,
    },

    #[error("dataset root {root:?} is not under version control")]
    NotARepository { root: PathBuf },

    #[error(
        "backend operation '{operation}' on dataset {root:?} timed out after {:.1}s",
        limit.as_secs_f64()
    )]
    BackendTimeout {
        root: PathBuf,
        operation: String,
        limit: Duration,
    },

    #[error("revision '{revision}' not found in dataset {root:?}")]
    RevisionNotFound { root: PathBuf, revision: String },

    #[error("path '{path}' does not exist at revision '{revision}' in dataset {root:?}")]
    PathNotFoundAtRevision {
        root: PathBuf,
        path: String,
        revision: String,
    },

    #[error("cannot restore '{path}' in dataset {root:?}: {reason}")]
    InvalidRestoreTarget {
        root: PathBuf,
        path: String,
        reason: String,
    },

    #[error("write conflict on '{path}' in dataset {root:?}: {detail}")]
    WriteConflict {
        root: PathBuf,
        path: String,
        detail: String,
    },

    #[error(
        "'{path}' was restored from '{revision}' in dataset {root:?} but not committed: {source}"
    )]
    RestoredButUncommitted {
        root: PathBuf,
        path: String,
        revision: String,
        #[source]
        source: Box<DataflowError>,
    },

    #[error("backend operation '{operation}' in dataset {root:?} needs at least one path")]
    EmptyPathspec { root: PathBuf, operation: String },

    #[error("backend operation '{operation}' failed in dataset {root:?} ({status}): {stderr}")]
    BackendFailed {
        root: PathBuf,
        operation: String,
        status: String,
        stderr: String,
    },

    #[error("unexpected output from backend operation '{operation}' in dataset {root:?}: {detail}")]
    MalformedOutput {
        root: PathBuf,
        operation: String,
        detail: String,
    },

    #[error("I/O error on {path:?} in dataset {root:?}: {source}")]
    Io {
        root: PathBuf,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration {path:?}: {reason}")]
    Config { path: PathBuf, reason: String },
}

impl DataflowError {
    /// Short machine-readable name of the error kind, as surfaced to the
    /// presentation layer.
    pub fn kind(&self) -> &'static str {
        match self {
            DataflowError::BackendUnavailable { .. } => "BackendUnavailable",
            DataflowError::NotARepository { .. } => "NotARepository",
            DataflowError::BackendTimeout { .. } => "BackendTimeout",
            DataflowError::RevisionNotFound { .. } => "RevisionNotFound",
            DataflowError::PathNotFoundAtRevision { .. } => "PathNotFoundAtRevision",
            DataflowError::InvalidRestoreTarget { .. } => "InvalidRestoreTarget",
            DataflowError::WriteConflict { .. } => "WriteConflict",
            DataflowError::RestoredButUncommitted { .. } => "RestoredButUncommitted",
            DataflowError::EmptyPathspec { .. } => "EmptyPathspec",
            DataflowError::BackendFailed { .. } => "BackendFailed",
            DataflowError::MalformedOutput { .. } => "MalformedOutput",
            DataflowError::Io { .. } => "Io",
            DataflowError::Config { .. } => "Config",
        }
    }

    pub(crate) fn malformed(
        root: impl Into<PathBuf>,
        operation: &str,
        detail: impl Into<String>,
    ) -> Self {
        DataflowError::MalformedOutput {
            root: root.into(),
            operation: operation.to_string(),
            detail: detail.into(),
        }
    }
}
