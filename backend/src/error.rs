//! Error types of the import pipeline.
//!
//! Failures are layered the way they surface during a run:
//! - `DecodeError`: a line of an input file could not be turned into a record.
//! - `RepositoryError`: the SQLite store rejected a read or a batch write.
//! - `ImportError`: everything a step or the job can fail with, wrapping the two above.

use common::model::validation::ValidationError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("line {line}: expected {expected} columns, found {found} ({raw})")]
    ColumnCount {
        line: u64,
        expected: usize,
        found: usize,
        raw: String,
    },

    #[error("line {line}: {message} ({raw})")]
    Field {
        line: u64,
        message: String,
        raw: String,
    },

    #[error("read failed: {0}")]
    Read(#[from] csv::Error),
}

impl DecodeError {
    /// The raw content of the offending line, when one was read.
    pub fn raw_line(&self) -> Option<&str> {
        match self {
            DecodeError::ColumnCount { raw, .. } | DecodeError::Field { raw, .. } => Some(raw),
            _ => None,
        }
    }

    /// Whether the input as a whole is lost, as opposed to a single bad line.
    pub fn is_fatal(&self) -> bool {
        match self {
            DecodeError::Open { .. } => true,
            DecodeError::Read(e) => e.is_io_error(),
            DecodeError::ColumnCount { .. } | DecodeError::Field { .. } => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("constraint violation: {0}")]
    Validation(#[from] ValidationError),
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("referenced category not found: {0}")]
    CategoryNotFound(i64),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("step {step} aborted: {source}")]
    StepAborted {
        step: &'static str,
        #[source]
        source: Box<ImportError>,
    },

    #[error("job instance {job_name} with run token {run_token} is already complete")]
    AlreadyComplete { job_name: String, run_token: i64 },

    #[error("job instance {job_name} with run token {run_token} is already running")]
    AlreadyRunning { job_name: String, run_token: i64 },

    #[error("import worker stopped: {0}")]
    Worker(String),
}
