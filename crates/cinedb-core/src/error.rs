//! Core error types.

use std::path::PathBuf;
use thiserror::Error;

/// Core database errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Source file is missing or not parseable as CSV.
    #[error("cannot read source {path}: {reason}")]
    SourceRead {
        /// Path that was being read.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// A projected (or nested source) column is absent from the normalized data.
    #[error("column '{column}' not present in source (available: {available})")]
    SchemaProjection {
        /// The missing column.
        column: String,
        /// Comma separated list of columns that were present.
        available: String,
    },

    /// Table is not in the catalog.
    #[error("unknown table '{0}'")]
    UnknownTable(String),

    /// Column is not in the catalog for the given table.
    #[error("unknown column '{column}' in table '{table}'")]
    UnknownColumn {
        /// Table that was searched.
        table: String,
        /// The missing column.
        column: String,
    },

    /// The store rejected a write.
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    /// A free-form statement failed to prepare or execute.
    #[error("query error: {0}")]
    Query(String),

    /// Caller supplied input of the wrong shape.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Underlying SQLite error.
    #[error("storage error: {0}")]
    Storage(rusqlite::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(code, message)
                if code.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Error::ConstraintViolation(message.unwrap_or_else(|| code.to_string()))
            }
            other => Error::Storage(other),
        }
    }
}

impl Error {
    /// Build a source read error.
    pub(crate) fn source_read(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Error::SourceRead {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
