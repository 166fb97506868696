// ⚠️ Error Types - fatal import failures and per-row entity store failures
// Validation problems are not errors: they come back as RejectionRecords.

use thiserror::Error;

/// Failures that abort a whole preview or finalize call
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("CSV parsing failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("Staged payload could not be encoded or decoded: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("Entity store unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, ImportError>;

/// Outcome of a single create-or-fetch against the entity store
#[derive(Error, Debug)]
pub enum EntityError {
    /// Natural key already taken by a concurrent writer
    #[error("natural key already exists")]
    Conflict,

    /// Record failed model validation (blank field, name taken, ...)
    #[error("Validation failed: {0}")]
    Invalid(String),

    #[error("{0}")]
    Store(rusqlite::Error),
}

impl EntityError {
    /// True when the store itself is unusable and the unit of work must abort
    pub fn is_fatal(&self) -> bool {
        match self {
            EntityError::Store(rusqlite::Error::SqliteFailure(err, _)) => matches!(
                err.code,
                rusqlite::ErrorCode::DatabaseBusy
                    | rusqlite::ErrorCode::DatabaseLocked
                    | rusqlite::ErrorCode::SystemIoFailure
                    | rusqlite::ErrorCode::DiskFull
                    | rusqlite::ErrorCode::DatabaseCorrupt
                    | rusqlite::ErrorCode::NotADatabase
                    | rusqlite::ErrorCode::CannotOpen
                    | rusqlite::ErrorCode::OutOfMemory
                    | rusqlite::ErrorCode::ReadOnly
            ),
            _ => false,
        }
    }
}

impl From<rusqlite::Error> for EntityError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ref e, _)
                if e.code == rusqlite::ErrorCode::ConstraintViolation
                    && (e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                        || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY) =>
            {
                EntityError::Conflict
            }
            other => EntityError::Store(other),
        }
    }
}
