//! Error types module
//!
//! Every operation of the upload core fails with an `UploadError`. Variants are
//! grouped into the kinds reported by [`UploadError::kind`]: validation,
//! authorization, temporal, state, lookup and downstream failures.
//!
//! The `Database` variant and `From<sqlx::Error>` are gated behind the `sqlx` feature.
//! Storage failures are boxed so this crate does not depend on the storage crate;
//! `stagehand-storage` provides the `From<StorageError>` conversion.

use chrono::{DateTime, Utc};
use uuid::Uuid;

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

/// Result type for upload core operations
pub type UploadResult<T> = Result<T, UploadError>;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for rejected but well-formed requests
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Coarse classification of an `UploadError`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad arguments, rejected before any side effect
    Validation,
    /// Caller does not own the session
    Authorization,
    /// Session is past its expiry
    Temporal,
    /// Session or file state does not allow the operation
    State,
    /// Unknown session
    Lookup,
    /// Ledger or object store failure, propagated as-is
    Downstream,
}

/// Metadata for error responses - defines how an error should be presented
/// by whatever transport wraps this core.
pub trait ErrorMetadata {
    /// HTTP status code a transport would most likely map this error to
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "QUOTA_EXCEEDED")
    fn error_code(&self) -> &'static str;

    /// Whether retrying the same call can succeed
    fn is_recoverable(&self) -> bool;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Upload session not found: {session_id}")]
    SessionNotFound { session_id: Uuid },

    #[error("Forbidden: upload session {session_id} belongs to another owner")]
    Forbidden { session_id: Uuid },

    #[error("Upload session {session_id} expired at {expired_at}")]
    Expired {
        session_id: Uuid,
        expired_at: DateTime<Utc>,
    },

    #[error("Upload session {session_id} has no files")]
    NoFiles { session_id: Uuid },

    #[error("Staged object for file {file_id} is missing: {key}")]
    FileMissing { file_id: Uuid, key: String },

    #[error("Too many files: max={limit}, existing={existing}, requested={requested}")]
    QuotaExceeded {
        limit: i32,
        existing: i64,
        requested: i32,
    },

    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("Database error: {0}")]
    Database(String),

    #[error("Storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl UploadError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        UploadError::InvalidArgument(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            UploadError::InvalidArgument(_) => ErrorKind::Validation,
            UploadError::Forbidden { .. } => ErrorKind::Authorization,
            UploadError::Expired { .. } => ErrorKind::Temporal,
            UploadError::NoFiles { .. }
            | UploadError::FileMissing { .. }
            | UploadError::QuotaExceeded { .. } => ErrorKind::State,
            UploadError::SessionNotFound { .. } => ErrorKind::Lookup,
            UploadError::Database(_) | UploadError::Storage(_) => ErrorKind::Downstream,
        }
    }
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for UploadError {
    fn from(err: SqlxError) -> Self {
        UploadError::Database(err)
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, log_level).
fn upload_error_static_metadata(err: &UploadError) -> (u16, &'static str, bool, LogLevel) {
    match err {
        UploadError::InvalidArgument(_) => (400, "INVALID_ARGUMENT", false, LogLevel::Debug),
        UploadError::SessionNotFound { .. } => (404, "SESSION_NOT_FOUND", false, LogLevel::Debug),
        UploadError::Forbidden { .. } => (403, "FORBIDDEN", false, LogLevel::Warn),
        UploadError::Expired { .. } => (410, "SESSION_EXPIRED", false, LogLevel::Debug),
        UploadError::NoFiles { .. } => (409, "NO_FILES", false, LogLevel::Debug),
        UploadError::FileMissing { .. } => (409, "FILE_MISSING", false, LogLevel::Warn),
        UploadError::QuotaExceeded { .. } => (409, "QUOTA_EXCEEDED", false, LogLevel::Debug),
        UploadError::Database(_) => (500, "DATABASE_ERROR", true, LogLevel::Error),
        UploadError::Storage(_) => (502, "STORAGE_ERROR", true, LogLevel::Error),
    }
}

impl ErrorMetadata for UploadError {
    fn http_status_code(&self) -> u16 {
        upload_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        upload_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        upload_error_static_metadata(self).2
    }

    fn client_message(&self) -> String {
        match self {
            // Downstream details can leak infrastructure names
            UploadError::Database(_) => "A database error occurred".to_string(),
            UploadError::Storage(_) => "An object storage error occurred".to_string(),
            other => other.to_string(),
        }
    }

    fn log_level(&self) -> LogLevel {
        upload_error_static_metadata(self).3
    }
}
