//! Stagehand Core Library
//!
//! This crate provides the domain models, error types, configuration and object key
//! derivation shared across all Stagehand components.

pub mod config;
pub mod error;
pub mod keys;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::Config;
pub use error::{ErrorKind, ErrorMetadata, LogLevel, UploadError, UploadResult};
pub use keys::{final_key, staging_key};
pub use storage_types::StorageBackend;
// Note: ObjectStorage and StorageError live in stagehand-storage,
// the ledger traits in stagehand-db.
