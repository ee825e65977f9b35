//! Object store gateway trait
//!
//! This module defines the `ObjectStorage` trait that all storage backends implement.
//! The upload core only needs presigning, HEAD, server-side copy and delete; byte
//! transfer happens between the client and the store directly.

use crate::StorageBackend;
use async_trait::async_trait;
use stagehand_core::models::ObjectHead;
use stagehand_core::UploadError;
use std::time::Duration;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Presign failed: {0}")]
    PresignFailed(String),

    #[error("Copy failed: {0}")]
    CopyFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for UploadError {
    fn from(err: StorageError) -> Self {
        UploadError::Storage(Box::new(err))
    }
}

/// Object store gateway
///
/// Implementations must be safe to share across tasks; the service holds them as
/// `Arc<dyn ObjectStorage>`.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Generate a presigned PUT URL a client can upload `storage_key` with.
    ///
    /// `content_type` is the type the client is expected to send. Backends that
    /// cannot bind it into the signature treat it as advisory.
    async fn presigned_put_url(
        &self,
        storage_key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> StorageResult<String>;

    /// Generate a presigned GET URL for direct download
    async fn presigned_get_url(
        &self,
        storage_key: &str,
        expires_in: Duration,
    ) -> StorageResult<String>;

    /// Fetch object metadata. Returns `StorageError::NotFound` when absent.
    async fn head(&self, storage_key: &str) -> StorageResult<ObjectHead>;

    /// Server-side copy of `from_key` to `to_key`
    async fn copy(&self, from_key: &str, to_key: &str) -> StorageResult<()>;

    /// Delete an object. Deleting an absent object succeeds.
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
