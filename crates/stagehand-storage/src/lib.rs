//! Stagehand Storage Library
//!
//! This crate provides the object store gateway used by the upload core: the
//! `ObjectStorage` trait and its S3-compatible and local filesystem backends.
//!
//! # Key rules
//!
//! Keys must not contain `..` or start with `/`. Every backend validates keys
//! through the `keys` module before touching the store. Key layout itself is
//! derived in `stagehand_core::keys`.

pub mod factory;
pub(crate) mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use stagehand_core::models::ObjectHead;
pub use stagehand_core::StorageBackend;
pub use traits::{ObjectStorage, StorageError, StorageResult};
