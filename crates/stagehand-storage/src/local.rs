use crate::keys::validate_key;
use crate::traits::{ObjectStorage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use stagehand_core::models::ObjectHead;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

/// Local filesystem storage implementation
///
/// Meant for development. Presigned URLs point at `base_url` and carry the
/// expiry as a query parameter; whatever serves `base_url` is expected to
/// honour it.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for objects (e.g., "/var/lib/stagehand/objects")
    /// * `base_url` - Base URL the objects are served from (e.g., "http://localhost:4000/objects")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url,
        })
    }

    /// Root directory objects are written under
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        validate_key(storage_key)?;
        Ok(self.base_path.join(storage_key))
    }

    fn signed_url(
        &self,
        storage_key: &str,
        expires_in: Duration,
        extra: Option<String>,
    ) -> StorageResult<String> {
        let expires_at = chrono::Duration::from_std(expires_in)
            .ok()
            .and_then(|ttl| Utc::now().checked_add_signed(ttl))
            .ok_or_else(|| {
                StorageError::PresignFailed(format!(
                    "expiry of {}s is out of range",
                    expires_in.as_secs()
                ))
            })?;

        let path = storage_key
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");

        let mut url = format!(
            "{}/{}?expires={}",
            self.base_url.trim_end_matches('/'),
            path,
            expires_at.timestamp()
        );
        if let Some(extra) = extra {
            url.push('&');
            url.push_str(&extra);
        }
        Ok(url)
    }

    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStorage for LocalStorage {
    async fn presigned_put_url(
        &self,
        storage_key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        self.key_to_path(storage_key)?;
        let content_type = format!("content_type={}", urlencoding::encode(content_type));
        self.signed_url(storage_key, expires_in, Some(content_type))
    }

    async fn presigned_get_url(
        &self,
        storage_key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        self.key_to_path(storage_key)?;
        self.signed_url(storage_key, expires_in, None)
    }

    async fn head(&self, storage_key: &str) -> StorageResult<ObjectHead> {
        let path = self.key_to_path(storage_key)?;

        let meta = match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => meta,
            Ok(_) => return Err(StorageError::NotFound(storage_key.to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StorageError::NotFound(storage_key.to_string()))
            }
            Err(e) => return Err(StorageError::IoError(e)),
        };

        let last_modified = meta.modified().ok().map(DateTime::<Utc>::from);

        Ok(ObjectHead {
            size: meta.len(),
            content_type: None,
            etag: None,
            last_modified,
        })
    }

    async fn copy(&self, from_key: &str, to_key: &str) -> StorageResult<()> {
        let from_path = self.key_to_path(from_key)?;
        let to_path = self.key_to_path(to_key)?;

        if !fs::try_exists(&from_path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(from_key.to_string()));
        }

        self.ensure_parent_dir(&to_path).await?;

        fs::copy(&from_path, &to_path).await.map_err(|e| {
            StorageError::CopyFailed(format!(
                "Failed to copy {} to {}: {}",
                from_path.display(),
                to_path.display(),
                e
            ))
        })?;

        tracing::info!(
            from_key = %from_key,
            to_key = %to_key,
            "Local storage copy successful"
        );

        Ok(())
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        let path = self.key_to_path(storage_key)?;
        let start = std::time::Instant::now();

        match fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => {
                return Err(StorageError::DeleteFailed(format!(
                    "Failed to delete file {}: {}",
                    path.display(),
                    e
                )))
            }
        }

        tracing::info!(
            path = %path.display(),
            key = %storage_key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage delete successful"
        );

        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn storage() -> (LocalStorage, TempDir) {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path(), "http://localhost:4000/objects/".to_string())
            .await
            .unwrap();
        (storage, dir)
    }

    async fn write(storage: &LocalStorage, key: &str, data: &[u8]) {
        let path = storage.base_path().join(key);
        fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        fs::write(path, data).await.unwrap();
    }

    #[tokio::test]
    async fn head_reports_size_and_missing_objects() {
        let (storage, _dir) = storage().await;
        write(&storage, "staging/a/b", b"hello").await;

        let head = storage.head("staging/a/b").await.unwrap();
        assert_eq!(head.size, 5);
        assert!(head.last_modified.is_some());

        assert!(matches!(
            storage.head("staging/a/missing").await,
            Err(StorageError::NotFound(_))
        ));
        // A directory is not an object
        assert!(matches!(
            storage.head("staging/a").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn copy_then_delete_moves_object() {
        let (storage, _dir) = storage().await;
        write(&storage, "staging/f", b"bytes").await;

        storage.copy("staging/f", "final/deep/f").await.unwrap();
        storage.delete("staging/f").await.unwrap();

        assert!(matches!(
            storage.head("staging/f").await,
            Err(StorageError::NotFound(_))
        ));
        assert_eq!(storage.head("final/deep/f").await.unwrap().size, 5);
    }

    #[tokio::test]
    async fn copy_of_missing_source_is_not_found() {
        let (storage, _dir) = storage().await;
        assert!(matches!(
            storage.copy("nope", "final/nope").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_of_missing_object_succeeds() {
        let (storage, _dir) = storage().await;
        storage.delete("never/written").await.unwrap();
    }

    #[tokio::test]
    async fn presigned_urls_carry_expiry_and_content_type() {
        let (storage, _dir) = storage().await;

        let put = storage
            .presigned_put_url("up/x", "image/png", Duration::from_secs(60))
            .await
            .unwrap();
        assert!(put.starts_with("http://localhost:4000/objects/up/x?expires="));
        assert!(put.ends_with("&content_type=image%2Fpng"));

        let get = storage
            .presigned_get_url("up/x", Duration::from_secs(60))
            .await
            .unwrap();
        assert!(get.starts_with("http://localhost:4000/objects/up/x?expires="));
        assert!(!get.contains("content_type"));
    }

    #[tokio::test]
    async fn traversal_keys_are_rejected() {
        let (storage, _dir) = storage().await;
        assert!(matches!(
            storage.head("../outside").await,
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(
            storage.delete("/abs").await,
            Err(StorageError::InvalidKey(_))
        ));
    }

    #[tokio::test]
    async fn presigned_urls_encode_each_key_segment() {
        let (storage, _dir) = storage().await;

        let get = storage
            .presigned_get_url("up/profile pic?/x#1", Duration::from_secs(60))
            .await
            .unwrap();
        assert!(get.starts_with("http://localhost:4000/objects/up/profile%20pic%3F/x%231?expires="));
        assert_eq!(get.matches('?').count(), 1);
    }

    #[tokio::test]
    async fn out_of_range_expiry_is_an_error() {
        let (storage, _dir) = storage().await;

        let err = storage
            .presigned_put_url("up/x", "image/png", Duration::from_secs(u64::MAX))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::PresignFailed(_)));

        let err = storage
            .presigned_get_url("up/x", Duration::from_secs(1_000_000_000_000_000))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::PresignFailed(_)));
    }
}
