use chrono::Utc;
use stagehand_core::keys::staging_key;
use stagehand_core::models::{CreateFileIntentsInput, FileIntent, NewUploadFile, UploadFile};
use stagehand_core::{UploadError, UploadResult};
use uuid::Uuid;

use super::UploadService;

impl UploadService {
    /// Register `files_count` pending files on a session and presign a PUT URL for each.
    ///
    /// File rows are inserted in a single ledger transaction. Presigning happens
    /// after commit: if it fails the call errors out, and the rows already
    /// committed stay behind until the session is cancelled or reaped.
    #[tracing::instrument(
        skip(self, input),
        fields(
            session_id = %input.session_id,
            owner_id = %input.owner_id,
            files_count = input.files_count
        )
    )]
    pub async fn create_file_intents(
        &self,
        input: CreateFileIntentsInput,
    ) -> UploadResult<Vec<FileIntent>> {
        if input.files_count <= 0 {
            return Err(UploadError::invalid_argument("files_count must be > 0"));
        }
        if input.content_type.trim().is_empty() {
            return Err(UploadError::invalid_argument("content_type is required"));
        }

        let session = self
            .load_owned_session(input.session_id, input.owner_id)
            .await?;

        let now = Utc::now();
        if session.is_expired_at(now) {
            return Err(UploadError::Expired {
                session_id: session.id,
                expired_at: session.expires_at,
            });
        }

        let existing = self.ledger.count_files_by_session(session.id).await?;
        if existing + i64::from(input.files_count) > i64::from(session.max_files) {
            return Err(UploadError::QuotaExceeded {
                limit: session.max_files,
                existing,
                requested: input.files_count,
            });
        }

        // Checked before any row is written so an unusable TTL leaves nothing behind
        let url_expires_at = chrono::Duration::from_std(self.config.put_url_ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| UploadError::invalid_argument("presign PUT ttl is out of range"))?;

        let mut tx = self.ledger.begin().await?;
        let mut files: Vec<UploadFile> = Vec::with_capacity(input.files_count as usize);

        for _ in 0..input.files_count {
            let file_id = Uuid::new_v4();
            let object_key = staging_key(
                &input.key_prefix,
                &session.purpose,
                session.owner_id,
                session.id,
                file_id,
            );

            let inserted = tx
                .create_file(NewUploadFile {
                    id: file_id,
                    session_id: session.id,
                    object_key,
                })
                .await;

            match inserted {
                Ok(file) => files.push(file),
                Err(e) => {
                    if let Err(rollback_err) = tx.rollback().await {
                        tracing::error!(error = %rollback_err, "Failed to roll back file intents");
                    }
                    return Err(e);
                }
            }
        }

        tx.commit().await?;

        let mut intents = Vec::with_capacity(files.len());
        for file in files.iter() {
            let put_url = self
                .storage
                .presigned_put_url(&file.object_key, &input.content_type, self.config.put_url_ttl)
                .await
                .map_err(|e| {
                    tracing::warn!(
                        error = %e,
                        file_id = %file.id,
                        orphaned_files = files.len(),
                        "Presign failed after file intents were committed"
                    );
                    e
                })?;

            intents.push(FileIntent {
                file_id: file.id,
                object_key: file.object_key.clone(),
                put_url,
                url_expires_at,
            });
        }

        tracing::info!(
            session_id = %session.id,
            created = intents.len(),
            total_files = existing + intents.len() as i64,
            "File intents created"
        );

        Ok(intents)
    }
}
