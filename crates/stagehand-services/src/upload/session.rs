use chrono::{Duration, Utc};
use stagehand_core::models::{CreateSessionInput, NewUploadSession, PresignGetInput};
use stagehand_core::{UploadError, UploadResult};
use uuid::Uuid;

use super::UploadService;

impl UploadService {
    /// Open a new upload session for `owner_id`.
    ///
    /// The session expires `ttl` after creation and accepts at most `max_files`
    /// intents. Nothing is written to the object store.
    #[tracing::instrument(
        skip(self, input),
        fields(owner_id = %input.owner_id, purpose = %input.purpose, max_files = input.max_files)
    )]
    pub async fn create_session(&self, input: CreateSessionInput) -> UploadResult<Uuid> {
        if input.max_files <= 0 {
            return Err(UploadError::invalid_argument("max_files must be > 0"));
        }
        if input.ttl <= Duration::zero() {
            return Err(UploadError::invalid_argument("ttl must be > 0"));
        }
        if input.purpose.trim().is_empty() {
            return Err(UploadError::invalid_argument("purpose is required"));
        }

        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(input.ttl)
            .ok_or_else(|| UploadError::invalid_argument("ttl is out of range"))?;

        let session = self
            .ledger
            .create_session(NewUploadSession {
                id: Uuid::new_v4(),
                owner_id: input.owner_id,
                purpose: input.purpose,
                expires_at,
                max_files: input.max_files,
                created_at: now,
            })
            .await?;

        tracing::info!(
            session_id = %session.id,
            expires_at = %session.expires_at,
            "Upload session created"
        );

        Ok(session.id)
    }

    /// Presigned GET URL for an arbitrary object key, typically a final key
    /// from an acceptance manifest.
    #[tracing::instrument(skip(self, input), fields(object_key = %input.object_key))]
    pub async fn presign_get(&self, input: PresignGetInput) -> UploadResult<String> {
        if input.object_key.trim().is_empty() {
            return Err(UploadError::invalid_argument("object_key is required"));
        }

        let url = self
            .storage
            .presigned_get_url(&input.object_key, self.config.get_url_ttl)
            .await?;

        Ok(url)
    }
}
