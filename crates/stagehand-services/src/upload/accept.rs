use chrono::Utc;
use stagehand_core::keys::final_key;
use stagehand_core::models::{AcceptSessionInput, AcceptedFile, UploadFile, UploadSession};
use stagehand_core::{UploadError, UploadResult};
use stagehand_storage::StorageError;

use super::UploadService;

impl UploadService {
    /// Finalize a session: verify each staged object, copy it to its final key
    /// and delete the staged copy.
    ///
    /// The session row is deleted before any storage call. From then on the
    /// session cannot be accepted, cancelled or extended again, even if a later
    /// file fails. Files are processed one at a time in ledger order and the
    /// first failure aborts the rest; files relocated before it stay relocated
    /// and the ones after it stay staged.
    #[tracing::instrument(
        skip(self, input),
        fields(
            session_id = %input.session_id,
            owner_id = %input.owner_id,
            final_prefix = %input.final_prefix
        )
    )]
    pub async fn accept_session(
        &self,
        input: AcceptSessionInput,
    ) -> UploadResult<Vec<AcceptedFile>> {
        if input.final_prefix.trim().is_empty() {
            return Err(UploadError::invalid_argument("final_prefix is required"));
        }

        let session = self
            .load_owned_session(input.session_id, input.owner_id)
            .await?;

        if session.is_expired_at(Utc::now()) {
            return Err(UploadError::Expired {
                session_id: session.id,
                expired_at: session.expires_at,
            });
        }

        let files = self.ledger.list_files_by_session(session.id).await?;
        if files.is_empty() {
            return Err(UploadError::NoFiles {
                session_id: session.id,
            });
        }

        // Point of no return
        self.retire_session(session.id).await?;

        let mut accepted = Vec::with_capacity(files.len());
        for file in &files {
            match self.relocate(&session, file, &input.final_prefix).await {
                Ok(entry) => accepted.push(entry),
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        session_id = %session.id,
                        file_id = %file.id,
                        relocated = accepted.len(),
                        left_staged = files.len() - accepted.len(),
                        "Session acceptance aborted after the session was retired"
                    );
                    return Err(e);
                }
            }
        }

        tracing::info!(
            session_id = %session.id,
            files = accepted.len(),
            "Upload session accepted"
        );

        Ok(accepted)
    }

    async fn relocate(
        &self,
        session: &UploadSession,
        file: &UploadFile,
        final_prefix: &str,
    ) -> UploadResult<AcceptedFile> {
        let head = self
            .storage
            .head(&file.object_key)
            .await
            .map_err(|e| match e {
                StorageError::NotFound(_) => UploadError::FileMissing {
                    file_id: file.id,
                    key: file.object_key.clone(),
                },
                other => other.into(),
            })?;

        let final_key = final_key(final_prefix, &session.purpose, session.owner_id, file.id);

        self.storage.copy(&file.object_key, &final_key).await?;
        self.storage.delete(&file.object_key).await?;

        tracing::debug!(
            file_id = %file.id,
            staging_key = %file.object_key,
            final_key = %final_key,
            size = head.size,
            "Staged file relocated"
        );

        Ok(AcceptedFile {
            file_id: file.id,
            staging_key: file.object_key.clone(),
            final_key,
            head,
        })
    }
}
