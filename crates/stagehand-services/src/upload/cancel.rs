use stagehand_core::models::CancelSessionInput;
use stagehand_core::UploadResult;

use super::UploadService;

impl UploadService {
    /// Drop a session and its staged objects without finalizing anything.
    ///
    /// Allowed at any time, expired or not. The session row goes first; staged
    /// objects are then deleted in ledger order and the first storage failure
    /// stops the loop, leaving the remaining objects in place.
    #[tracing::instrument(
        skip(self, input),
        fields(session_id = %input.session_id, owner_id = %input.owner_id)
    )]
    pub async fn cancel_session(&self, input: CancelSessionInput) -> UploadResult<()> {
        let session = self
            .load_owned_session(input.session_id, input.owner_id)
            .await?;

        let files = self.ledger.list_files_by_session(session.id).await?;

        self.retire_session(session.id).await?;

        for (deleted, file) in files.iter().enumerate() {
            if let Err(e) = self.storage.delete(&file.object_key).await {
                tracing::error!(
                    error = %e,
                    session_id = %session.id,
                    file_id = %file.id,
                    deleted,
                    left_staged = files.len() - deleted,
                    "Staged object cleanup aborted after the session was retired"
                );
                return Err(e.into());
            }
        }

        tracing::info!(
            session_id = %session.id,
            files = files.len(),
            "Upload session cancelled"
        );

        Ok(())
    }
}
