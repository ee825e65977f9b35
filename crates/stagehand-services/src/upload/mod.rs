//! Upload session orchestration
//!
//! One `UploadService` method per protocol step, each in its own module:
//! `session` (create, presign GET), `intents`, `accept` and `cancel`.

mod accept;
mod cancel;
mod intents;
mod session;

use stagehand_core::models::UploadSession;
use stagehand_core::{Config, UploadError, UploadResult};
use stagehand_db::UploadLedger;
use stagehand_storage::ObjectStorage;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

const DEFAULT_URL_TTL: Duration = Duration::from_secs(15 * 60);

/// Lifetimes of the presigned URLs handed to clients
#[derive(Debug, Clone, Copy)]
pub struct UploadServiceConfig {
    pub put_url_ttl: Duration,
    pub get_url_ttl: Duration,
}

impl Default for UploadServiceConfig {
    fn default() -> Self {
        Self {
            put_url_ttl: DEFAULT_URL_TTL,
            get_url_ttl: DEFAULT_URL_TTL,
        }
    }
}

impl From<&Config> for UploadServiceConfig {
    fn from(config: &Config) -> Self {
        Self {
            put_url_ttl: config.presign_put_ttl(),
            get_url_ttl: config.presign_get_ttl(),
        }
    }
}

#[derive(Clone)]
pub struct UploadService {
    ledger: Arc<dyn UploadLedger>,
    storage: Arc<dyn ObjectStorage>,
    config: UploadServiceConfig,
}

impl UploadService {
    pub fn new(
        ledger: Arc<dyn UploadLedger>,
        storage: Arc<dyn ObjectStorage>,
        config: UploadServiceConfig,
    ) -> Self {
        Self {
            ledger,
            storage,
            config,
        }
    }

    pub fn config(&self) -> &UploadServiceConfig {
        &self.config
    }

    /// Load a session and check that `owner_id` owns it. Expiry is not checked here.
    async fn load_owned_session(
        &self,
        session_id: Uuid,
        owner_id: Uuid,
    ) -> UploadResult<UploadSession> {
        let session = self
            .ledger
            .get_session(session_id)
            .await?
            .ok_or(UploadError::SessionNotFound { session_id })?;

        if !session.is_owned_by(owner_id) {
            tracing::warn!(
                session_id = %session_id,
                owner_id = %owner_id,
                "Upload session accessed by a non-owner"
            );
            return Err(UploadError::Forbidden { session_id });
        }

        Ok(session)
    }

    /// Delete the session row; losing a race against another accept/cancel reads as not found.
    async fn retire_session(&self, session_id: Uuid) -> UploadResult<()> {
        if self.ledger.delete_session(session_id).await? {
            Ok(())
        } else {
            Err(UploadError::SessionNotFound { session_id })
        }
    }
}
