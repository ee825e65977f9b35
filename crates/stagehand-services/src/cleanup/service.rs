use chrono::Utc;
use stagehand_core::models::UploadSession;
use stagehand_core::UploadResult;
use stagehand_db::UploadLedger;
use stagehand_storage::ObjectStorage;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;

/// Outcome of one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReapReport {
    pub sessions_reaped: usize,
    pub objects_deleted: usize,
    /// Sessions whose row or staged objects could not be fully removed
    pub failures: usize,
}

/// Retires sessions that expired without being accepted or cancelled.
///
/// Each expired session is handled like a cancellation: row first, then its
/// staged objects. Unlike cancellation, a failure is logged and the sweep moves
/// on to the next session.
#[derive(Clone)]
pub struct SessionReaper {
    ledger: Arc<dyn UploadLedger>,
    storage: Arc<dyn ObjectStorage>,
    batch_size: i64,
}

impl SessionReaper {
    pub fn new(
        ledger: Arc<dyn UploadLedger>,
        storage: Arc<dyn ObjectStorage>,
        batch_size: i64,
    ) -> Self {
        Self {
            ledger,
            storage,
            batch_size: batch_size.max(1),
        }
    }

    /// Start the background sweep on a fixed interval
    /// Returns a JoinHandle for graceful shutdown
    pub fn start(self: Arc<Self>, every: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut reap_interval = interval(every);

            loop {
                reap_interval.tick().await;

                tracing::info!("Starting scheduled sweep of expired upload sessions");

                match self.reap_once().await {
                    Ok(report) => tracing::info!(
                        sessions = report.sessions_reaped,
                        objects = report.objects_deleted,
                        failures = report.failures,
                        "Expired session sweep completed"
                    ),
                    Err(e) => tracing::error!(error = %e, "Expired session sweep failed"),
                }
            }
        })
    }

    /// Sweep every session that is expired right now.
    ///
    /// Only listing errors abort the sweep. Sessions that could not be removed
    /// are paged past and retried on the next sweep.
    #[tracing::instrument(skip(self), fields(cleanup.operation = "reap_expired_sessions"))]
    pub async fn reap_once(&self) -> UploadResult<ReapReport> {
        let now = Utc::now();
        let mut report = ReapReport::default();
        // Keyset position of the last session handled, removed or not
        let mut cursor = None;

        loop {
            let batch = self
                .ledger
                .list_expired_sessions(now, cursor, self.batch_size)
                .await?;
            let batch_len = batch.len();

            for session in &batch {
                self.reap_session(session, &mut report).await;
            }

            match batch.last() {
                Some(last) if (batch_len as i64) >= self.batch_size => {
                    cursor = Some((last.expires_at, last.id));
                }
                _ => break,
            }
        }

        Ok(report)
    }

    async fn reap_session(&self, session: &UploadSession, report: &mut ReapReport) {
        let files = match self.ledger.list_files_by_session(session.id).await {
            Ok(files) => files,
            Err(e) => {
                tracing::error!(error = %e, session_id = %session.id, "Failed to list files of expired session");
                report.failures += 1;
                return;
            }
        };

        match self.ledger.delete_session(session.id).await {
            Ok(true) => report.sessions_reaped += 1,
            // Accepted or cancelled concurrently; its objects are someone else's now
            Ok(false) => return,
            Err(e) => {
                tracing::error!(error = %e, session_id = %session.id, "Failed to delete expired session");
                report.failures += 1;
                return;
            }
        }

        for file in &files {
            match self.storage.delete(&file.object_key).await {
                Ok(()) => report.objects_deleted += 1,
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        session_id = %session.id,
                        storage_key = %file.object_key,
                        "Failed to delete staged object of expired session"
                    );
                    report.failures += 1;
                    return;
                }
            }
        }

        tracing::debug!(
            session_id = %session.id,
            expires_at = %session.expires_at,
            files = files.len(),
            "Expired upload session reaped"
        );
    }
}
