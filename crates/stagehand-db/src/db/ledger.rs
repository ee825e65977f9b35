//! Relational ledger abstraction
//!
//! The upload core talks to the ledger only through these traits, so it can be
//! run against PostgreSQL in production and an in-memory double in tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use stagehand_core::models::{NewUploadFile, NewUploadSession, UploadFile, UploadSession};
use stagehand_core::UploadResult;
use uuid::Uuid;

/// Transactional CRUD over upload sessions and their files
#[async_trait]
pub trait UploadLedger: Send + Sync {
    async fn create_session(&self, session: NewUploadSession) -> UploadResult<UploadSession>;

    async fn get_session(&self, session_id: Uuid) -> UploadResult<Option<UploadSession>>;

    async fn count_files_by_session(&self, session_id: Uuid) -> UploadResult<i64>;

    /// Files of a session, oldest first (ties broken by id)
    async fn list_files_by_session(&self, session_id: Uuid) -> UploadResult<Vec<UploadFile>>;

    /// Delete a session and, by cascade, its files.
    ///
    /// Returns `false` when no row was removed, e.g. because a concurrent
    /// accept or cancel got there first.
    async fn delete_session(&self, session_id: Uuid) -> UploadResult<bool>;

    /// Sessions that expired strictly before `now`, ordered by `(expires_at, id)`.
    ///
    /// With `after` set, only sessions strictly past that `(expires_at, id)`
    /// position are returned, so callers can page past rows they failed to remove.
    async fn list_expired_sessions(
        &self,
        now: DateTime<Utc>,
        after: Option<(DateTime<Utc>, Uuid)>,
        limit: i64,
    ) -> UploadResult<Vec<UploadSession>>;

    /// Start a transaction for multi-row writes
    async fn begin(&self) -> UploadResult<Box<dyn LedgerTransaction>>;
}

/// Writes that commit or roll back together
///
/// Dropping a transaction without calling `commit` discards its writes.
#[async_trait]
pub trait LedgerTransaction: Send {
    async fn create_file(&mut self, file: NewUploadFile) -> UploadResult<UploadFile>;

    async fn commit(self: Box<Self>) -> UploadResult<()>;

    async fn rollback(self: Box<Self>) -> UploadResult<()>;
}
