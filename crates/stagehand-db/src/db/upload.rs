use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use stagehand_core::models::{NewUploadSession, UploadFile, UploadSession};
use stagehand_core::UploadResult;
use uuid::Uuid;

use crate::db::ledger::{LedgerTransaction, UploadLedger};
use crate::db::transaction::PgLedgerTransaction;

/// PostgreSQL-backed upload ledger
#[derive(Clone)]
pub struct PgUploadLedger {
    pool: PgPool,
}

impl PgUploadLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UploadLedger for PgUploadLedger {
    async fn create_session(&self, session: NewUploadSession) -> UploadResult<UploadSession> {
        let row = sqlx::query_as::<_, UploadSession>(
            r#"
            INSERT INTO upload_sessions (id, owner_id, purpose, expires_at, max_files, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, owner_id, purpose, expires_at, max_files, created_at
            "#,
        )
        .bind(session.id)
        .bind(session.owner_id)
        .bind(session.purpose)
        .bind(session.expires_at)
        .bind(session.max_files)
        .bind(session.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn get_session(&self, session_id: Uuid) -> UploadResult<Option<UploadSession>> {
        let row = sqlx::query_as::<_, UploadSession>(
            r#"
            SELECT id, owner_id, purpose, expires_at, max_files, created_at
            FROM upload_sessions
            WHERE id = $1
            "#,
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn count_files_by_session(&self, session_id: Uuid) -> UploadResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM upload_files WHERE session_id = $1
            "#,
        )
        .bind(session_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn list_files_by_session(&self, session_id: Uuid) -> UploadResult<Vec<UploadFile>> {
        let rows = sqlx::query_as::<_, UploadFile>(
            r#"
            SELECT id, session_id, object_key, created_at
            FROM upload_files
            WHERE session_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn delete_session(&self, session_id: Uuid) -> UploadResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM upload_sessions WHERE id = $1
            "#,
        )
        .bind(session_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_expired_sessions(
        &self,
        now: DateTime<Utc>,
        after: Option<(DateTime<Utc>, Uuid)>,
        limit: i64,
    ) -> UploadResult<Vec<UploadSession>> {
        let (after_expires_at, after_id) = after.unzip();

        let rows = sqlx::query_as::<_, UploadSession>(
            r#"
            SELECT id, owner_id, purpose, expires_at, max_files, created_at
            FROM upload_sessions
            WHERE expires_at < $1
              AND ($2::timestamptz IS NULL OR (expires_at, id) > ($2::timestamptz, $3::uuid))
            ORDER BY expires_at, id
            LIMIT $4
            "#,
        )
        .bind(now)
        .bind(after_expires_at)
        .bind(after_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn begin(&self) -> UploadResult<Box<dyn LedgerTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgLedgerTransaction::new(tx)))
    }
}
