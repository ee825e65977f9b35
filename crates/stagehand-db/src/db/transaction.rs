//! Database transaction utilities
//!
//! `PgLedgerTransaction` wraps a sqlx transaction so that the upload core can
//! insert several file rows atomically without knowing about PostgreSQL.

use async_trait::async_trait;
use sqlx::{Postgres, Transaction};
use stagehand_core::models::{NewUploadFile, UploadFile};
use stagehand_core::UploadResult;

use crate::db::ledger::LedgerTransaction;

/// A PostgreSQL transaction that is committed or rolled back explicitly
///
/// If it is dropped while still open, sqlx rolls it back when the connection
/// returns to the pool.
pub struct PgLedgerTransaction {
    transaction: Option<Transaction<'static, Postgres>>,
}

impl PgLedgerTransaction {
    pub(crate) fn new(transaction: Transaction<'static, Postgres>) -> Self {
        Self {
            transaction: Some(transaction),
        }
    }

    fn open(&mut self) -> UploadResult<&mut Transaction<'static, Postgres>> {
        self.transaction
            .as_mut()
            .ok_or_else(|| sqlx::Error::Protocol("ledger transaction already finished".into()))
            .map_err(Into::into)
    }
}

#[async_trait]
impl LedgerTransaction for PgLedgerTransaction {
    async fn create_file(&mut self, file: NewUploadFile) -> UploadResult<UploadFile> {
        let tx = self.open()?;

        let row = sqlx::query_as::<_, UploadFile>(
            r#"
            INSERT INTO upload_files (id, session_id, object_key)
            VALUES ($1, $2, $3)
            RETURNING id, session_id, object_key, created_at
            "#,
        )
        .bind(file.id)
        .bind(file.session_id)
        .bind(file.object_key)
        .fetch_one(&mut **tx)
        .await?;

        Ok(row)
    }

    async fn commit(self: Box<Self>) -> UploadResult<()> {
        let mut this = self;
        if let Some(tx) = this.transaction.take() {
            tx.commit().await?;
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> UploadResult<()> {
        let mut this = self;
        if let Some(tx) = this.transaction.take() {
            tx.rollback().await?;
        }
        Ok(())
    }
}

impl Drop for PgLedgerTransaction {
    fn drop(&mut self) {
        if self.transaction.is_some() {
            tracing::warn!(
                "Ledger transaction was dropped without explicit commit or rollback - rolling back"
            );
        }
    }
}
