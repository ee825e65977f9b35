#![allow(dead_code)]

//! In-memory ledger and object store used by the service tests.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use stagehand_core::models::{NewUploadFile, NewUploadSession, ObjectHead, UploadFile, UploadSession};
use stagehand_core::{UploadError, UploadResult};
use stagehand_db::{LedgerTransaction, UploadLedger};
use stagehand_services::{UploadService, UploadServiceConfig};
use stagehand_storage::{ObjectStorage, StorageBackend, StorageError, StorageResult};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

#[derive(Default)]
struct LedgerState {
    sessions: BTreeMap<Uuid, UploadSession>,
    // Insertion order is listing order
    files: Vec<UploadFile>,
    fail_file_insert_at: Option<usize>,
    inserts_seen: usize,
    fail_list_files_for: Vec<Uuid>,
}

#[derive(Clone, Default)]
pub struct MemoryLedger {
    state: Arc<Mutex<LedgerState>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a session row directly, bypassing validation.
    pub fn insert_session(&self, session: UploadSession) {
        self.state
            .lock()
            .unwrap()
            .sessions
            .insert(session.id, session);
    }

    pub fn session(&self, id: Uuid) -> Option<UploadSession> {
        self.state.lock().unwrap().sessions.get(&id).cloned()
    }

    pub fn files_of(&self, session_id: Uuid) -> Vec<UploadFile> {
        self.state
            .lock()
            .unwrap()
            .files
            .iter()
            .filter(|f| f.session_id == session_id)
            .cloned()
            .collect()
    }

    /// Make every file listing of `session_id` fail.
    pub fn fail_list_files_for(&self, session_id: Uuid) {
        self.state
            .lock()
            .unwrap()
            .fail_list_files_for
            .push(session_id);
    }

    /// Make the n-th (0-based) file insert from now on fail.
    pub fn fail_file_insert_at(&self, n: usize) {
        let mut state = self.state.lock().unwrap();
        state.inserts_seen = 0;
        state.fail_file_insert_at = Some(n);
    }
}

#[async_trait]
impl UploadLedger for MemoryLedger {
    async fn create_session(&self, session: NewUploadSession) -> UploadResult<UploadSession> {
        let session: UploadSession = session.into();
        self.insert_session(session.clone());
        Ok(session)
    }

    async fn get_session(&self, session_id: Uuid) -> UploadResult<Option<UploadSession>> {
        Ok(self.session(session_id))
    }

    async fn count_files_by_session(&self, session_id: Uuid) -> UploadResult<i64> {
        Ok(self.files_of(session_id).len() as i64)
    }

    async fn list_files_by_session(&self, session_id: Uuid) -> UploadResult<Vec<UploadFile>> {
        if self
            .state
            .lock()
            .unwrap()
            .fail_list_files_for
            .contains(&session_id)
        {
            return Err(UploadError::Database(sqlx_error("injected listing failure")));
        }
        Ok(self.files_of(session_id))
    }

    async fn delete_session(&self, session_id: Uuid) -> UploadResult<bool> {
        let mut state = self.state.lock().unwrap();
        let removed = state.sessions.remove(&session_id).is_some();
        if removed {
            state.files.retain(|f| f.session_id != session_id);
        }
        Ok(removed)
    }

    async fn list_expired_sessions(
        &self,
        now: DateTime<Utc>,
        after: Option<(DateTime<Utc>, Uuid)>,
        limit: i64,
    ) -> UploadResult<Vec<UploadSession>> {
        let state = self.state.lock().unwrap();
        let mut expired: Vec<_> = state
            .sessions
            .values()
            .filter(|s| s.expires_at < now)
            .filter(|s| after.map_or(true, |position| (s.expires_at, s.id) > position))
            .cloned()
            .collect();
        expired.sort_by_key(|s| (s.expires_at, s.id));
        expired.truncate(limit as usize);
        Ok(expired)
    }

    async fn begin(&self) -> UploadResult<Box<dyn LedgerTransaction>> {
        Ok(Box::new(MemoryTransaction {
            state: self.state.clone(),
            pending: Vec::new(),
        }))
    }
}

struct MemoryTransaction {
    state: Arc<Mutex<LedgerState>>,
    pending: Vec<UploadFile>,
}

#[async_trait]
impl LedgerTransaction for MemoryTransaction {
    async fn create_file(&mut self, file: NewUploadFile) -> UploadResult<UploadFile> {
        {
            let mut state = self.state.lock().unwrap();
            let seen = state.inserts_seen;
            state.inserts_seen += 1;
            if state.fail_file_insert_at == Some(seen) {
                return Err(UploadError::Database(sqlx_error("injected insert failure")));
            }
        }

        let row = UploadFile {
            id: file.id,
            session_id: file.session_id,
            object_key: file.object_key,
            created_at: Utc::now(),
        };
        self.pending.push(row.clone());
        Ok(row)
    }

    async fn commit(self: Box<Self>) -> UploadResult<()> {
        let this = *self;
        let mut state = this.state.lock().unwrap();
        state.files.extend(this.pending);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> UploadResult<()> {
        Ok(())
    }
}

fn sqlx_error(message: &str) -> sqlx::Error {
    sqlx::Error::Protocol(message.to_string())
}

// ---------------------------------------------------------------------------
// Object store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    PresignPut,
    PresignGet,
    Head,
    Copy,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub op: Op,
    pub key: String,
}

#[derive(Default)]
struct StoreState {
    objects: BTreeMap<String, Vec<u8>>,
    calls: Vec<Call>,
    failures: Vec<(Op, Option<String>)>,
}

#[derive(Clone, Default)]
pub struct MemoryStorage {
    state: Arc<Mutex<StoreState>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// What a client PUT to a presigned URL would do.
    pub fn put_object(&self, key: &str, data: &[u8]) {
        self.state
            .lock()
            .unwrap()
            .objects
            .insert(key.to_string(), data.to_vec());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.state.lock().unwrap().objects.contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.state.lock().unwrap().objects.keys().cloned().collect()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn calls_of(&self, op: Op) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.op == op)
            .map(|c| c.key)
            .collect()
    }

    /// Fail every `op` call on `key`, or on any key when `key` is None.
    pub fn fail(&self, op: Op, key: Option<&str>) {
        self.state
            .lock()
            .unwrap()
            .failures
            .push((op, key.map(String::from)));
    }

    fn record(&self, op: Op, key: &str) -> StorageResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call {
            op,
            key: key.to_string(),
        });
        let injected = state
            .failures
            .iter()
            .any(|(o, k)| *o == op && k.as_deref().map_or(true, |k| k == key));
        if injected {
            return Err(StorageError::BackendError(format!(
                "injected {:?} failure for {}",
                op, key
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn presigned_put_url(
        &self,
        storage_key: &str,
        content_type: &str,
        expires_in: std::time::Duration,
    ) -> StorageResult<String> {
        self.record(Op::PresignPut, storage_key)?;
        Ok(format!(
            "https://store.test/{}?method=PUT&content_type={}&expires_in={}",
            storage_key,
            content_type,
            expires_in.as_secs()
        ))
    }

    async fn presigned_get_url(
        &self,
        storage_key: &str,
        expires_in: std::time::Duration,
    ) -> StorageResult<String> {
        self.record(Op::PresignGet, storage_key)?;
        Ok(format!(
            "https://store.test/{}?method=GET&expires_in={}",
            storage_key,
            expires_in.as_secs()
        ))
    }

    async fn head(&self, storage_key: &str) -> StorageResult<ObjectHead> {
        self.record(Op::Head, storage_key)?;
        let state = self.state.lock().unwrap();
        let data = state
            .objects
            .get(storage_key)
            .ok_or_else(|| StorageError::NotFound(storage_key.to_string()))?;
        Ok(ObjectHead {
            size: data.len() as u64,
            content_type: Some("image/png".to_string()),
            etag: Some(format!("\"{:x}\"", data.len())),
            last_modified: Some(Utc::now()),
        })
    }

    async fn copy(&self, from_key: &str, to_key: &str) -> StorageResult<()> {
        self.record(Op::Copy, from_key)?;
        let mut state = self.state.lock().unwrap();
        let data = state
            .objects
            .get(from_key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(from_key.to_string()))?;
        state.objects.insert(to_key.to_string(), data);
        Ok(())
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        self.record(Op::Delete, storage_key)?;
        self.state.lock().unwrap().objects.remove(storage_key);
        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub struct TestContext {
    pub service: UploadService,
    pub ledger: MemoryLedger,
    pub storage: MemoryStorage,
}

pub fn setup() -> TestContext {
    setup_with(UploadServiceConfig::default())
}

pub fn setup_with(config: UploadServiceConfig) -> TestContext {
    let ledger = MemoryLedger::new();
    let storage = MemoryStorage::new();
    let service = UploadService::new(
        Arc::new(ledger.clone()),
        Arc::new(storage.clone()),
        config,
    );
    TestContext {
        service,
        ledger,
        storage,
    }
}

/// A session row with the given owner and expiry offset from now.
pub fn seeded_session(owner_id: Uuid, expires_in: Duration, max_files: i32) -> UploadSession {
    let now = Utc::now();
    UploadSession {
        id: Uuid::new_v4(),
        owner_id,
        purpose: "avatar".to_string(),
        expires_at: now + expires_in,
        max_files,
        created_at: now,
    }
}

/// Register `n` staged files on a seeded session through a ledger transaction.
pub async fn seed_files(ledger: &MemoryLedger, session: &UploadSession, n: usize) -> Vec<UploadFile> {
    let mut tx = ledger.begin().await.unwrap();
    let mut files = Vec::with_capacity(n);
    for _ in 0..n {
        let id = Uuid::new_v4();
        let object_key = stagehand_core::staging_key(
            "uploads",
            &session.purpose,
            session.owner_id,
            session.id,
            id,
        );
        files.push(
            tx.create_file(NewUploadFile {
                id,
                session_id: session.id,
                object_key,
            })
            .await
            .unwrap(),
        );
    }
    tx.commit().await.unwrap();
    files
}
