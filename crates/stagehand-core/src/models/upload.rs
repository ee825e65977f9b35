use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Time-boxed, quota-bounded container for a batch of uploads owned by one caller.
///
/// `expires_at` and `max_files` are fixed when the row is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct UploadSession {
    pub id: Uuid,
    pub owner_id: Uuid,
    /// Free-form tag, used as a key segment
    pub purpose: String,
    pub expires_at: DateTime<Utc>,
    pub max_files: i32,
    pub created_at: DateTime<Utc>,
}

impl UploadSession {
    /// A session is still open at its exact expiry instant.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn is_owned_by(&self, owner_id: Uuid) -> bool {
        self.owner_id == owner_id
    }
}

/// Row to insert for a new session
#[derive(Debug, Clone)]
pub struct NewUploadSession {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub purpose: String,
    pub expires_at: DateTime<Utc>,
    pub max_files: i32,
    pub created_at: DateTime<Utc>,
}

impl From<NewUploadSession> for UploadSession {
    fn from(new: NewUploadSession) -> Self {
        UploadSession {
            id: new.id,
            owner_id: new.owner_id,
            purpose: new.purpose,
            expires_at: new.expires_at,
            max_files: new.max_files,
            created_at: new.created_at,
        }
    }
}

/// Pending file registered against a session.
///
/// There is no uploaded flag: whether bytes exist at `object_key` is only
/// checked at acceptance time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct UploadFile {
    pub id: Uuid,
    pub session_id: Uuid,
    pub object_key: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUploadFile {
    pub id: Uuid,
    pub session_id: Uuid,
    pub object_key: String,
}

/// Object metadata as reported by a HEAD request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectHead {
    pub size: u64,
    pub content_type: Option<String>,
    pub etag: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Pre-registered pending file plus the URL the client uploads it to
#[derive(Debug, Clone, Serialize)]
pub struct FileIntent {
    pub file_id: Uuid,
    /// Staging key the client's PUT lands on
    pub object_key: String,
    pub put_url: String,
    pub url_expires_at: DateTime<Utc>,
}

/// Manifest entry for a file relocated by acceptance
#[derive(Debug, Clone, Serialize)]
pub struct AcceptedFile {
    pub file_id: Uuid,
    pub staging_key: String,
    pub final_key: String,
    pub head: ObjectHead,
}

#[derive(Debug, Clone)]
pub struct CreateSessionInput {
    pub owner_id: Uuid,
    pub purpose: String,
    pub ttl: Duration,
    pub max_files: i32,
}

#[derive(Debug, Clone)]
pub struct CreateFileIntentsInput {
    pub session_id: Uuid,
    pub owner_id: Uuid,
    pub files_count: i32,
    pub key_prefix: String,
    pub content_type: String,
}

#[derive(Debug, Clone)]
pub struct AcceptSessionInput {
    pub session_id: Uuid,
    pub owner_id: Uuid,
    pub final_prefix: String,
}

#[derive(Debug, Clone, Copy)]
pub struct CancelSessionInput {
    pub session_id: Uuid,
    pub owner_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct PresignGetInput {
    pub object_key: String,
}
