//! Stagehand Services Layer
//!
//! This crate is the orchestration layer of the staged-upload protocol. It
//! coordinates the relational ledger (`stagehand-db`) with the object store
//! (`stagehand-storage`):
//!
//! - `UploadService` creates sessions, allocates file intents with presigned
//!   PUT URLs, accepts (verify, copy, delete) and cancels sessions.
//! - `SessionReaper` retires sessions that expired without being accepted.
//!
//! No operation here runs inside a transaction spanning both systems. Once a
//! session row is deleted by accept or cancel, it is gone even if later storage
//! calls fail; callers reconcile by listing the staging and final prefixes.

pub mod cleanup;
pub mod upload;

pub use cleanup::{ReapReport, SessionReaper};
pub use stagehand_core::{ErrorKind, ErrorMetadata, UploadError, UploadResult};
pub use stagehand_db::UploadLedger;
pub use stagehand_storage::ObjectStorage;
pub use upload::{UploadService, UploadServiceConfig};
