//! Stagehand Database Library
//!
//! The relational ledger of upload sessions and pending files: the
//! `UploadLedger` trait the upload core is written against, and its
//! PostgreSQL implementation.

pub mod db;

pub use db::{
    connect, run_migrations, LedgerTransaction, PgLedgerTransaction, PgUploadLedger, UploadLedger,
};
