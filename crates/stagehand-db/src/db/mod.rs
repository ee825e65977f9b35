//! Database repositories for the data access layer
//
// Ledger traits (what the upload core depends on)
pub mod ledger;
//
// PostgreSQL implementation
pub mod setup;
pub mod transaction;
pub mod upload;

pub use ledger::{LedgerTransaction, UploadLedger};
pub use setup::{connect, run_migrations};
pub use transaction::PgLedgerTransaction;
pub use upload::PgUploadLedger;
