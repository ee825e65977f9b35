//! Background retirement of expired upload sessions.

mod service;

pub use service::{ReapReport, SessionReaper};
