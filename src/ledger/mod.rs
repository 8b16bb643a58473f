//! The recording and consistency engine: everything that writes to or
//! projects from the append-only transaction ledger.

pub mod audit;
pub mod idempotency;
pub mod money;
pub mod projection;
pub mod recorder;
pub mod reversal;

use serde::Serialize;

use crate::db::models::Transaction;

/// Result of a mutating ledger operation. `duplicate` means the row was
/// already there and is being returned unchanged.
#[derive(Debug, Serialize)]
pub struct WriteOutcome {
    pub transaction: Transaction,
    pub duplicate: bool,
}

pub(crate) fn default_actor() -> String {
    "admin".to_string()
}
