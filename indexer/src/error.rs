//! Indexer error types.

use thiserror::Error;

use gavel_ledger::LedgerError;
use gavel_store::StoreError;

/// Why applying one event to aggregate state failed.
///
/// `Application` means the event violated a state-machine precondition
/// (missing proposal, invalid enum value, unparsable amount). These are
/// not retried: replaying the same event yields the same error. `Store`
/// is an I/O failure in the persistence layer and is worth retrying via
/// the normal replay path.
#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("event application failed: {0}")]
    Application(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Top-level ingestion service errors.
#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
