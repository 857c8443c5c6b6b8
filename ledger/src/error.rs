//! Ledger model and backend errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("transaction meta unavailable: {0}")]
    MetaUnavailable(String),

    #[error("ledger dump error: {0}")]
    Dump(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("backend error: {0}")]
    Backend(String),
}
