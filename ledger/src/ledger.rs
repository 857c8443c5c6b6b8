//! A closed ledger.

use serde::{Deserialize, Serialize};

use crate::transaction::LedgerTransaction;

/// A sequentially numbered batch of finalized transactions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    pub sequence: u32,
    /// Close time in seconds since the Unix epoch.
    pub close_time: i64,
    /// Transactions in application order.
    pub transactions: Vec<LedgerTransaction>,
}
