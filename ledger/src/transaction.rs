//! Transactions as delivered by a ledger backend.

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::event::ContractEvent;

/// The kind of an operation within a transaction.
///
/// Only `InvokeContract` matters to the indexer; the classic kinds exist
/// so backends can faithfully represent transactions the scanner must
/// skip.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationKind {
    InvokeContract,
    Payment,
    CreateAccount,
    Other,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub kind: OperationKind,
}

/// Contract events extracted from a transaction's result meta.
///
/// Extraction happens at the transport boundary; when the meta cannot be
/// parsed the backend still delivers the transaction, flagged
/// `Unavailable`, so the scanner can log and skip it without losing the
/// rest of the ledger.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum EventsMeta {
    /// Events in emission order.
    Available(Vec<ContractEvent>),
    Unavailable(String),
}

/// One transaction in a closed ledger.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LedgerTransaction {
    /// Hex-encoded transaction hash.
    pub hash: String,
    /// Position of the transaction within its ledger.
    pub index: u32,
    /// Whether the transaction applied successfully.
    pub successful: bool,
    pub operations: Vec<Operation>,
    pub events: EventsMeta,
}

impl LedgerTransaction {
    /// Whether this is a single-purpose contract invocation: the first
    /// operation exists and is `InvokeContract`. Contract invocations are
    /// always the sole operation of their transaction.
    pub fn is_contract_invocation(&self) -> bool {
        matches!(
            self.operations.first(),
            Some(Operation {
                kind: OperationKind::InvokeContract,
            })
        )
    }

    /// The transaction's contract events, or an error when the result
    /// meta could not be parsed.
    pub fn contract_events(&self) -> Result<&[ContractEvent], LedgerError> {
        match &self.events {
            EventsMeta::Available(events) => Ok(events),
            EventsMeta::Unavailable(reason) => {
                Err(LedgerError::MetaUnavailable(reason.clone()))
            }
        }
    }
}
