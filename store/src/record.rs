//! Stored record shapes.

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use gavel_governor::GovernorEvent;

/// A governor event as persisted in the append-only history.
///
/// The typed payload is flattened to its wire name plus a JSON object
/// string so history rows stay readable and replayable without the
/// decoding code that produced them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub event_id: String,
    pub contract_id: String,
    pub proposal_id: u32,
    pub event_type: String,
    pub event_data: String,
    pub tx_hash: String,
    pub ledger_seq: u32,
    pub ledger_close_time: i64,
}

impl EventRecord {
    pub fn from_event(event: &GovernorEvent) -> Result<Self, StoreError> {
        let event_data = event
            .kind
            .data_json()
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(EventRecord {
            event_id: event.event_id.clone(),
            contract_id: event.contract_id.clone(),
            proposal_id: event.proposal_id,
            event_type: event.kind.name().to_string(),
            event_data,
            tx_hash: event.tx_hash.clone(),
            ledger_seq: event.ledger_seq,
            ledger_close_time: event.ledger_close_time,
        })
    }
}

/// The last fully processed ledger for an ingestion source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub ledger_seq: u32,
    /// Close time of that ledger, seconds since the Unix epoch. Drives
    /// the health endpoint's staleness check.
    pub close_time: i64,
}
