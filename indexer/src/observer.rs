//! Ingestion observers.
//!
//! The scanner and applier report operational outcomes through this
//! trait instead of logging directly, keeping the state machine pure and
//! testable. [`TracingObserver`] is the production implementation;
//! [`NullObserver`] is for tests that don't care.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use gavel_governor::{DecodeError, GovernorEvent};
use gavel_ledger::{ContractEvent, LedgerError};

use crate::error::ApplyError;

/// Receives ingestion outcomes as they happen.
///
/// All methods default to no-ops so implementations only override what
/// they observe.
pub trait IndexerObserver: Send + Sync {
    /// An event mutated aggregate state.
    fn event_applied(&self, _event: &GovernorEvent) {}

    /// An event was recognized but deliberately not applied (wrong
    /// proposal status, duplicate delivery).
    fn event_noop(&self, _event: &GovernorEvent, _reason: &str) {}

    /// Applying an event failed; ingestion continues with the next one.
    fn event_failed(&self, _event: &GovernorEvent, _error: &ApplyError) {}

    /// A recognized governance event carried a malformed field.
    /// Format-level rejections are not reported: most contract events
    /// are simply not governance events.
    fn decode_failed(
        &self,
        _ledger_seq: u32,
        _tx_hash: &str,
        _event: &ContractEvent,
        _error: &DecodeError,
    ) {
    }

    /// A transaction's result meta could not be parsed; the whole
    /// transaction was skipped.
    fn meta_unavailable(&self, _ledger_seq: u32, _tx_hash: &str, _error: &LedgerError) {}

    /// A ledger was fully scanned.
    fn ledger_scanned(&self, _ledger_seq: u32, _tx_count: usize) {}
}

/// Observer that discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullObserver;

impl IndexerObserver for NullObserver {}

/// Observer that forwards to `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

impl IndexerObserver for TracingObserver {
    fn event_applied(&self, event: &GovernorEvent) {
        tracing::info!(
            ledger = event.ledger_seq,
            hash = %event.tx_hash,
            event_id = %event.event_id,
            event_type = event.kind.name(),
            "event applied"
        );
    }

    fn event_noop(&self, event: &GovernorEvent, reason: &str) {
        tracing::info!(
            ledger = event.ledger_seq,
            hash = %event.tx_hash,
            event_id = %event.event_id,
            event_type = event.kind.name(),
            reason,
            "event not applied"
        );
    }

    fn event_failed(&self, event: &GovernorEvent, error: &ApplyError) {
        tracing::error!(
            ledger = event.ledger_seq,
            hash = %event.tx_hash,
            event_id = %event.event_id,
            event_type = event.kind.name(),
            %error,
            "failed applying event"
        );
    }

    fn decode_failed(
        &self,
        ledger_seq: u32,
        tx_hash: &str,
        event: &ContractEvent,
        error: &DecodeError,
    ) {
        // Include the raw envelope so a protocol mismatch can be
        // diagnosed from the log alone.
        let raw = match bincode::serialize(event) {
            Ok(bytes) => BASE64.encode(bytes),
            Err(_) => format!("{event:?}"),
        };
        tracing::error!(ledger = ledger_seq, hash = %tx_hash, event = %raw, %error, "failed parsing event");
    }

    fn meta_unavailable(&self, ledger_seq: u32, tx_hash: &str, error: &LedgerError) {
        tracing::error!(ledger = ledger_seq, hash = %tx_hash, %error, "failed getting events for tx");
    }

    fn ledger_scanned(&self, ledger_seq: u32, tx_count: usize) {
        tracing::debug!(ledger = ledger_seq, tx_count, "ledger scanned");
    }
}
