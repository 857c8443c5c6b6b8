//! Scanning a ledger's transactions for governor events.

use gavel_governor::{EventContext, GovernorEvent};
use gavel_ledger::Ledger;
use gavel_store::GovernorStore;

use crate::applier::EventApplier;
use crate::observer::IndexerObserver;

/// Walks one ledger and routes every decodable governor event to the
/// applier.
///
/// Only successful transactions whose first operation is a contract
/// invocation are considered; contract invocations are single-operation
/// transactions, so the emitting operation index is always 0. Decode
/// and apply failures are reported through the observer and never abort
/// the ledger: the next transaction or event continues.
pub struct LedgerScanner<'a, S: ?Sized> {
    store: &'a S,
    observer: &'a dyn IndexerObserver,
}

impl<'a, S: GovernorStore + ?Sized> LedgerScanner<'a, S> {
    pub fn new(store: &'a S, observer: &'a dyn IndexerObserver) -> Self {
        Self { store, observer }
    }

    /// Scan every transaction of `ledger` in order. Returns the number
    /// of transactions observed (before any filtering).
    pub fn scan_ledger(&self, ledger: &Ledger) -> usize {
        let applier = EventApplier::new(self.store, self.observer);
        let mut tx_count = 0;

        for tx in &ledger.transactions {
            tx_count += 1;

            if !tx.successful {
                continue;
            }
            if !tx.is_contract_invocation() {
                continue;
            }

            let events = match tx.contract_events() {
                Ok(events) => events,
                Err(e) => {
                    self.observer.meta_unavailable(ledger.sequence, &tx.hash, &e);
                    continue;
                }
            };

            for (event_index, event) in events.iter().enumerate() {
                let ctx = EventContext {
                    tx_hash: &tx.hash,
                    ledger_seq: ledger.sequence,
                    ledger_close_time: ledger.close_time,
                    tx_index: tx.index,
                    op_index: 0,
                    event_index: event_index as u32,
                };

                let gov_event = match GovernorEvent::decode(event, &ctx) {
                    Ok(gov_event) => gov_event,
                    // Not a governance event; expected and frequent.
                    Err(e) if e.is_format() => continue,
                    Err(e) => {
                        self.observer
                            .decode_failed(ledger.sequence, &tx.hash, event, &e);
                        continue;
                    }
                };

                if let Err(e) = applier.apply(&gov_event) {
                    self.observer.event_failed(&gov_event, &e);
                }
            }
        }

        self.observer.ledger_scanned(ledger.sequence, tx_count);
        tx_count
    }
}
