//! The ingestion service loop.

use std::sync::Arc;

use tokio::sync::broadcast;

use gavel_ledger::LedgerBackend;
use gavel_store::{Checkpoint, GovernorStore};

use crate::error::IndexerError;
use crate::observer::IndexerObserver;
use crate::scanner::LedgerScanner;

/// Default checkpoint source name for the ingestion worker.
pub const DEFAULT_SOURCE: &str = "indexer";

/// Drives ingestion: fetch ledger, scan it, advance the checkpoint,
/// repeat.
///
/// Resumes from `max(checkpoint, start_seq)`. The checkpointed ledger
/// itself is re-scanned on restart — the store's idempotent writes make
/// that a no-op, and it closes the window where a crash landed between
/// the scan and the checkpoint advance. The checkpoint moves once per
/// fully-scanned ledger regardless of per-event application errors;
/// consistency relies on the at-least-once/idempotent-retry contract,
/// not on atomicity across writes.
pub struct IndexerService<B, S: ?Sized> {
    backend: B,
    store: Arc<S>,
    observer: Arc<dyn IndexerObserver>,
    source: String,
    start_seq: u32,
}

impl<B: LedgerBackend, S: GovernorStore + ?Sized> IndexerService<B, S> {
    pub fn new(
        backend: B,
        store: Arc<S>,
        observer: Arc<dyn IndexerObserver>,
        source: impl Into<String>,
        start_seq: u32,
    ) -> Self {
        Self {
            backend,
            store,
            observer,
            source: source.into(),
            start_seq,
        }
    }

    /// Run until the backend is drained or a shutdown signal arrives.
    /// Stops only between ledgers; no partial-ledger state needs
    /// rolling back because every write is idempotent.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) -> Result<(), IndexerError> {
        let checkpoint = self.store.get_checkpoint(&self.source)?;
        let mut seq = checkpoint
            .map(|c| c.ledger_seq)
            .unwrap_or(0)
            .max(self.start_seq);

        tracing::info!(source = %self.source, ledger = seq, "starting ledger ingestion");

        loop {
            let ledger = tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!(ledger = seq, "shutdown signal received, stopping ingestion");
                    return Ok(());
                }
                result = self.backend.get_ledger(seq) => match result? {
                    Some(ledger) => ledger,
                    None => {
                        tracing::info!(ledger = seq, "ledger source drained, stopping ingestion");
                        return Ok(());
                    }
                },
            };

            LedgerScanner::new(&*self.store, &*self.observer).scan_ledger(&ledger);

            self.store.upsert_checkpoint(
                &self.source,
                Checkpoint {
                    ledger_seq: ledger.sequence,
                    close_time: ledger.close_time,
                },
            )?;

            tracing::info!(ledger = ledger.sequence, "ledger processed");
            seq = ledger.sequence + 1;
        }
    }
}
