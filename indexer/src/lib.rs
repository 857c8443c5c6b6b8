//! Ingestion pipeline: ledgers in, materialized governance state out.
//!
//! A single logical worker walks ledgers in ascending sequence order.
//! For each ledger the [`LedgerScanner`] filters transactions down to
//! successful contract invocations, decodes their events, and hands
//! every governor event to the [`EventApplier`] — a per-event-kind state
//! machine over the proposal and vote aggregates. After a ledger is
//! fully scanned the [`IndexerService`] advances the ingestion
//! checkpoint.
//!
//! Every write is idempotent on its natural key, so the pipeline is
//! at-least-once: re-processing a ledger after a crash or restart
//! converges to the same stored state.

pub mod applier;
pub mod config;
pub mod error;
pub mod logging;
pub mod observer;
pub mod scanner;
pub mod service;
pub mod shutdown;

pub use applier::EventApplier;
pub use config::IndexerConfig;
pub use error::{ApplyError, IndexerError};
pub use logging::{init_logging, LogFormat};
pub use observer::{IndexerObserver, NullObserver, TracingObserver};
pub use scanner::LedgerScanner;
pub use service::IndexerService;
pub use shutdown::ShutdownController;
