//! Ledger data model and ledger backends.
//!
//! The indexer consumes finalized ledgers: sequentially numbered batches
//! of transactions, each of which may carry contract events. This crate
//! defines that model plus the [`LedgerBackend`] trait through which
//! ledgers are fetched. Live transports (node RPC, captive core) sit
//! behind the same trait; this crate ships a [`StaticLedgerBackend`] used
//! for tests and for replaying captured ledger dumps.

pub mod backend;
pub mod error;
pub mod event;
pub mod ledger;
pub mod transaction;
pub mod value;

pub use backend::{LedgerBackend, StaticLedgerBackend};
pub use error::LedgerError;
pub use event::{ContractEvent, ContractEventBody, ContractEventKind, ContractEventV0};
pub use ledger::Ledger;
pub use transaction::{EventsMeta, LedgerTransaction, Operation, OperationKind};
pub use value::Val;
