//! Abstract storage traits for the gavel indexer.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The indexer and the read API depend only on the traits.
//!
//! The write operations carry the idempotency contract the ingestion
//! pipeline relies on: event and vote inserts are no-ops when the key
//! already exists, and proposal upserts never touch identity fields on
//! conflict. Re-applying an already-applied ledger therefore converges
//! to the same stored state.

pub mod error;
pub mod record;

pub use error::StoreError;
pub use record::{Checkpoint, EventRecord};

use gavel_governor::{Proposal, Vote};

/// Append-only history of decoded governor events.
pub trait EventStore {
    /// Insert an event. Idempotent on `event_id`: redelivery of an
    /// already-stored id is a no-op, never an overwrite.
    fn insert_event(&self, event: &EventRecord) -> Result<(), StoreError>;

    fn get_event(&self, event_id: &str) -> Result<Option<EventRecord>, StoreError>;

    /// All events for a contract, ordered by event id ascending
    /// (emission order).
    fn events_by_contract(&self, contract_id: &str) -> Result<Vec<EventRecord>, StoreError>;
}

/// Materialized proposal aggregates.
pub trait ProposalStore {
    /// Insert or update a proposal. On conflict only the mutable fields
    /// (status, tallies, execution fields) are updated; identity fields
    /// keep their stored values.
    fn upsert_proposal(&self, proposal: &Proposal) -> Result<(), StoreError>;

    fn get_proposal(&self, proposal_key: &str) -> Result<Option<Proposal>, StoreError>;

    /// All proposals for a contract, ordered by proposal id descending.
    fn proposals_by_contract(&self, contract_id: &str) -> Result<Vec<Proposal>, StoreError>;
}

/// Cast votes, one per transaction.
pub trait VoteStore {
    /// Insert a vote. Idempotent on `tx_hash`.
    fn insert_vote(&self, vote: &Vote) -> Result<(), StoreError>;

    fn get_vote(&self, tx_hash: &str) -> Result<Option<Vote>, StoreError>;

    /// All votes for a proposal, ordered by ledger sequence descending.
    fn votes_by_proposal(
        &self,
        contract_id: &str,
        proposal_id: u32,
    ) -> Result<Vec<Vote>, StoreError>;
}

/// Ingestion checkpoints, one per source.
pub trait CheckpointStore {
    fn get_checkpoint(&self, source: &str) -> Result<Option<Checkpoint>, StoreError>;

    /// Advance the checkpoint. Called once per fully-scanned ledger;
    /// advancement is independent of per-event application errors
    /// (at-least-once delivery, idempotent writes).
    fn upsert_checkpoint(&self, source: &str, checkpoint: Checkpoint) -> Result<(), StoreError>;
}

/// The full storage surface the indexer and read API consume.
pub trait GovernorStore:
    EventStore + ProposalStore + VoteStore + CheckpointStore + Send + Sync
{
}

impl<T> GovernorStore for T where
    T: EventStore + ProposalStore + VoteStore + CheckpointStore + Send + Sync
{
}
