//! In-memory storage backend.
//!
//! Implements the `gavel-store` traits over mutex-guarded maps.
//! Thread-safe for use with tokio's multi-threaded runtime. Used by the
//! test suites and by the daemon's non-durable dev mode; the LMDB
//! backend is the durable one.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use gavel_governor::{Proposal, Vote};
use gavel_store::{
    Checkpoint, CheckpointStore, EventRecord, EventStore, ProposalStore, StoreError, VoteStore,
};

/// An in-memory `GovernorStore`.
pub struct MemoryStore {
    /// Keyed by event id; BTreeMap keeps history in emission order.
    events: Mutex<BTreeMap<String, EventRecord>>,
    proposals: Mutex<HashMap<String, Proposal>>,
    votes: Mutex<HashMap<String, Vote>>,
    checkpoints: Mutex<HashMap<String, Checkpoint>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(BTreeMap::new()),
            proposals: Mutex::new(HashMap::new()),
            votes: Mutex::new(HashMap::new()),
            checkpoints: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EventStore for MemoryStore {
    fn insert_event(&self, event: &EventRecord) -> Result<(), StoreError> {
        self.events
            .lock()
            .unwrap()
            .entry(event.event_id.clone())
            .or_insert_with(|| event.clone());
        Ok(())
    }

    fn get_event(&self, event_id: &str) -> Result<Option<EventRecord>, StoreError> {
        Ok(self.events.lock().unwrap().get(event_id).cloned())
    }

    fn events_by_contract(&self, contract_id: &str) -> Result<Vec<EventRecord>, StoreError> {
        Ok(self
            .events
            .lock()
            .unwrap()
            .values()
            .filter(|e| e.contract_id == contract_id)
            .cloned()
            .collect())
    }
}

impl ProposalStore for MemoryStore {
    fn upsert_proposal(&self, proposal: &Proposal) -> Result<(), StoreError> {
        let mut proposals = self.proposals.lock().unwrap();
        match proposals.get_mut(&proposal.proposal_key) {
            Some(existing) => {
                // Identity fields keep their stored values.
                existing.status = proposal.status;
                existing.votes_for = proposal.votes_for.clone();
                existing.votes_against = proposal.votes_against.clone();
                existing.votes_abstain = proposal.votes_abstain.clone();
                existing.execution_unlock = proposal.execution_unlock;
                existing.execution_tx_hash = proposal.execution_tx_hash.clone();
            }
            None => {
                proposals.insert(proposal.proposal_key.clone(), proposal.clone());
            }
        }
        Ok(())
    }

    fn get_proposal(&self, proposal_key: &str) -> Result<Option<Proposal>, StoreError> {
        Ok(self.proposals.lock().unwrap().get(proposal_key).cloned())
    }

    fn proposals_by_contract(&self, contract_id: &str) -> Result<Vec<Proposal>, StoreError> {
        let mut proposals: Vec<Proposal> = self
            .proposals
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.contract_id == contract_id)
            .cloned()
            .collect();
        proposals.sort_by(|a, b| b.proposal_id.cmp(&a.proposal_id));
        Ok(proposals)
    }
}

impl VoteStore for MemoryStore {
    fn insert_vote(&self, vote: &Vote) -> Result<(), StoreError> {
        self.votes
            .lock()
            .unwrap()
            .entry(vote.tx_hash.clone())
            .or_insert_with(|| vote.clone());
        Ok(())
    }

    fn get_vote(&self, tx_hash: &str) -> Result<Option<Vote>, StoreError> {
        Ok(self.votes.lock().unwrap().get(tx_hash).cloned())
    }

    fn votes_by_proposal(
        &self,
        contract_id: &str,
        proposal_id: u32,
    ) -> Result<Vec<Vote>, StoreError> {
        let mut votes: Vec<Vote> = self
            .votes
            .lock()
            .unwrap()
            .values()
            .filter(|v| v.contract_id == contract_id && v.proposal_id == proposal_id)
            .cloned()
            .collect();
        votes.sort_by(|a, b| b.ledger_seq.cmp(&a.ledger_seq));
        Ok(votes)
    }
}

impl CheckpointStore for MemoryStore {
    fn get_checkpoint(&self, source: &str) -> Result<Option<Checkpoint>, StoreError> {
        Ok(self.checkpoints.lock().unwrap().get(source).copied())
    }

    fn upsert_checkpoint(&self, source: &str, checkpoint: Checkpoint) -> Result<(), StoreError> {
        self.checkpoints
            .lock()
            .unwrap()
            .insert(source.to_string(), checkpoint);
        Ok(())
    }
}
