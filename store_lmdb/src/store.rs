//! `GovernorStore` implementation over the LMDB environment.

use std::path::Path;

use gavel_governor::{Proposal, Vote};
use gavel_store::{
    Checkpoint, CheckpointStore, EventRecord, EventStore, ProposalStore, StoreError, VoteStore,
};

use crate::environment::LmdbEnvironment;
use crate::LmdbError;

/// Separator between the contract id and the rest of a composite index
/// key. Contract ids are strkey (base32 alphabet), so 0x00 never
/// collides.
const SEP: u8 = 0x00;

fn contract_prefix(contract_id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(contract_id.len() + 1);
    key.extend_from_slice(contract_id.as_bytes());
    key.push(SEP);
    key
}

/// contract_id ++ 0x00 ++ event_id
fn contract_event_key(contract_id: &str, event_id: &str) -> Vec<u8> {
    let mut key = contract_prefix(contract_id);
    key.extend_from_slice(event_id.as_bytes());
    key
}

/// contract_id ++ 0x00 ++ proposal_id BE
fn contract_proposal_key(contract_id: &str, proposal_id: u32) -> Vec<u8> {
    let mut key = contract_prefix(contract_id);
    key.extend_from_slice(&proposal_id.to_be_bytes());
    key
}

/// contract_id ++ 0x00 ++ proposal_id BE ++ ledger_seq BE ++ tx_hash
fn proposal_vote_key(
    contract_id: &str,
    proposal_id: u32,
    ledger_seq: u32,
    tx_hash: &str,
) -> Vec<u8> {
    let mut key = contract_proposal_key(contract_id, proposal_id);
    key.extend_from_slice(&ledger_seq.to_be_bytes());
    key.extend_from_slice(tx_hash.as_bytes());
    key
}

fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, LmdbError> {
    bincode::serialize(value).map_err(|e| LmdbError::Serialization(e.to_string()))
}

fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T, LmdbError> {
    bincode::deserialize(bytes).map_err(|e| LmdbError::Serialization(e.to_string()))
}

/// Durable `GovernorStore` backed by LMDB.
pub struct LmdbStore {
    env: LmdbEnvironment,
}

impl LmdbStore {
    /// Open or create the store under the given directory.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        Ok(Self {
            env: LmdbEnvironment::open(path, map_size)?,
        })
    }

    pub fn environment(&self) -> &LmdbEnvironment {
        &self.env
    }
}

impl EventStore for LmdbStore {
    fn insert_event(&self, event: &EventRecord) -> Result<(), StoreError> {
        let mut wtxn = self.env.env().write_txn().map_err(LmdbError::from)?;
        if self
            .env
            .events_db
            .get(&wtxn, &event.event_id)
            .map_err(LmdbError::from)?
            .is_some()
        {
            // Redelivery of a stored id is a no-op, never an overwrite.
            return Ok(());
        }
        self.env
            .events_db
            .put(&mut wtxn, &event.event_id, &encode(event)?)
            .map_err(LmdbError::from)?;
        self.env
            .contract_events_index
            .put(
                &mut wtxn,
                &contract_event_key(&event.contract_id, &event.event_id),
                event.event_id.as_bytes(),
            )
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn get_event(&self, event_id: &str) -> Result<Option<EventRecord>, StoreError> {
        let rtxn = self.env.env().read_txn().map_err(LmdbError::from)?;
        match self
            .env
            .events_db
            .get(&rtxn, event_id)
            .map_err(LmdbError::from)?
        {
            Some(bytes) => Ok(Some(decode(bytes)?)),
            None => Ok(None),
        }
    }

    fn events_by_contract(&self, contract_id: &str) -> Result<Vec<EventRecord>, StoreError> {
        let rtxn = self.env.env().read_txn().map_err(LmdbError::from)?;
        let prefix = contract_prefix(contract_id);
        let mut events = Vec::new();
        let iter = self
            .env
            .contract_events_index
            .prefix_iter(&rtxn, &prefix)
            .map_err(LmdbError::from)?;
        for entry in iter {
            let (_, event_id) = entry.map_err(LmdbError::from)?;
            let event_id = std::str::from_utf8(event_id)
                .map_err(|e| StoreError::Corruption(format!("event index value: {e}")))?;
            let bytes = self
                .env
                .events_db
                .get(&rtxn, event_id)
                .map_err(LmdbError::from)?
                .ok_or_else(|| {
                    StoreError::Corruption(format!("event index points to missing id {event_id}"))
                })?;
            events.push(decode(bytes)?);
        }
        Ok(events)
    }
}

impl ProposalStore for LmdbStore {
    fn upsert_proposal(&self, proposal: &Proposal) -> Result<(), StoreError> {
        let mut wtxn = self.env.env().write_txn().map_err(LmdbError::from)?;
        let merged = match self
            .env
            .proposals_db
            .get(&wtxn, &proposal.proposal_key)
            .map_err(LmdbError::from)?
        {
            Some(bytes) => {
                // Identity fields keep their stored values.
                let mut existing: Proposal = decode(bytes)?;
                existing.status = proposal.status;
                existing.votes_for = proposal.votes_for.clone();
                existing.votes_against = proposal.votes_against.clone();
                existing.votes_abstain = proposal.votes_abstain.clone();
                existing.execution_unlock = proposal.execution_unlock;
                existing.execution_tx_hash = proposal.execution_tx_hash.clone();
                existing
            }
            None => {
                self.env
                    .contract_proposals_index
                    .put(
                        &mut wtxn,
                        &contract_proposal_key(&proposal.contract_id, proposal.proposal_id),
                        proposal.proposal_key.as_bytes(),
                    )
                    .map_err(LmdbError::from)?;
                proposal.clone()
            }
        };
        self.env
            .proposals_db
            .put(&mut wtxn, &merged.proposal_key, &encode(&merged)?)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn get_proposal(&self, proposal_key: &str) -> Result<Option<Proposal>, StoreError> {
        let rtxn = self.env.env().read_txn().map_err(LmdbError::from)?;
        match self
            .env
            .proposals_db
            .get(&rtxn, proposal_key)
            .map_err(LmdbError::from)?
        {
            Some(bytes) => Ok(Some(decode(bytes)?)),
            None => Ok(None),
        }
    }

    fn proposals_by_contract(&self, contract_id: &str) -> Result<Vec<Proposal>, StoreError> {
        let rtxn = self.env.env().read_txn().map_err(LmdbError::from)?;
        let prefix = contract_prefix(contract_id);
        let mut proposals = Vec::new();
        let iter = self
            .env
            .contract_proposals_index
            .rev_prefix_iter(&rtxn, &prefix)
            .map_err(LmdbError::from)?;
        for entry in iter {
            let (_, proposal_key) = entry.map_err(LmdbError::from)?;
            let proposal_key = std::str::from_utf8(proposal_key)
                .map_err(|e| StoreError::Corruption(format!("proposal index value: {e}")))?;
            let bytes = self
                .env
                .proposals_db
                .get(&rtxn, proposal_key)
                .map_err(LmdbError::from)?
                .ok_or_else(|| {
                    StoreError::Corruption(format!(
                        "proposal index points to missing key {proposal_key}"
                    ))
                })?;
            proposals.push(decode(bytes)?);
        }
        Ok(proposals)
    }
}

impl VoteStore for LmdbStore {
    fn insert_vote(&self, vote: &Vote) -> Result<(), StoreError> {
        let mut wtxn = self.env.env().write_txn().map_err(LmdbError::from)?;
        if self
            .env
            .votes_db
            .get(&wtxn, &vote.tx_hash)
            .map_err(LmdbError::from)?
            .is_some()
        {
            return Ok(());
        }
        self.env
            .votes_db
            .put(&mut wtxn, &vote.tx_hash, &encode(vote)?)
            .map_err(LmdbError::from)?;
        self.env
            .proposal_votes_index
            .put(
                &mut wtxn,
                &proposal_vote_key(
                    &vote.contract_id,
                    vote.proposal_id,
                    vote.ledger_seq,
                    &vote.tx_hash,
                ),
                vote.tx_hash.as_bytes(),
            )
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn get_vote(&self, tx_hash: &str) -> Result<Option<Vote>, StoreError> {
        let rtxn = self.env.env().read_txn().map_err(LmdbError::from)?;
        match self
            .env
            .votes_db
            .get(&rtxn, tx_hash)
            .map_err(LmdbError::from)?
        {
            Some(bytes) => Ok(Some(decode(bytes)?)),
            None => Ok(None),
        }
    }

    fn votes_by_proposal(
        &self,
        contract_id: &str,
        proposal_id: u32,
    ) -> Result<Vec<Vote>, StoreError> {
        let rtxn = self.env.env().read_txn().map_err(LmdbError::from)?;
        let prefix = contract_proposal_key(contract_id, proposal_id);
        let mut votes = Vec::new();
        let iter = self
            .env
            .proposal_votes_index
            .rev_prefix_iter(&rtxn, &prefix)
            .map_err(LmdbError::from)?;
        for entry in iter {
            let (_, tx_hash) = entry.map_err(LmdbError::from)?;
            let tx_hash = std::str::from_utf8(tx_hash)
                .map_err(|e| StoreError::Corruption(format!("vote index value: {e}")))?;
            let bytes = self
                .env
                .votes_db
                .get(&rtxn, tx_hash)
                .map_err(LmdbError::from)?
                .ok_or_else(|| {
                    StoreError::Corruption(format!("vote index points to missing hash {tx_hash}"))
                })?;
            votes.push(decode(bytes)?);
        }
        Ok(votes)
    }
}

impl CheckpointStore for LmdbStore {
    fn get_checkpoint(&self, source: &str) -> Result<Option<Checkpoint>, StoreError> {
        let rtxn = self.env.env().read_txn().map_err(LmdbError::from)?;
        match self
            .env
            .checkpoints_db
            .get(&rtxn, source)
            .map_err(LmdbError::from)?
        {
            Some(bytes) => Ok(Some(decode(bytes)?)),
            None => Ok(None),
        }
    }

    fn upsert_checkpoint(&self, source: &str, checkpoint: Checkpoint) -> Result<(), StoreError> {
        let mut wtxn = self.env.env().write_txn().map_err(LmdbError::from)?;
        self.env
            .checkpoints_db
            .put(&mut wtxn, source, &encode(&checkpoint)?)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}
