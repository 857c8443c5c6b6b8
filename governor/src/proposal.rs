//! Proposal aggregate.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::events::{GovernorEvent, ProposalCreatedData};

/// Lifecycle status of a proposal. Wire and storage representation is
/// the contract's raw u32 value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u32", try_from = "u32")]
pub enum ProposalStatus {
    Active,
    Successful,
    Defeated,
    Expired,
    Executed,
    Canceled,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid proposal status value {0}")]
pub struct InvalidStatus(pub u32);

impl From<ProposalStatus> for u32 {
    fn from(status: ProposalStatus) -> u32 {
        match status {
            ProposalStatus::Active => 0,
            ProposalStatus::Successful => 1,
            ProposalStatus::Defeated => 2,
            ProposalStatus::Expired => 3,
            ProposalStatus::Executed => 4,
            ProposalStatus::Canceled => 5,
        }
    }
}

impl TryFrom<u32> for ProposalStatus {
    type Error = InvalidStatus;

    fn try_from(value: u32) -> Result<Self, InvalidStatus> {
        match value {
            0 => Ok(ProposalStatus::Active),
            1 => Ok(ProposalStatus::Successful),
            2 => Ok(ProposalStatus::Defeated),
            3 => Ok(ProposalStatus::Expired),
            4 => Ok(ProposalStatus::Executed),
            5 => Ok(ProposalStatus::Canceled),
            other => Err(InvalidStatus(other)),
        }
    }
}

/// Build the unique key for a proposal.
pub fn encode_proposal_key(contract_id: &str, proposal_id: u32) -> String {
    format!("{contract_id}-{proposal_id}")
}

/// The materialized state of one proposal.
///
/// Identity fields (`proposal_key` through `vote_end`) are fixed at
/// creation; only `status`, the tallies, and the execution fields change
/// afterwards. Tallies are decimal strings accumulated through
/// `gavel_types::Tally`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub proposal_key: String,
    pub contract_id: String,
    pub proposal_id: u32,
    pub proposer: String,
    pub status: ProposalStatus,
    pub title: String,
    pub description: String,
    pub action: String,
    pub vote_start: u32,
    pub vote_end: u32,
    pub votes_for: String,
    pub votes_against: String,
    pub votes_abstain: String,
    pub execution_unlock: u32,
    pub execution_tx_hash: String,
}

impl Proposal {
    /// Build the initial proposal state from a `proposal_created` event.
    pub fn from_created_event(event: &GovernorEvent, data: &ProposalCreatedData) -> Self {
        Proposal {
            proposal_key: event.proposal_key(),
            contract_id: event.contract_id.clone(),
            proposal_id: event.proposal_id,
            proposer: data.proposer.clone(),
            status: ProposalStatus::Active,
            title: data.title.clone(),
            description: data.desc.clone(),
            action: data.action.clone(),
            vote_start: data.vote_start,
            vote_end: data.vote_end,
            votes_for: "0".to_string(),
            votes_against: "0".to_string(),
            votes_abstain: "0".to_string(),
            execution_unlock: 0,
            execution_tx_hash: String::new(),
        }
    }

    /// Whether `other` describes the same creation: all identity fields
    /// equal, ignoring status, tallies, and execution state. Used to
    /// tell a redelivered `proposal_created` apart from a conflicting
    /// second creation for the same key.
    pub fn identity_matches(&self, other: &Proposal) -> bool {
        self.proposal_key == other.proposal_key
            && self.contract_id == other.contract_id
            && self.proposal_id == other.proposal_id
            && self.proposer == other.proposer
            && self.title == other.title
            && self.description == other.description
            && self.action == other.action
            && self.vote_start == other.vote_start
            && self.vote_end == other.vote_end
    }
}
