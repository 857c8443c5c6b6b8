//! Governor contract domain model.
//!
//! The governor contract emits six event kinds over the life of a
//! proposal: created, canceled, voting closed, executed, expired, and
//! vote cast. This crate decodes raw contract-event envelopes into a
//! closed sum type ([`GovernorEventKind`]) and defines the aggregates
//! the indexer materializes from that stream ([`Proposal`], [`Vote`]).

pub mod error;
pub mod events;
pub mod proposal;
pub mod vote;

pub use error::DecodeError;
pub use events::{
    EventContext, GovernorEvent, GovernorEventKind, ProposalCreatedData,
    ProposalVotingClosedData, VoteCastData, VoteCount,
};
pub use proposal::{encode_proposal_key, InvalidStatus, Proposal, ProposalStatus};
pub use vote::Vote;
