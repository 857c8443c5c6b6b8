//! Vote records.

use serde::{Deserialize, Serialize};

use crate::events::{GovernorEvent, VoteCastData};

/// One cast vote, keyed by its transaction hash.
///
/// A vote record existing implies its amount has been folded into the
/// owning proposal's tally exactly once; the applier checks for an
/// existing record before counting.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    pub tx_hash: String,
    pub contract_id: String,
    pub proposal_id: u32,
    pub voter: String,
    /// 0 = against, 1 = for, 2 = abstain.
    pub support: u32,
    /// Vote weight as a base-10 string.
    pub amount: String,
    pub ledger_seq: u32,
    pub ledger_close_time: i64,
}

impl Vote {
    /// Build the vote record from a `vote_cast` event.
    pub fn from_vote_cast_event(event: &GovernorEvent, data: &VoteCastData) -> Self {
        Vote {
            tx_hash: event.tx_hash.clone(),
            contract_id: event.contract_id.clone(),
            proposal_id: event.proposal_id,
            voter: data.voter.clone(),
            support: data.support,
            amount: data.amount.clone(),
            ledger_seq: event.ledger_seq,
            ledger_close_time: event.ledger_close_time,
        }
    }
}
