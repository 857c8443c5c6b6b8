//! Decoding contract events into typed governor events.
//!
//! Every governor event puts the event kind in topic 0 (a symbol) and
//! the proposal id in topic 1 (a u32). Kind-specific fields follow in
//! the remaining topics and the data payload; the tables in the decoder
//! functions below mirror the contract's emission code.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use gavel_ledger::{ContractEvent, ContractEventKind, ContractEventV0, Val};
use gavel_types::{encode_event_id, Address};

use crate::error::DecodeError;
use crate::proposal::encode_proposal_key;

/// Where in the chain an event was emitted. Supplied by the scanner
/// alongside the raw envelope.
#[derive(Clone, Copy, Debug)]
pub struct EventContext<'a> {
    /// Hex-encoded hash of the emitting transaction.
    pub tx_hash: &'a str,
    pub ledger_seq: u32,
    /// Close time of the ledger, seconds since the Unix epoch.
    pub ledger_close_time: i64,
    /// Position of the transaction within the ledger.
    pub tx_index: u32,
    /// Position of the emitting operation within the transaction.
    pub op_index: u32,
    /// Position of the event within the transaction's event list.
    pub event_index: u32,
}

/// Payload of a `proposal_created` event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProposalCreatedData {
    /// Strkey address of the proposer.
    pub proposer: String,
    pub title: String,
    pub desc: String,
    /// The action to execute if the proposal passes, as an opaque
    /// base64-encoded blob. The indexer never interprets it.
    pub action: String,
    /// Ledger sequence when voting opens.
    pub vote_start: u32,
    /// Ledger sequence when voting closes.
    pub vote_end: u32,
}

/// Final tallies reported when voting closes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VoteCount {
    #[serde(rename = "for")]
    pub votes_for: String,
    pub against: String,
    pub abstain: String,
}

/// Payload of a `proposal_voting_closed` event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProposalVotingClosedData {
    /// The status the contract settled on, as its raw enum value.
    pub status: u32,
    /// Ledger sequence when execution unlocks, if applicable.
    pub eta: u32,
    pub final_votes: VoteCount,
}

/// Payload of a `vote_cast` event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VoteCastData {
    /// Strkey address of the voter.
    pub voter: String,
    /// 0 = against, 1 = for, 2 = abstain.
    pub support: u32,
    /// Vote weight as a base-10 string (128-bit on chain).
    pub amount: String,
}

/// The six recognized governor event kinds with their typed payloads.
#[derive(Clone, Debug, PartialEq)]
pub enum GovernorEventKind {
    ProposalCreated(ProposalCreatedData),
    ProposalCanceled,
    ProposalVotingClosed(ProposalVotingClosedData),
    ProposalExecuted,
    ProposalExpired,
    VoteCast(VoteCastData),
}

impl GovernorEventKind {
    /// The wire name of this event kind.
    pub fn name(&self) -> &'static str {
        match self {
            GovernorEventKind::ProposalCreated(_) => "proposal_created",
            GovernorEventKind::ProposalCanceled => "proposal_canceled",
            GovernorEventKind::ProposalVotingClosed(_) => "proposal_voting_closed",
            GovernorEventKind::ProposalExecuted => "proposal_executed",
            GovernorEventKind::ProposalExpired => "proposal_expired",
            GovernorEventKind::VoteCast(_) => "vote_cast",
        }
    }

    /// The payload as a JSON object string. Kinds without a payload
    /// serialize to `{}`.
    pub fn data_json(&self) -> Result<String, serde_json::Error> {
        match self {
            GovernorEventKind::ProposalCreated(data) => serde_json::to_string(data),
            GovernorEventKind::ProposalVotingClosed(data) => serde_json::to_string(data),
            GovernorEventKind::VoteCast(data) => serde_json::to_string(data),
            GovernorEventKind::ProposalCanceled
            | GovernorEventKind::ProposalExecuted
            | GovernorEventKind::ProposalExpired => Ok("{}".to_string()),
        }
    }
}

/// A decoded governance event, positioned in the chain.
#[derive(Clone, Debug, PartialEq)]
pub struct GovernorEvent {
    /// Unique, order-preserving identifier (see `gavel_types::event_id`).
    pub event_id: String,
    /// Strkey address of the emitting contract.
    pub contract_id: String,
    pub proposal_id: u32,
    pub kind: GovernorEventKind,
    pub tx_hash: String,
    pub ledger_seq: u32,
    pub ledger_close_time: i64,
}

impl GovernorEvent {
    /// The key of the proposal this event refers to.
    pub fn proposal_key(&self) -> String {
        encode_proposal_key(&self.contract_id, self.proposal_id)
    }

    /// Decode a raw contract event into a governor event.
    ///
    /// Envelopes that do not look like governor events at all fail with
    /// [`DecodeError::Format`]; envelopes that match a recognized kind
    /// but carry a malformed field fail with [`DecodeError::Parsing`].
    pub fn decode(
        event: &ContractEvent,
        ctx: &EventContext<'_>,
    ) -> Result<Self, DecodeError> {
        if event.kind != ContractEventKind::Contract {
            return Err(DecodeError::Format("not a contract event".into()));
        }
        let contract = event
            .contract
            .ok_or_else(|| DecodeError::Format("event carries no contract id".into()))?;
        let body = event
            .body_v0()
            .ok_or_else(|| DecodeError::Format("unrecognized event body version".into()))?;

        let contract_id = Address::Contract(contract).to_strkey();
        let event_id =
            encode_event_id(ctx.ledger_seq, ctx.tx_index, ctx.op_index, ctx.event_index);

        if body.topics.len() < 2 {
            return Err(DecodeError::Format("not a governor event".into()));
        }
        let event_type = body.topics[0]
            .as_sym()
            .ok_or_else(|| DecodeError::Format("event type topic is not a symbol".into()))?;
        let proposal_id = body.topics[1]
            .as_u32()
            .ok_or_else(|| DecodeError::Format("proposal id topic is not a u32".into()))?;

        let kind = match event_type {
            "proposal_created" => {
                GovernorEventKind::ProposalCreated(decode_proposal_created(body)?)
            }
            "proposal_canceled" => GovernorEventKind::ProposalCanceled,
            "proposal_voting_closed" => {
                GovernorEventKind::ProposalVotingClosed(decode_voting_closed(body)?)
            }
            "proposal_executed" => GovernorEventKind::ProposalExecuted,
            "proposal_expired" => GovernorEventKind::ProposalExpired,
            "vote_cast" => GovernorEventKind::VoteCast(decode_vote_cast(body)?),
            other => {
                return Err(DecodeError::Format(format!("invalid event type {other}")));
            }
        };

        Ok(GovernorEvent {
            event_id,
            contract_id,
            proposal_id,
            kind,
            tx_hash: ctx.tx_hash.to_string(),
            ledger_seq: ctx.ledger_seq,
            ledger_close_time: ctx.ledger_close_time,
        })
    }
}

/// topics: [sym, proposal_id, proposer]
/// data:   vec of [title: str, desc: str, action: any, vote_start: u32, vote_end: u32]
fn decode_proposal_created(body: &ContractEventV0) -> Result<ProposalCreatedData, DecodeError> {
    if body.topics.len() != 3 {
        return Err(DecodeError::Format(format!(
            "unexpected number of topics {} in proposal_created event",
            body.topics.len()
        )));
    }
    let proposer = body.topics[2]
        .as_address()
        .ok_or_else(|| DecodeError::Format("proposer topic is not an address".into()))?
        .to_strkey();

    let entries = body
        .data
        .as_vec()
        .ok_or_else(|| DecodeError::Parsing("proposal_created data is not a vec".into()))?;
    if entries.len() != 5 {
        return Err(DecodeError::Parsing(format!(
            "unexpected number of fields {} in proposal_created data",
            entries.len()
        )));
    }

    let title = entries[0]
        .as_str()
        .ok_or_else(|| DecodeError::Parsing("title is not a str".into()))?
        .to_string();
    let desc = entries[1]
        .as_str()
        .ok_or_else(|| DecodeError::Parsing("desc is not a str".into()))?
        .to_string();
    let action_bytes = bincode::serialize(&entries[2])
        .map_err(|e| DecodeError::Parsing(format!("failed to serialize action: {e}")))?;
    let action = BASE64.encode(action_bytes);
    let vote_start = entries[3]
        .as_u32()
        .ok_or_else(|| DecodeError::Parsing("vote_start is not a u32".into()))?;
    let vote_end = entries[4]
        .as_u32()
        .ok_or_else(|| DecodeError::Parsing("vote_end is not a u32".into()))?;

    Ok(ProposalCreatedData {
        proposer,
        title,
        desc,
        action,
        vote_start,
        vote_end,
    })
}

/// topics: [sym, proposal_id, status: u32, eta: u32]
/// data:   map of exactly {_for: i128, against: i128, abstain: i128}
fn decode_voting_closed(
    body: &ContractEventV0,
) -> Result<ProposalVotingClosedData, DecodeError> {
    if body.topics.len() != 4 {
        return Err(DecodeError::Format(format!(
            "unexpected number of topics {} in proposal_voting_closed event",
            body.topics.len()
        )));
    }
    let status = body.topics[2]
        .as_u32()
        .ok_or_else(|| DecodeError::Format("status topic is not a u32".into()))?;
    let eta = body.topics[3]
        .as_u32()
        .ok_or_else(|| DecodeError::Format("eta topic is not a u32".into()))?;
    let final_votes = decode_vote_count(&body.data)?;

    Ok(ProposalVotingClosedData {
        status,
        eta,
        final_votes,
    })
}

fn decode_vote_count(data: &Val) -> Result<VoteCount, DecodeError> {
    let entries = data
        .as_map()
        .ok_or_else(|| DecodeError::Parsing("vote count is not a map".into()))?;

    let mut votes_for = None;
    let mut against = None;
    let mut abstain = None;
    for (key, value) in entries {
        let key = key
            .as_sym()
            .ok_or_else(|| DecodeError::Parsing("vote count key is not a symbol".into()))?;
        let value = value.as_i128().ok_or_else(|| {
            DecodeError::Parsing(format!("vote count entry {key} is not an i128"))
        })?;
        let slot = match key {
            "_for" => &mut votes_for,
            "against" => &mut against,
            "abstain" => &mut abstain,
            other => {
                return Err(DecodeError::Parsing(format!(
                    "unknown vote count key {other}"
                )));
            }
        };
        if slot.replace(value.to_string()).is_some() {
            return Err(DecodeError::Parsing(format!(
                "duplicate vote count key {key}"
            )));
        }
    }

    match (votes_for, against, abstain) {
        (Some(votes_for), Some(against), Some(abstain)) => Ok(VoteCount {
            votes_for,
            against,
            abstain,
        }),
        _ => Err(DecodeError::Parsing(
            "missing required vote count entries".into(),
        )),
    }
}

/// topics: [sym, proposal_id, voter]
/// data:   vec of [support: u32, amount: i128]
fn decode_vote_cast(body: &ContractEventV0) -> Result<VoteCastData, DecodeError> {
    if body.topics.len() != 3 {
        return Err(DecodeError::Format(format!(
            "unexpected number of topics {} in vote_cast event",
            body.topics.len()
        )));
    }
    let voter = body.topics[2]
        .as_address()
        .ok_or_else(|| DecodeError::Format("voter topic is not an address".into()))?
        .to_strkey();

    let entries = body
        .data
        .as_vec()
        .ok_or_else(|| DecodeError::Parsing("vote_cast data is not a vec".into()))?;
    if entries.len() != 2 {
        return Err(DecodeError::Parsing(format!(
            "unexpected number of fields {} in vote_cast data",
            entries.len()
        )));
    }

    let support = entries[0]
        .as_u32()
        .ok_or_else(|| DecodeError::Parsing("support is not a u32".into()))?;
    let amount = entries[1]
        .as_i128()
        .ok_or_else(|| DecodeError::Parsing("amount is not an i128".into()))?
        .to_string();

    Ok(VoteCastData {
        voter,
        support,
        amount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use gavel_ledger::{ContractEventBody, ContractEventKind};

    const CONTRACT: [u8; 32] = [0xC0; 32];
    const PROPOSER: [u8; 32] = [0xA1; 32];

    fn envelope(topics: Vec<Val>, data: Val) -> ContractEvent {
        ContractEvent {
            kind: ContractEventKind::Contract,
            contract: Some(CONTRACT),
            body: ContractEventBody::V0(ContractEventV0 { topics, data }),
        }
    }

    fn ctx() -> EventContext<'static> {
        EventContext {
            tx_hash: "caa081584805c84f4e74b904b201fe765c16f7e3ed784d87e8dd531c621c62db",
            ledger_seq: 1_170_234,
            ledger_close_time: 1_761_053_041,
            tx_index: 4,
            op_index: 0,
            event_index: 1,
        }
    }

    fn created_envelope() -> ContractEvent {
        envelope(
            vec![
                Val::Sym("proposal_created".into()),
                Val::U32(7),
                Val::Address(Address::Account(PROPOSER)),
            ],
            Val::Vec(vec![
                Val::Str("Fund the relay".into()),
                Val::Str("Covers Q3 operating costs".into()),
                Val::Bytes(vec![1, 2, 3, 4]),
                Val::U32(100),
                Val::U32(200),
            ]),
        )
    }

    #[test]
    fn decodes_proposal_created() {
        let event = GovernorEvent::decode(&created_envelope(), &ctx()).unwrap();
        assert_eq!(event.contract_id, Address::Contract(CONTRACT).to_strkey());
        assert_eq!(event.proposal_id, 7);
        assert_eq!(
            event.event_id,
            gavel_types::encode_event_id(1_170_234, 4, 0, 1)
        );
        assert_eq!(event.tx_hash, ctx().tx_hash);
        assert_eq!(event.ledger_seq, 1_170_234);
        assert_eq!(event.ledger_close_time, 1_761_053_041);

        let GovernorEventKind::ProposalCreated(data) = &event.kind else {
            panic!("wrong kind: {:?}", event.kind);
        };
        assert_eq!(data.proposer, Address::Account(PROPOSER).to_strkey());
        assert_eq!(data.title, "Fund the relay");
        assert_eq!(data.desc, "Covers Q3 operating costs");
        assert_eq!(data.vote_start, 100);
        assert_eq!(data.vote_end, 200);
        // The action is opaque but must be valid base64.
        assert!(BASE64.decode(&data.action).is_ok());
    }

    #[test]
    fn created_data_json_uses_wire_field_names() {
        let event = GovernorEvent::decode(&created_envelope(), &ctx()).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&event.kind.data_json().unwrap()).unwrap();
        assert_eq!(json["title"], "Fund the relay");
        assert_eq!(json["desc"], "Covers Q3 operating costs");
        assert_eq!(json["vote_start"], 100);
        assert_eq!(json["vote_end"], 200);
        assert!(json["proposer"].as_str().unwrap().starts_with('G'));
    }

    #[test]
    fn decodes_payloadless_kinds() {
        for (name, expected) in [
            ("proposal_canceled", GovernorEventKind::ProposalCanceled),
            ("proposal_executed", GovernorEventKind::ProposalExecuted),
            ("proposal_expired", GovernorEventKind::ProposalExpired),
        ] {
            let ev = envelope(
                vec![Val::Sym(name.into()), Val::U32(3)],
                Val::Vec(Vec::new()),
            );
            let decoded = GovernorEvent::decode(&ev, &ctx()).unwrap();
            assert_eq!(decoded.kind, expected);
            assert_eq!(decoded.kind.data_json().unwrap(), "{}");
        }
    }

    #[test]
    fn decodes_voting_closed() {
        let ev = envelope(
            vec![
                Val::Sym("proposal_voting_closed".into()),
                Val::U32(3),
                Val::U32(1),
                Val::U32(1_120_234),
            ],
            Val::Map(vec![
                (Val::Sym("_for".into()), Val::I128(50_230_000_000)),
                (Val::Sym("against".into()), Val::I128(20_000_000_000)),
                (Val::Sym("abstain".into()), Val::I128(123)),
            ]),
        );
        let decoded = GovernorEvent::decode(&ev, &ctx()).unwrap();
        let GovernorEventKind::ProposalVotingClosed(data) = &decoded.kind else {
            panic!("wrong kind");
        };
        assert_eq!(data.status, 1);
        assert_eq!(data.eta, 1_120_234);
        assert_eq!(data.final_votes.votes_for, "50230000000");
        assert_eq!(data.final_votes.against, "20000000000");
        assert_eq!(data.final_votes.abstain, "123");

        // JSON renders `_for` under the key "for".
        let json: serde_json::Value =
            serde_json::from_str(&decoded.kind.data_json().unwrap()).unwrap();
        assert_eq!(json["final_votes"]["for"], "50230000000");
    }

    #[test]
    fn decodes_vote_cast_with_negative_amount_verbatim() {
        let ev = envelope(
            vec![
                Val::Sym("vote_cast".into()),
                Val::U32(3),
                Val::Address(Address::Account(PROPOSER)),
            ],
            Val::Vec(vec![Val::U32(1), Val::I128(-42)]),
        );
        let decoded = GovernorEvent::decode(&ev, &ctx()).unwrap();
        let GovernorEventKind::VoteCast(data) = &decoded.kind else {
            panic!("wrong kind");
        };
        // The decoder renders the raw chain value; sign enforcement is
        // the applier's job.
        assert_eq!(data.amount, "-42");
        assert_eq!(data.support, 1);
    }

    #[test]
    fn non_contract_kinds_are_format_errors() {
        let mut ev = created_envelope();
        ev.kind = ContractEventKind::Diagnostic;
        assert!(GovernorEvent::decode(&ev, &ctx()).unwrap_err().is_format());

        let mut ev = created_envelope();
        ev.contract = None;
        assert!(GovernorEvent::decode(&ev, &ctx()).unwrap_err().is_format());

        let mut ev = created_envelope();
        ev.body = ContractEventBody::Unsupported { version: 1 };
        assert!(GovernorEvent::decode(&ev, &ctx()).unwrap_err().is_format());
    }

    #[test]
    fn unrecognized_symbols_and_topics_are_format_errors() {
        // Too few topics.
        let ev = envelope(vec![Val::Sym("vote_cast".into())], Val::Vec(Vec::new()));
        assert!(GovernorEvent::decode(&ev, &ctx()).unwrap_err().is_format());

        // Not our contract's vocabulary.
        let ev = envelope(
            vec![Val::Sym("transfer".into()), Val::U32(1)],
            Val::Vec(Vec::new()),
        );
        assert!(GovernorEvent::decode(&ev, &ctx()).unwrap_err().is_format());

        // Proposal id topic has the wrong type.
        let ev = envelope(
            vec![Val::Sym("vote_cast".into()), Val::Str("1".into())],
            Val::Vec(Vec::new()),
        );
        assert!(GovernorEvent::decode(&ev, &ctx()).unwrap_err().is_format());
    }

    #[test]
    fn malformed_payloads_are_parsing_errors() {
        // proposal_created with a 4-field payload.
        let ev = envelope(
            vec![
                Val::Sym("proposal_created".into()),
                Val::U32(7),
                Val::Address(Address::Account(PROPOSER)),
            ],
            Val::Vec(vec![
                Val::Str("t".into()),
                Val::Str("d".into()),
                Val::Bytes(Vec::new()),
                Val::U32(1),
            ]),
        );
        let err = GovernorEvent::decode(&ev, &ctx()).unwrap_err();
        assert!(!err.is_format(), "expected parsing error, got {err:?}");

        // vote_cast whose support field is an i128.
        let ev = envelope(
            vec![
                Val::Sym("vote_cast".into()),
                Val::U32(3),
                Val::Address(Address::Account(PROPOSER)),
            ],
            Val::Vec(vec![Val::I128(1), Val::I128(10)]),
        );
        assert!(!GovernorEvent::decode(&ev, &ctx()).unwrap_err().is_format());
    }

    #[test]
    fn vote_count_map_is_strict() {
        let base_topics = vec![
            Val::Sym("proposal_voting_closed".into()),
            Val::U32(3),
            Val::U32(1),
            Val::U32(99),
        ];

        // Missing key.
        let ev = envelope(
            base_topics.clone(),
            Val::Map(vec![
                (Val::Sym("_for".into()), Val::I128(1)),
                (Val::Sym("against".into()), Val::I128(2)),
            ]),
        );
        assert!(!GovernorEvent::decode(&ev, &ctx()).unwrap_err().is_format());

        // Unknown key.
        let ev = envelope(
            base_topics.clone(),
            Val::Map(vec![
                (Val::Sym("_for".into()), Val::I128(1)),
                (Val::Sym("against".into()), Val::I128(2)),
                (Val::Sym("quorum".into()), Val::I128(3)),
            ]),
        );
        assert!(!GovernorEvent::decode(&ev, &ctx()).unwrap_err().is_format());

        // Duplicate key.
        let ev = envelope(
            base_topics,
            Val::Map(vec![
                (Val::Sym("_for".into()), Val::I128(1)),
                (Val::Sym("_for".into()), Val::I128(2)),
                (Val::Sym("against".into()), Val::I128(3)),
                (Val::Sym("abstain".into()), Val::I128(4)),
            ]),
        );
        assert!(!GovernorEvent::decode(&ev, &ctx()).unwrap_err().is_format());
    }

    #[test]
    fn proposal_key_joins_contract_and_id() {
        let event = GovernorEvent::decode(&created_envelope(), &ctx()).unwrap();
        assert_eq!(
            event.proposal_key(),
            format!("{}-7", event.contract_id)
        );
    }
}
