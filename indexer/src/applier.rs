//! The per-event state machine over proposal and vote aggregates.

use gavel_governor::{
    GovernorEvent, GovernorEventKind, Proposal, ProposalStatus, ProposalVotingClosedData, Vote,
    VoteCastData,
};
use gavel_store::{EventRecord, GovernorStore};
use gavel_types::Tally;

use crate::error::ApplyError;
use crate::observer::IndexerObserver;

/// Applies decoded governor events to aggregate state.
///
/// # Ordering contract
///
/// The applier requires single-writer, in-order invocation per proposal:
/// tally accumulation is a non-atomic read-modify-write, and applying
/// events for the same proposal concurrently or out of order corrupts
/// the tallies. The ingestion service satisfies this by processing
/// ledgers, and events within a ledger, strictly sequentially.
///
/// Every apply starts by inserting the event into the immutable history
/// (idempotent on event id), so the aggregate tables can be rebuilt by
/// replaying history from genesis.
pub struct EventApplier<'a, S: ?Sized> {
    store: &'a S,
    observer: &'a dyn IndexerObserver,
}

impl<'a, S: GovernorStore + ?Sized> EventApplier<'a, S> {
    pub fn new(store: &'a S, observer: &'a dyn IndexerObserver) -> Self {
        Self { store, observer }
    }

    /// Apply one event. `Ok` covers both mutations and deliberate
    /// no-ops (redeliveries, wrong-status events); `Err` means the
    /// event violated a precondition or the store failed.
    pub fn apply(&self, event: &GovernorEvent) -> Result<(), ApplyError> {
        self.store.insert_event(&EventRecord::from_event(event)?)?;

        let proposal = self.store.get_proposal(&event.proposal_key())?;

        match &event.kind {
            GovernorEventKind::ProposalCreated(data) => {
                let candidate = Proposal::from_created_event(event, data);
                match proposal {
                    None => {
                        self.store.upsert_proposal(&candidate)?;
                    }
                    Some(existing) => {
                        if existing.identity_matches(&candidate) {
                            // Redelivery of the creation we already
                            // applied, not a conflicting second one.
                            self.observer
                                .event_noop(event, "duplicate proposal_created redelivery");
                            return Ok(());
                        }
                        return Err(ApplyError::Application(format!(
                            "proposal_created event for existing proposal {} with status {}",
                            existing.proposal_key,
                            u32::from(existing.status)
                        )));
                    }
                }
            }
            GovernorEventKind::ProposalCanceled => {
                let mut proposal = proposal.ok_or_else(|| missing(event))?;
                if proposal.status != ProposalStatus::Active {
                    self.observer.event_noop(event, "proposal not active");
                    return Ok(());
                }
                proposal.status = ProposalStatus::Canceled;
                self.store.upsert_proposal(&proposal)?;
            }
            GovernorEventKind::ProposalVotingClosed(data) => {
                let mut proposal = proposal.ok_or_else(|| missing(event))?;
                if proposal.status != ProposalStatus::Active {
                    self.observer.event_noop(event, "proposal not active");
                    return Ok(());
                }
                self.close_voting(&mut proposal, data)?;
                self.store.upsert_proposal(&proposal)?;
            }
            GovernorEventKind::ProposalExecuted => {
                let mut proposal = proposal.ok_or_else(|| missing(event))?;
                if proposal.status == ProposalStatus::Executed {
                    self.observer.event_noop(event, "proposal already executed");
                    return Ok(());
                }
                proposal.status = ProposalStatus::Executed;
                proposal.execution_tx_hash = event.tx_hash.clone();
                self.store.upsert_proposal(&proposal)?;
            }
            GovernorEventKind::ProposalExpired => {
                let mut proposal = proposal.ok_or_else(|| missing(event))?;
                if proposal.status != ProposalStatus::Active
                    && proposal.status != ProposalStatus::Successful
                {
                    self.observer.event_noop(event, "proposal not expirable");
                    return Ok(());
                }
                proposal.status = ProposalStatus::Expired;
                self.store.upsert_proposal(&proposal)?;
            }
            GovernorEventKind::VoteCast(data) => {
                let mut proposal = proposal.ok_or_else(|| missing(event))?;
                if proposal.status != ProposalStatus::Active {
                    self.observer.event_noop(event, "proposal not active");
                    return Ok(());
                }
                if self.store.get_vote(&event.tx_hash)?.is_some() {
                    self.observer.event_noop(event, "vote already recorded");
                    return Ok(());
                }
                self.count_vote(&mut proposal, event, data)?;
                self.store.upsert_proposal(&proposal)?;
            }
        }

        self.observer.event_applied(event);
        Ok(())
    }

    /// Adopt the contract's final status and authoritative tallies.
    fn close_voting(
        &self,
        proposal: &mut Proposal,
        data: &ProposalVotingClosedData,
    ) -> Result<(), ApplyError> {
        proposal.status = ProposalStatus::try_from(data.status)
            .map_err(|e| ApplyError::Application(e.to_string()))?;
        proposal.votes_for = parse_tally(&data.final_votes.votes_for, "final votes_for")?;
        proposal.votes_against = parse_tally(&data.final_votes.against, "final votes_against")?;
        proposal.votes_abstain = parse_tally(&data.final_votes.abstain, "final votes_abstain")?;
        proposal.execution_unlock = data.eta;
        Ok(())
    }

    /// Fold the vote amount into the matching tally and record the vote.
    fn count_vote(
        &self,
        proposal: &mut Proposal,
        event: &GovernorEvent,
        data: &VoteCastData,
    ) -> Result<(), ApplyError> {
        let amount = Tally::parse(&data.amount).map_err(|e| {
            ApplyError::Application(format!("invalid amount in vote_cast event: {e}"))
        })?;

        let tally_field = match data.support {
            0 => &mut proposal.votes_against,
            1 => &mut proposal.votes_for,
            2 => &mut proposal.votes_abstain,
            other => {
                return Err(ApplyError::Application(format!(
                    "invalid support value {other} in vote_cast event"
                )));
            }
        };
        let mut total = Tally::parse(tally_field).map_err(|e| {
            ApplyError::Application(format!(
                "invalid stored tally in proposal {}: {e}",
                proposal.proposal_key
            ))
        })?;
        total.accumulate(&amount);
        *tally_field = total.to_string();

        self.store
            .insert_vote(&Vote::from_vote_cast_event(event, data))?;
        Ok(())
    }
}

fn missing(event: &GovernorEvent) -> ApplyError {
    ApplyError::Application(format!(
        "{} event for non-existing proposal {}-{}",
        event.kind.name(),
        event.contract_id,
        event.proposal_id
    ))
}

fn parse_tally(input: &str, field: &str) -> Result<String, ApplyError> {
    Tally::parse(input)
        .map(|t| t.to_string())
        .map_err(|e| ApplyError::Application(format!("invalid {field}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::NullObserver;
    use gavel_governor::{ProposalCreatedData, VoteCount};
    use gavel_store::{EventStore, ProposalStore, VoteStore};
    use gavel_store_memory::MemoryStore;
    use gavel_types::encode_event_id;

    const CONTRACT: &str = "CDAO6Q5MAFH2A5PMQORP5G56UWDDJ5THCHU2GXWEJ6V75VXCPU2PZYPB";
    const PROPOSER: &str = "GAQ3OLLBLCO2DZZJHKB2GJNDI445NYNIOP7SMPRDYRUMWWR7YRF2CYVO";
    const VOTER: &str = "GAWJ7THLA3VEV6D2AXCJ5ZFCIPY2LBYJGFDRV3OYKCVVJKAB6TTOLZ5Q";
    const LEDGER_SEQ: u32 = 1_170_234;
    const CLOSE_TIME: i64 = 1_761_053_041;
    const TX_HASH: &str = "e65cfb5071126dc0a21b9d77f6d26a9d5788edf1cb6aac8de6e478273c1957f5";
    const VOTE_TX_HASH: &str = "caa081584805c84f4e74b904b201fe765c16f7e3ed784d87e8dd531c621c62db";

    fn seeded_proposal(proposal_id: u32, status: ProposalStatus) -> Proposal {
        Proposal {
            proposal_key: format!("{CONTRACT}-{proposal_id}"),
            contract_id: CONTRACT.to_string(),
            proposal_id,
            proposer: PROPOSER.to_string(),
            status,
            title: format!("Proposal {proposal_id}"),
            description: "seeded".into(),
            action: "AAAA".into(),
            vote_start: LEDGER_SEQ - 10_000,
            vote_end: LEDGER_SEQ,
            votes_for: "12314122341234".into(),
            votes_against: "1234123412434".into(),
            votes_abstain: "1923114243".into(),
            execution_unlock: 0,
            execution_tx_hash: String::new(),
        }
    }

    /// Store seeded with one proposal per interesting status:
    /// 0 executed, 1 successful, 2 defeated, 3 active.
    fn setup_store() -> MemoryStore {
        let store = MemoryStore::new();
        for (id, status) in [
            (0, ProposalStatus::Executed),
            (1, ProposalStatus::Successful),
            (2, ProposalStatus::Defeated),
            (3, ProposalStatus::Active),
        ] {
            store.upsert_proposal(&seeded_proposal(id, status)).unwrap();
        }
        store
    }

    fn event(proposal_id: u32, kind: GovernorEventKind) -> GovernorEvent {
        GovernorEvent {
            event_id: encode_event_id(LEDGER_SEQ, 1, 0, 0),
            contract_id: CONTRACT.to_string(),
            proposal_id,
            kind,
            tx_hash: TX_HASH.to_string(),
            ledger_seq: LEDGER_SEQ,
            ledger_close_time: CLOSE_TIME,
        }
    }

    fn created_data() -> ProposalCreatedData {
        ProposalCreatedData {
            proposer: VOTER.to_string(),
            title: "Make me security council".into(),
            desc: "plz".into(),
            action: "AAAAEA==".into(),
            vote_start: LEDGER_SEQ + 1_000,
            vote_end: LEDGER_SEQ + 21_000,
        }
    }

    fn vote_cast(proposal_id: u32, support: u32, amount: &str) -> GovernorEvent {
        let mut ev = event(
            proposal_id,
            GovernorEventKind::VoteCast(VoteCastData {
                voter: VOTER.to_string(),
                support,
                amount: amount.to_string(),
            }),
        );
        ev.tx_hash = VOTE_TX_HASH.to_string();
        ev
    }

    fn apply(store: &MemoryStore, event: &GovernorEvent) -> Result<(), ApplyError> {
        EventApplier::new(store, &NullObserver).apply(event)
    }

    #[test]
    fn created_inserts_active_proposal_with_zero_tallies() {
        let store = setup_store();
        let ev = event(4, GovernorEventKind::ProposalCreated(created_data()));
        apply(&store, &ev).unwrap();

        let proposal = store
            .get_proposal(&format!("{CONTRACT}-4"))
            .unwrap()
            .unwrap();
        assert_eq!(proposal.status, ProposalStatus::Active);
        assert_eq!(proposal.proposer, VOTER);
        assert_eq!(proposal.title, "Make me security council");
        assert_eq!(proposal.votes_for, "0");
        assert_eq!(proposal.votes_against, "0");
        assert_eq!(proposal.votes_abstain, "0");
        assert_eq!(proposal.vote_start, LEDGER_SEQ + 1_000);

        // The event is also in the history.
        assert!(store.get_event(&ev.event_id).unwrap().is_some());
    }

    #[test]
    fn created_for_existing_proposal_fails_and_leaves_it_unmodified() {
        let store = setup_store();
        let before = store
            .get_proposal(&format!("{CONTRACT}-3"))
            .unwrap()
            .unwrap();

        let ev = event(3, GovernorEventKind::ProposalCreated(created_data()));
        let err = apply(&store, &ev).unwrap_err();
        assert!(matches!(err, ApplyError::Application(_)));

        let after = store
            .get_proposal(&format!("{CONTRACT}-3"))
            .unwrap()
            .unwrap();
        assert_eq!(after, before);
        // The conflicting event is still durably recorded.
        assert!(store.get_event(&ev.event_id).unwrap().is_some());
    }

    #[test]
    fn created_identical_redelivery_is_a_noop() {
        let store = setup_store();
        let ev = event(4, GovernorEventKind::ProposalCreated(created_data()));
        apply(&store, &ev).unwrap();

        // Cast a vote so the replayed creation would be observable if it
        // reset anything.
        // (Status stays Active so votes count.)
        let vote = vote_cast(4, 1, "500");
        apply(&store, &vote).unwrap();

        apply(&store, &ev).unwrap();
        let proposal = store
            .get_proposal(&format!("{CONTRACT}-4"))
            .unwrap()
            .unwrap();
        assert_eq!(proposal.votes_for, "500");
    }

    #[test]
    fn canceled_moves_active_to_canceled() {
        let store = setup_store();
        apply(&store, &event(3, GovernorEventKind::ProposalCanceled)).unwrap();
        let proposal = store
            .get_proposal(&format!("{CONTRACT}-3"))
            .unwrap()
            .unwrap();
        assert_eq!(proposal.status, ProposalStatus::Canceled);
        // Tallies untouched.
        assert_eq!(proposal.votes_for, "12314122341234");
    }

    #[test]
    fn canceled_without_proposal_fails() {
        let store = setup_store();
        let err = apply(&store, &event(9, GovernorEventKind::ProposalCanceled)).unwrap_err();
        assert!(matches!(err, ApplyError::Application(_)));
    }

    #[test]
    fn canceled_on_non_active_proposal_is_a_noop() {
        let store = setup_store();
        let before = store
            .get_proposal(&format!("{CONTRACT}-2"))
            .unwrap()
            .unwrap();
        apply(&store, &event(2, GovernorEventKind::ProposalCanceled)).unwrap();
        let after = store
            .get_proposal(&format!("{CONTRACT}-2"))
            .unwrap()
            .unwrap();
        assert_eq!(after, before);
    }

    fn voting_closed(status: u32) -> GovernorEventKind {
        GovernorEventKind::ProposalVotingClosed(ProposalVotingClosedData {
            status,
            eta: 1_120_234,
            final_votes: VoteCount {
                votes_for: "50230000000".into(),
                against: "20000000000".into(),
                abstain: "123".into(),
            },
        })
    }

    #[test]
    fn voting_closed_adopts_status_and_final_tallies() {
        let store = setup_store();
        apply(&store, &event(3, voting_closed(1))).unwrap();
        let proposal = store
            .get_proposal(&format!("{CONTRACT}-3"))
            .unwrap()
            .unwrap();
        assert_eq!(proposal.status, ProposalStatus::Successful);
        assert_eq!(proposal.votes_for, "50230000000");
        assert_eq!(proposal.votes_against, "20000000000");
        assert_eq!(proposal.votes_abstain, "123");
        assert_eq!(proposal.execution_unlock, 1_120_234);
    }

    #[test]
    fn voting_closed_rejects_unknown_status_value() {
        let store = setup_store();
        let err = apply(&store, &event(3, voting_closed(9))).unwrap_err();
        assert!(matches!(err, ApplyError::Application(_)));
    }

    #[test]
    fn voting_closed_rejects_negative_final_tally() {
        let store = setup_store();
        let kind = GovernorEventKind::ProposalVotingClosed(ProposalVotingClosedData {
            status: 1,
            eta: 0,
            final_votes: VoteCount {
                votes_for: "-1".into(),
                against: "0".into(),
                abstain: "0".into(),
            },
        });
        let err = apply(&store, &event(3, kind)).unwrap_err();
        assert!(matches!(err, ApplyError::Application(_)));
    }

    #[test]
    fn voting_closed_on_non_active_proposal_is_a_noop() {
        let store = setup_store();
        let before = store
            .get_proposal(&format!("{CONTRACT}-1"))
            .unwrap()
            .unwrap();
        apply(&store, &event(1, voting_closed(1))).unwrap();
        assert_eq!(
            store
                .get_proposal(&format!("{CONTRACT}-1"))
                .unwrap()
                .unwrap(),
            before
        );
    }

    #[test]
    fn executed_sets_status_and_tx_hash_once() {
        let store = setup_store();
        apply(&store, &event(1, GovernorEventKind::ProposalExecuted)).unwrap();
        let proposal = store
            .get_proposal(&format!("{CONTRACT}-1"))
            .unwrap()
            .unwrap();
        assert_eq!(proposal.status, ProposalStatus::Executed);
        assert_eq!(proposal.execution_tx_hash, TX_HASH);

        // Second execution is a no-op: the original trigger wins.
        let mut replay = event(1, GovernorEventKind::ProposalExecuted);
        replay.tx_hash = "00".repeat(32);
        apply(&store, &replay).unwrap();
        let proposal = store
            .get_proposal(&format!("{CONTRACT}-1"))
            .unwrap()
            .unwrap();
        assert_eq!(proposal.execution_tx_hash, TX_HASH);
    }

    #[test]
    fn executed_without_proposal_fails() {
        let store = setup_store();
        let err = apply(&store, &event(9, GovernorEventKind::ProposalExecuted)).unwrap_err();
        assert!(matches!(err, ApplyError::Application(_)));
    }

    #[test]
    fn expired_applies_to_active_and_successful_only() {
        let store = setup_store();

        apply(&store, &event(3, GovernorEventKind::ProposalExpired)).unwrap();
        assert_eq!(
            store
                .get_proposal(&format!("{CONTRACT}-3"))
                .unwrap()
                .unwrap()
                .status,
            ProposalStatus::Expired
        );

        apply(&store, &event(1, GovernorEventKind::ProposalExpired)).unwrap();
        assert_eq!(
            store
                .get_proposal(&format!("{CONTRACT}-1"))
                .unwrap()
                .unwrap()
                .status,
            ProposalStatus::Expired
        );

        // Defeated proposals don't expire.
        apply(&store, &event(2, GovernorEventKind::ProposalExpired)).unwrap();
        assert_eq!(
            store
                .get_proposal(&format!("{CONTRACT}-2"))
                .unwrap()
                .unwrap()
                .status,
            ProposalStatus::Defeated
        );
    }

    #[test]
    fn vote_cast_accumulates_with_arbitrary_precision() {
        let store = setup_store();
        apply(&store, &vote_cast(3, 1, "20000000000")).unwrap();

        let proposal = store
            .get_proposal(&format!("{CONTRACT}-3"))
            .unwrap()
            .unwrap();
        // 12314122341234 + 20000000000, which overflows no 32-bit lane
        // boundary a fixed-width cast might hide.
        assert_eq!(proposal.votes_for, "12334122341234");
        assert_eq!(proposal.votes_against, "1234123412434");

        let vote = store.get_vote(VOTE_TX_HASH).unwrap().unwrap();
        assert_eq!(vote.voter, VOTER);
        assert_eq!(vote.support, 1);
        assert_eq!(vote.amount, "20000000000");
        assert_eq!(vote.ledger_seq, LEDGER_SEQ);
        assert_eq!(vote.ledger_close_time, CLOSE_TIME);
    }

    #[test]
    fn vote_cast_routes_by_support_value() {
        let store = setup_store();

        let mut against = vote_cast(3, 0, "100");
        against.tx_hash = "11".repeat(32);
        against.event_id = encode_event_id(LEDGER_SEQ, 2, 0, 0);
        apply(&store, &against).unwrap();

        let mut abstain = vote_cast(3, 2, "7");
        abstain.tx_hash = "22".repeat(32);
        abstain.event_id = encode_event_id(LEDGER_SEQ, 3, 0, 0);
        apply(&store, &abstain).unwrap();

        let proposal = store
            .get_proposal(&format!("{CONTRACT}-3"))
            .unwrap()
            .unwrap();
        assert_eq!(proposal.votes_against, "1234123412534");
        assert_eq!(proposal.votes_abstain, "1923114250");
        assert_eq!(proposal.votes_for, "12314122341234");
    }

    #[test]
    fn vote_cast_with_invalid_support_fails() {
        let store = setup_store();
        let err = apply(&store, &vote_cast(3, 3, "100")).unwrap_err();
        assert!(matches!(err, ApplyError::Application(_)));
        // No vote recorded, tallies untouched.
        assert!(store.get_vote(VOTE_TX_HASH).unwrap().is_none());
        assert_eq!(
            store
                .get_proposal(&format!("{CONTRACT}-3"))
                .unwrap()
                .unwrap()
                .votes_for,
            "12314122341234"
        );
    }

    #[test]
    fn vote_cast_with_unparsable_amount_fails() {
        let store = setup_store();
        for amount in ["-42", "abc", ""] {
            let err = apply(&store, &vote_cast(3, 1, amount)).unwrap_err();
            assert!(matches!(err, ApplyError::Application(_)), "{amount:?}");
        }
        assert!(store.get_vote(VOTE_TX_HASH).unwrap().is_none());
    }

    #[test]
    fn vote_cast_redelivery_does_not_recount() {
        let store = setup_store();
        let ev = vote_cast(3, 1, "20000000000");
        apply(&store, &ev).unwrap();
        apply(&store, &ev).unwrap();

        let proposal = store
            .get_proposal(&format!("{CONTRACT}-3"))
            .unwrap()
            .unwrap();
        assert_eq!(proposal.votes_for, "12334122341234");
    }

    #[test]
    fn vote_cast_on_non_active_proposal_is_a_noop() {
        let store = setup_store();
        apply(&store, &vote_cast(2, 1, "100")).unwrap();
        assert!(store.get_vote(VOTE_TX_HASH).unwrap().is_none());
        assert_eq!(
            store
                .get_proposal(&format!("{CONTRACT}-2"))
                .unwrap()
                .unwrap()
                .votes_for,
            "12314122341234"
        );
    }

    #[test]
    fn vote_cast_without_proposal_fails_but_records_history() {
        let store = setup_store();
        let ev = vote_cast(9, 1, "100");
        let err = apply(&store, &ev).unwrap_err();
        assert!(matches!(err, ApplyError::Application(_)));
        assert!(store.get_event(&ev.event_id).unwrap().is_some());
    }

    #[test]
    fn reapplying_a_whole_event_sequence_is_idempotent() {
        let store = setup_store();
        let events = [
            event(4, GovernorEventKind::ProposalCreated(created_data())),
            {
                let mut ev = vote_cast(4, 1, "12314122341234");
                ev.event_id = encode_event_id(LEDGER_SEQ, 2, 0, 0);
                ev
            },
            {
                let mut ev = vote_cast(4, 0, "55");
                ev.tx_hash = "33".repeat(32);
                ev.event_id = encode_event_id(LEDGER_SEQ + 1, 0, 0, 0);
                ev
            },
        ];
        for ev in &events {
            apply(&store, ev).unwrap();
        }
        let first_pass = store
            .get_proposal(&format!("{CONTRACT}-4"))
            .unwrap()
            .unwrap();
        assert_eq!(first_pass.votes_for, "12314122341234");
        assert_eq!(first_pass.votes_against, "55");

        for ev in &events {
            apply(&store, ev).unwrap();
        }
        let second_pass = store
            .get_proposal(&format!("{CONTRACT}-4"))
            .unwrap()
            .unwrap();
        assert_eq!(second_pass, first_pass);
    }
}
