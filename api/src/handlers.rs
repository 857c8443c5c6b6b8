//! Request handlers.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Serialize;

use gavel_governor::{encode_proposal_key, Proposal, Vote};
use gavel_store::{
    CheckpointStore, EventRecord, EventStore, GovernorStore, ProposalStore, VoteStore,
};

use crate::error::ApiError;
use crate::pagination::{paginate, PaginationParams};

/// Shared state behind every handler.
pub struct ApiState {
    pub store: Arc<dyn GovernorStore>,
    /// Checkpoint source whose recency the health endpoint reports.
    pub source: String,
    /// Maximum checkpoint age before the service reports unhealthy.
    pub health_staleness: Duration,
}

#[derive(Serialize)]
pub struct HealthResponse {
    /// Last fully indexed ledger sequence.
    pub status: u32,
}

#[derive(Serialize)]
pub struct ProposalsResponse {
    pub proposals: Vec<Proposal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

#[derive(Serialize)]
pub struct VotesResponse {
    pub votes: Vec<Vote>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

#[derive(Serialize)]
pub struct EventsResponse {
    pub events: Vec<EventRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// `GET /health` — healthy while the checkpoint is recent enough.
pub async fn health(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<HealthResponse>, ApiError> {
    let checkpoint = state
        .store
        .get_checkpoint(&state.source)?
        .ok_or_else(|| ApiError::Unhealthy("no ledger indexed yet".to_string()))?;

    let age = now_unix() - checkpoint.close_time;
    if age > state.health_staleness.as_secs() as i64 {
        tracing::warn!(
            last_indexed_ledger = checkpoint.ledger_seq,
            last_close_time = checkpoint.close_time,
            age_secs = age,
            "indexer is behind"
        );
        return Err(ApiError::Unhealthy(format!(
            "too long since last indexed ledger {}, closed {age}s ago",
            checkpoint.ledger_seq
        )));
    }
    Ok(Json(HealthResponse {
        status: checkpoint.ledger_seq,
    }))
}

fn parse_proposal_id(raw: &str) -> Result<u32, ApiError> {
    raw.parse::<u32>()
        .map_err(|_| ApiError::BadRequest("invalid proposal_id".to_string()))
}

/// `GET /{contract_id}/proposals/{proposal_id}`
pub async fn get_proposal(
    State(state): State<Arc<ApiState>>,
    Path((contract_id, proposal_id)): Path<(String, String)>,
) -> Result<Json<Proposal>, ApiError> {
    let proposal_id = parse_proposal_id(&proposal_id)?;
    let key = encode_proposal_key(&contract_id, proposal_id);
    state
        .store
        .get_proposal(&key)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("proposal".to_string()))
}

/// `GET /{contract_id}/proposals` — proposal id descending.
pub async fn list_proposals(
    State(state): State<Arc<ApiState>>,
    Path(contract_id): Path<String>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<ProposalsResponse>, ApiError> {
    let proposals = state.store.proposals_by_contract(&contract_id)?;
    let (proposals, cursor) = paginate(proposals, &params);
    Ok(Json(ProposalsResponse { proposals, cursor }))
}

/// `GET /{contract_id}/proposals/{proposal_id}/votes` — ledger descending.
pub async fn list_votes(
    State(state): State<Arc<ApiState>>,
    Path((contract_id, proposal_id)): Path<(String, String)>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<VotesResponse>, ApiError> {
    let proposal_id = parse_proposal_id(&proposal_id)?;
    let votes = state.store.votes_by_proposal(&contract_id, proposal_id)?;
    let (votes, cursor) = paginate(votes, &params);
    Ok(Json(VotesResponse { votes, cursor }))
}

/// `GET /{contract_id}/events` — event id ascending.
pub async fn list_events(
    State(state): State<Arc<ApiState>>,
    Path(contract_id): Path<String>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<EventsResponse>, ApiError> {
    let events = state.store.events_by_contract(&contract_id)?;
    let (events, cursor) = paginate(events, &params);
    Ok(Json(EventsResponse { events, cursor }))
}
