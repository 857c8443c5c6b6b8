//! Read-only HTTP API over the indexer's materialized state.
//!
//! Endpoints:
//! - `GET /health` — checkpoint recency check
//! - `GET /{contract_id}/proposals` — proposals, newest id first
//! - `GET /{contract_id}/proposals/{proposal_id}` — one proposal
//! - `GET /{contract_id}/proposals/{proposal_id}/votes` — votes, newest ledger first
//! - `GET /{contract_id}/events` — event history in emission order
//!
//! List endpoints take cursor pagination (`?cursor=…&count=…`). Decode
//! and apply failures inside the indexer are never surfaced here; the
//! only operator-visible signal is health staleness.

pub mod error;
pub mod handlers;
pub mod pagination;
pub mod server;

pub use error::ApiError;
pub use handlers::ApiState;
pub use server::ApiServer;
