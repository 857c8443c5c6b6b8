//! Axum server wiring.

use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, Method};
use axum::routing::get;
use axum::Router;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};

use crate::error::ApiError;
use crate::handlers::{self, ApiState};

/// The read API server.
pub struct ApiServer {
    pub port: u16,
    state: Arc<ApiState>,
}

impl ApiServer {
    pub fn new(port: u16, state: Arc<ApiState>) -> Self {
        Self { port, state }
    }

    /// Build the router. Split out so tests can drive it directly.
    pub fn router(state: Arc<ApiState>) -> Router {
        // The API is public and read-only: allow any origin.
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
            .max_age(Duration::from_secs(86_400));

        Router::new()
            .route("/health", get(handlers::health))
            .route("/:contract_id/proposals", get(handlers::list_proposals))
            .route(
                "/:contract_id/proposals/:proposal_id",
                get(handlers::get_proposal),
            )
            .route(
                "/:contract_id/proposals/:proposal_id/votes",
                get(handlers::list_votes),
            )
            .route("/:contract_id/events", get(handlers::list_events))
            .layer(cors)
            .with_state(state)
    }

    /// Serve until a shutdown signal arrives.
    pub async fn start(&self, mut shutdown: broadcast::Receiver<()>) -> Result<(), ApiError> {
        let app = Self::router(self.state.clone());
        let addr = format!("0.0.0.0:{}", self.port);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| ApiError::Server(format!("bind {addr}: {e}")))?;
        tracing::info!("API server listening on {addr}");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("API server shutting down");
            })
            .await
            .map_err(|e| ApiError::Server(e.to_string()))
    }
}
