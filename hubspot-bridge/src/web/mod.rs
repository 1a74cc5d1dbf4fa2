//! Web server module for receiving HubSpot webhooks.
//!
//! Routes:
//! - `GET /health`
//! - `POST /webhooks/hubspot`

pub mod handlers;
pub mod signature;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub use handlers::{health, hubspot_webhook, AppState, HealthResponse};
pub use signature::{check_signature, expected_signature, verify_signature, SIGNATURE_HEADER};

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/webhooks/hubspot", post(hubspot_webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
