//! Webhook endpoint handlers.
//!
//! The HubSpot endpoint:
//! 1. Verifies the signature over the raw body
//! 2. Decodes the notification batch
//! 3. Hands every notification to the configured event handler
//! 4. Returns 200 once the batch is accepted, whatever the per-record outcome
//!
//! Non-2xx responses make HubSpot re-deliver, so request-level failures keep a
//! real error status.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, info};

use crate::events::parse_batch;
use crate::handler::{process_events, EventHandler};
use crate::web::signature::{verify_signature, SIGNATURE_HEADER};
use crate::Config;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub handler: Arc<dyn EventHandler>,
}

impl AppState {
    pub fn new(config: Config, handler: Arc<dyn EventHandler>) -> Self {
        Self {
            config: Arc::new(config),
            handler,
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// HubSpot Webhook
// =============================================================================

/// HubSpot webhook endpoint.
pub async fn hubspot_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    // Undecodable header bytes count as a present but wrong signature
    let signature = headers
        .get(SIGNATURE_HEADER)
        .map(|v| v.to_str().unwrap_or_default());

    info!(
        body_length = body.len(),
        has_signature = signature.is_some(),
        user_agent = ?headers.get("user-agent").and_then(|v| v.to_str().ok()),
        "hubspot_webhook_received"
    );

    if !verify_signature(state.config.app_secret.as_bytes(), &body, signature) {
        return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
    }

    let records = match parse_batch(&body) {
        Ok(records) => records,
        Err(e) => {
            error!(error = %e, body_length = body.len(), "hubspot_webhook_bad_request");
            return (StatusCode::BAD_REQUEST, "Bad request").into_response();
        }
    };

    let classified = records.iter().filter(|r| r.result.is_ok()).count();
    let handler_failures = process_events(state.handler.as_ref(), &records).await;

    info!(
        record_count = records.len(),
        classified = classified,
        rejected = records.len() - classified,
        handler_failures = handler_failures,
        "hubspot_webhook_processed"
    );

    StatusCode::OK.into_response()
}
