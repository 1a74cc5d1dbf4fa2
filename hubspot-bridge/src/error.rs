//! Error types shared across the crate.
//!
//! Request-level failures (`SignatureError`, `BatchError`) reject a whole
//! webhook delivery. `RecordError` is local to a single notification and never
//! aborts its siblings. `ApiError` covers outbound calls to the HubSpot API.

use thiserror::Error;

use crate::events::EventType;

/// Startup configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("HUBSPOT_APP_SECRET must be set to a non-empty value")]
    MissingSecret,
}

/// Why a webhook request failed signature verification.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("signature header is missing")]
    Missing,
    #[error("signature does not match the request body")]
    Mismatch,
}

/// The webhook body could not be decoded into a sequence of notifications.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BatchError {
    #[error("malformed webhook batch: {0}")]
    MalformedBatch(String),
}

/// A single notification could not be classified into a domain event.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("unrecognized HubSpot event type: {}", .subscription_type.as_deref().unwrap_or("<missing>"))]
    UnrecognizedEventType { subscription_type: Option<String> },

    #[error("incomplete {event_type} event: `{field}` is missing or invalid")]
    IncompleteEvent {
        event_type: EventType,
        field: &'static str,
    },
}

/// Errors returned by the HubSpot REST helpers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HUBSPOT_API_KEY is not configured")]
    MissingApiKey,

    #[error("invalid HubSpot API URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("HubSpot request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HubSpot object not found: {path}")]
    NotFound { path: String },

    #[error("HubSpot returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected HubSpot response: {0}")]
    Decode(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("line item {line_item_id} is not a product")]
    NotAProduct { line_item_id: i64 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{Action, Entity};

    #[test]
    fn test_record_error_messages() {
        let unknown = RecordError::UnrecognizedEventType {
            subscription_type: Some("unknown.thing".to_string()),
        };
        assert_eq!(
            unknown.to_string(),
            "unrecognized HubSpot event type: unknown.thing"
        );

        let missing = RecordError::UnrecognizedEventType {
            subscription_type: None,
        };
        assert_eq!(
            missing.to_string(),
            "unrecognized HubSpot event type: <missing>"
        );

        let incomplete = RecordError::IncompleteEvent {
            event_type: EventType::new(Entity::Deal, Action::Updated),
            field: "objectId",
        };
        assert_eq!(
            incomplete.to_string(),
            "incomplete deal_updated event: `objectId` is missing or invalid"
        );
    }
}
