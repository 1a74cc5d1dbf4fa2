//! Queue message types for classified HubSpot events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::events::{Action, DomainEvent, Entity};

/// Message published for each classified webhook event.
///
/// Flat so that consumers in any language can read it without knowing the
/// event variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedEvent {
    /// Snake-case event type, e.g. `deal_updated`
    pub event_type: String,
    pub entity: Entity,
    pub action: Action,
    /// HubSpot id of the company, contact or deal
    pub object_id: i64,
    pub event_id: i64,
    #[serde(default)]
    pub occurred_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_property_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_property_value: Option<String>,
}

impl QueuedEvent {
    /// Message id used for broker-side tracking.
    pub fn message_id(&self) -> String {
        format!("hubspot-{}", self.event_id)
    }
}

impl From<&DomainEvent> for QueuedEvent {
    fn from(event: &DomainEvent) -> Self {
        Self {
            event_type: event.event_type().to_string(),
            entity: event.entity(),
            action: event.action(),
            object_id: event.object_id(),
            event_id: event.event_id,
            occurred_at: event.occurred_at,
            updated_property_name: event.updated_property_name().map(str::to_string),
            updated_property_value: event.updated_property_value().map(str::to_string),
        }
    }
}
