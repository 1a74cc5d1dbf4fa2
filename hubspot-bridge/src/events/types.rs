//! Type definitions for HubSpot webhook notifications.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One element of a webhook delivery body.
///
/// Every field is provider-controlled and therefore optional. A field that is
/// present with an unexpected JSON type is read as absent, so a single odd
/// value never fails the whole record at decode time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NotificationRecord {
    /// Identifier of the CRM object the notification is about
    #[serde(deserialize_with = "lenient")]
    pub object_id: Option<i64>,
    /// Changed property, only for property-change notifications
    #[serde(deserialize_with = "lenient")]
    pub property_name: Option<String>,
    /// New property value, only for property-change notifications
    #[serde(deserialize_with = "lenient")]
    pub property_value: Option<String>,
    /// Epoch milliseconds
    #[serde(deserialize_with = "lenient")]
    pub occurred_at: Option<i64>,
    #[serde(deserialize_with = "lenient")]
    pub event_id: Option<i64>,
    /// Dotted `<entity>.<action>` discriminator, e.g. `deal.propertyChange`
    #[serde(deserialize_with = "lenient")]
    pub subscription_type: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub change_source: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub subscription_id: Option<i64>,
    #[serde(deserialize_with = "lenient")]
    pub portal_id: Option<i64>,
    #[serde(deserialize_with = "lenient")]
    pub app_id: Option<i64>,
    #[serde(deserialize_with = "lenient")]
    pub attempt_number: Option<i64>,
}

impl NotificationRecord {
    /// Read a record out of one element of the decoded body.
    ///
    /// Elements that are not JSON objects produce an empty record.
    pub fn from_value(value: Value) -> Self {
        if !value.is_object() {
            return Self::default();
        }
        serde_json::from_value(value).unwrap_or_default()
    }
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// The CRM object kind a notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Entity {
    Company,
    Contact,
    Deal,
}

impl Entity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Entity::Company => "company",
            Entity::Contact => "contact",
            Entity::Deal => "deal",
        }
    }
}

/// What happened to the CRM object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Created,
    Deleted,
    Updated,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Created => "created",
            Action::Deleted => "deleted",
            Action::Updated => "updated",
        }
    }
}

/// An (entity, action) pair, rendered as `company_created`, `deal_updated`...
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventType {
    pub entity: Entity,
    pub action: Action,
}

impl EventType {
    pub const fn new(entity: Entity, action: Action) -> Self {
        Self { entity, action }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.entity.as_str(), self.action.as_str())
    }
}

/// The CRM object an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    Company(i64),
    Contact(i64),
    Deal(i64),
}

impl Subject {
    pub fn entity(&self) -> Entity {
        match self {
            Subject::Company(_) => Entity::Company,
            Subject::Contact(_) => Entity::Contact,
            Subject::Deal(_) => Entity::Deal,
        }
    }

    pub fn object_id(&self) -> i64 {
        match self {
            Subject::Company(id) | Subject::Contact(id) | Subject::Deal(id) => *id,
        }
    }
}

/// A property update carried by `*_updated` events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyChange {
    pub name: String,
    /// `None` when the property was cleared
    pub value: Option<String>,
}

/// The change an event describes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Created,
    Deleted,
    Updated(PropertyChange),
}

impl Change {
    pub fn action(&self) -> Action {
        match self {
            Change::Created => Action::Created,
            Change::Deleted => Action::Deleted,
            Change::Updated(_) => Action::Updated,
        }
    }
}

/// A classified HubSpot webhook notification.
///
/// Each event has exactly one subject (entity + id) and one change (action).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainEvent {
    pub event_id: i64,
    pub occurred_at: Option<DateTime<Utc>>,
    pub subject: Subject,
    pub change: Change,
}

impl DomainEvent {
    pub fn event_type(&self) -> EventType {
        EventType::new(self.subject.entity(), self.change.action())
    }

    pub fn entity(&self) -> Entity {
        self.subject.entity()
    }

    pub fn action(&self) -> Action {
        self.change.action()
    }

    pub fn object_id(&self) -> i64 {
        self.subject.object_id()
    }

    pub fn company_id(&self) -> Option<i64> {
        match self.subject {
            Subject::Company(id) => Some(id),
            _ => None,
        }
    }

    pub fn contact_id(&self) -> Option<i64> {
        match self.subject {
            Subject::Contact(id) => Some(id),
            _ => None,
        }
    }

    pub fn deal_id(&self) -> Option<i64> {
        match self.subject {
            Subject::Deal(id) => Some(id),
            _ => None,
        }
    }

    pub fn updated_property_name(&self) -> Option<&str> {
        match &self.change {
            Change::Updated(change) => Some(&change.name),
            _ => None,
        }
    }

    pub fn updated_property_value(&self) -> Option<&str> {
        match &self.change {
            Change::Updated(change) => change.value.as_deref(),
            _ => None,
        }
    }
}
