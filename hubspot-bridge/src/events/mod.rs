//! HubSpot webhook notifications and their classification.
//!
//! ```text
//! raw body → parse_batch() → [ParsedRecord { record, Result<DomainEvent, RecordError> }]
//! ```

pub mod parser;
pub mod types;

pub use parser::{classify, event_type_for, parse_batch, parse_single, ParsedRecord, SUBSCRIPTION_TYPES};
pub use types::{
    Action, Change, DomainEvent, Entity, EventType, NotificationRecord, PropertyChange, Subject,
};
