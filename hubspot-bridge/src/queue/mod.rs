//! Queue module for RabbitMQ publication of classified events.
//!
//! ## Architecture
//!
//! ```text
//! HubSpot → Web Server → EventPublisher → hubspot_events queue → consumers
//! ```

pub mod publisher;
pub mod types;

pub use publisher::EventPublisher;
pub use types::QueuedEvent;
