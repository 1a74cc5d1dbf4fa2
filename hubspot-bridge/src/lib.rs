//! HubSpot Bridge - HubSpot webhook receiver and CRM helpers.
//!
//! The library backs the `hubspot-bridge-web` binary:
//! - Verifies that webhook deliveries were signed with the app secret
//! - Classifies each notification into a typed domain event
//! - Hands events to an [`EventHandler`] (log only, or publish to RabbitMQ)
//!
//! The `hubspot` module adds typed helpers over the CRM REST API for
//! handlers that need to read or write companies, contacts and deals.
//!
//! ## Architecture
//!
//! ```text
//! HubSpot → POST /webhooks/hubspot → signature → parse_batch → EventHandler
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod handler;
pub mod hubspot;
pub mod queue;
pub mod util;
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use error::{ApiError, BatchError, ConfigError, RecordError, SignatureError};
pub use events::{parse_batch, DomainEvent, EventType, ParsedRecord};
pub use handler::{process_events, EventHandler, LoggingHandler};
pub use queue::{EventPublisher, QueuedEvent};
pub use web::{router, AppState};
