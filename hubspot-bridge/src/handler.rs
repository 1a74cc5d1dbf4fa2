//! Hand-off of classified notifications to application logic.
//!
//! The webhook endpoint calls an [`EventHandler`] once per notification, in
//! delivery order, after the signature and the body have been accepted.
//! Failed classifications are handed over too, so the handler decides whether
//! to alert, skip or record them.

use anyhow::Result;
use futures::future::BoxFuture;
use tracing::{error, info, warn};

use crate::events::ParsedRecord;

/// Application logic receiving webhook notifications.
pub trait EventHandler: Send + Sync {
    /// Handle one notification and its classification outcome.
    fn handle<'a>(&'a self, parsed: &'a ParsedRecord) -> BoxFuture<'a, Result<()>>;
}

/// Handler that only logs what it receives.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingHandler;

impl EventHandler for LoggingHandler {
    fn handle<'a>(&'a self, parsed: &'a ParsedRecord) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            match &parsed.result {
                Ok(event) => info!(
                    event_type = %event.event_type(),
                    event_id = event.event_id,
                    object_id = event.object_id(),
                    occurred_at = ?event.occurred_at,
                    property_name = ?event.updated_property_name(),
                    "hubspot_event_received"
                ),
                Err(e) => warn!(
                    error = %e,
                    event_id = ?parsed.record.event_id,
                    "hubspot_event_skipped"
                ),
            }
            Ok(())
        })
    }
}

/// Run every notification through the handler, in order.
///
/// A handler error is logged and does not stop the remaining notifications.
/// Returns the number of notifications the handler failed on.
pub async fn process_events(handler: &dyn EventHandler, records: &[ParsedRecord]) -> usize {
    info!(record_count = records.len(), "hubspot_events_processing");

    let mut failures = 0;
    for (index, parsed) in records.iter().enumerate() {
        if let Err(e) = handler.handle(parsed).await {
            failures += 1;
            error!(
                error = %e,
                index = index,
                event_id = ?parsed.record.event_id,
                "hubspot_event_handler_failed"
            );
        }
    }

    info!(
        record_count = records.len(),
        handler_failures = failures,
        "hubspot_events_processed"
    );

    failures
}
