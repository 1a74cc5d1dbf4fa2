//! Small shared helpers.

pub mod time;

pub use time::{datetime_from_millis, parse_hubspot_timestamp};
