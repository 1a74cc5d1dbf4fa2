//! HubSpot timestamp conversion.
//!
//! HubSpot transmits instants as milliseconds since the Unix epoch, sometimes
//! as JSON integers (webhook `occurredAt`) and sometimes as strings (CRM
//! properties such as `closedate`).

use chrono::{DateTime, Utc};
use tracing::warn;

/// Convert epoch milliseconds to a UTC instant.
///
/// Returns `None` when the value is outside the representable range.
pub fn datetime_from_millis(ms: i64) -> Option<DateTime<Utc>> {
    let instant = DateTime::<Utc>::from_timestamp_millis(ms);
    if instant.is_none() {
        warn!(timestamp_ms = ms, "hubspot_timestamp_out_of_range");
    }
    instant
}

/// Parse a HubSpot timestamp transmitted as a string of epoch milliseconds.
pub fn parse_hubspot_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    match raw.trim().parse::<i64>() {
        Ok(ms) => datetime_from_millis(ms),
        Err(_) => {
            warn!(value = %raw, "hubspot_timestamp_invalid");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_datetime_from_millis_keeps_milliseconds() {
        let instant = datetime_from_millis(1556094637139).unwrap();
        assert_eq!(
            instant.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            "2019-04-24T08:30:37.139Z"
        );
    }

    #[test]
    fn test_datetime_from_millis_out_of_range() {
        assert!(datetime_from_millis(i64::MAX).is_none());
    }

    #[test]
    fn test_parse_hubspot_timestamp() {
        let instant = parse_hubspot_timestamp("1556105815815").unwrap();
        assert_eq!(instant.timestamp_millis(), 1556105815815);

        assert!(parse_hubspot_timestamp("not-a-date").is_none());
        assert!(parse_hubspot_timestamp("").is_none());
    }
}
