//! Classification of webhook notifications into domain events.
//!
//! A delivery body is a JSON array of notifications. Decoding the array is
//! all-or-nothing; classifying its elements is not. Every element yields its
//! own `Result`, and the results keep the array order.

use serde_json::Value;
use tracing::{info, warn};

use crate::error::{BatchError, RecordError};
use crate::events::types::{
    Action, Change, DomainEvent, Entity, EventType, NotificationRecord, PropertyChange, Subject,
};
use crate::util::datetime_from_millis;

/// `subscriptionType` discriminators and the event types they map to.
pub const SUBSCRIPTION_TYPES: [(&str, EventType); 9] = [
    ("company.creation", EventType::new(Entity::Company, Action::Created)),
    ("company.deletion", EventType::new(Entity::Company, Action::Deleted)),
    ("company.propertyChange", EventType::new(Entity::Company, Action::Updated)),
    ("contact.creation", EventType::new(Entity::Contact, Action::Created)),
    ("contact.deletion", EventType::new(Entity::Contact, Action::Deleted)),
    ("contact.propertyChange", EventType::new(Entity::Contact, Action::Updated)),
    ("deal.creation", EventType::new(Entity::Deal, Action::Created)),
    ("deal.deletion", EventType::new(Entity::Deal, Action::Deleted)),
    ("deal.propertyChange", EventType::new(Entity::Deal, Action::Updated)),
];

/// Look up the event type for a `subscriptionType` value.
pub fn event_type_for(subscription_type: &str) -> Option<EventType> {
    SUBSCRIPTION_TYPES
        .iter()
        .find(|(tag, _)| *tag == subscription_type)
        .map(|(_, event_type)| *event_type)
}

/// A notification together with its classification outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRecord {
    pub record: NotificationRecord,
    pub result: Result<DomainEvent, RecordError>,
}

impl ParsedRecord {
    pub fn event(&self) -> Option<&DomainEvent> {
        self.result.as_ref().ok()
    }
}

/// Classify one notification.
pub fn classify(record: &NotificationRecord) -> Result<DomainEvent, RecordError> {
    let event_type = record
        .subscription_type
        .as_deref()
        .and_then(event_type_for)
        .ok_or_else(|| RecordError::UnrecognizedEventType {
            subscription_type: record.subscription_type.clone(),
        })?;

    let incomplete = |field| RecordError::IncompleteEvent { event_type, field };

    let event_id = record.event_id.ok_or_else(|| incomplete("eventId"))?;
    let object_id = record.object_id.ok_or_else(|| incomplete("objectId"))?;

    let subject = match event_type.entity {
        Entity::Company => Subject::Company(object_id),
        Entity::Contact => Subject::Contact(object_id),
        Entity::Deal => Subject::Deal(object_id),
    };

    let change = match event_type.action {
        Action::Created => Change::Created,
        Action::Deleted => Change::Deleted,
        Action::Updated => Change::Updated(PropertyChange {
            name: record
                .property_name
                .clone()
                .ok_or_else(|| incomplete("propertyName"))?,
            value: record.property_value.clone(),
        }),
    };

    Ok(DomainEvent {
        event_id,
        occurred_at: record.occurred_at.and_then(datetime_from_millis),
        subject,
        change,
    })
}

/// Decode a delivery body and classify each of its notifications.
///
/// Fails only when the body is not a JSON array. Per-notification failures are
/// logged and returned in place.
pub fn parse_batch(raw_body: &[u8]) -> Result<Vec<ParsedRecord>, BatchError> {
    let elements = decode_array(raw_body)?;

    info!(record_count = elements.len(), "hubspot_batch_decoded");

    Ok(elements.into_iter().map(parse_element).collect())
}

/// Classify only the first notification of a delivery.
///
/// For producers that send a single notification per delivery. An empty array
/// is a malformed batch.
pub fn parse_single(raw_body: &[u8]) -> Result<ParsedRecord, BatchError> {
    decode_array(raw_body)?
        .into_iter()
        .next()
        .map(parse_element)
        .ok_or_else(|| BatchError::MalformedBatch("empty notification array".to_string()))
}

fn decode_array(raw_body: &[u8]) -> Result<Vec<Value>, BatchError> {
    serde_json::from_slice::<Vec<Value>>(raw_body).map_err(|e| {
        warn!(
            error = %e,
            body_preview = %String::from_utf8_lossy(&raw_body[..raw_body.len().min(200)]),
            "hubspot_batch_malformed"
        );
        BatchError::MalformedBatch(e.to_string())
    })
}

fn parse_element(value: Value) -> ParsedRecord {
    let record = NotificationRecord::from_value(value);
    let result = classify(&record);

    match &result {
        Ok(event) => info!(
            event_type = %event.event_type(),
            event_id = event.event_id,
            object_id = event.object_id(),
            "hubspot_event_classified"
        ),
        Err(e @ RecordError::UnrecognizedEventType { .. }) => warn!(
            error = %e,
            event_id = ?record.event_id,
            "hubspot_event_unrecognized"
        ),
        Err(e @ RecordError::IncompleteEvent { .. }) => warn!(
            error = %e,
            event_id = ?record.event_id,
            object_id = ?record.object_id,
            "hubspot_event_incomplete"
        ),
    }

    ParsedRecord { record, result }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const DEAL_STAGE_BODY: &str = r#"[{
        "objectId": 697680835,
        "propertyName": "dealstage",
        "propertyValue": "1f4f1ec1-8174-49f3-a112-4eaa4748e38e",
        "changeSource": "CRM_UI",
        "eventId": 802835955,
        "subscriptionId": 92894,
        "portalId": 5799819,
        "appId": 186886,
        "occurredAt": 1556094637139,
        "subscriptionType": "deal.propertyChange",
        "attemptNumber": 0
    }]"#;

    fn record(value: Value) -> NotificationRecord {
        NotificationRecord::from_value(value)
    }

    #[test]
    fn test_table_maps_each_entity_to_itself() {
        for (tag, event_type) in SUBSCRIPTION_TYPES {
            let (entity, _) = tag.split_once('.').unwrap();
            assert_eq!(entity, event_type.entity.as_str(), "{tag}");
        }

        assert_eq!(
            event_type_for("contact.creation"),
            Some(EventType::new(Entity::Contact, Action::Created))
        );
        assert_eq!(
            event_type_for("company.propertyChange"),
            Some(EventType::new(Entity::Company, Action::Updated))
        );
        assert_eq!(event_type_for("Deal.creation"), None);
        assert_eq!(event_type_for("unknown.thing"), None);
    }

    #[test]
    fn test_classify_deal_property_change() {
        let parsed = parse_single(DEAL_STAGE_BODY.as_bytes()).unwrap();
        let event = parsed.result.unwrap();

        assert_eq!(event.event_type(), EventType::new(Entity::Deal, Action::Updated));
        assert_eq!(event.deal_id(), Some(697680835));
        assert_eq!(event.updated_property_name(), Some("dealstage"));
        assert_eq!(
            event.updated_property_value(),
            Some("1f4f1ec1-8174-49f3-a112-4eaa4748e38e")
        );
        assert_eq!(event.event_id, 802835955);
        assert_eq!(
            event.occurred_at.unwrap().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            "2019-04-24T08:30:37.139Z"
        );
        assert_eq!(parsed.record.change_source.as_deref(), Some("CRM_UI"));
    }

    #[test]
    fn test_classify_contact_creation() {
        let event = classify(&record(json!({
            "objectId": 123,
            "eventId": 9,
            "occurredAt": 1556094637139u64,
            "subscriptionType": "contact.creation"
        })))
        .unwrap();

        assert_eq!(event.event_type(), EventType::new(Entity::Contact, Action::Created));
        assert_eq!(event.contact_id(), Some(123));
        assert_eq!(event.company_id(), None);
        assert_eq!(event.updated_property_name(), None);
        assert_eq!(event.updated_property_value(), None);
    }

    #[test]
    fn test_classify_company_deletion() {
        let event = classify(&record(json!({
            "objectId": 55,
            "eventId": 10,
            "subscriptionType": "company.deletion"
        })))
        .unwrap();

        assert_eq!(event.company_id(), Some(55));
        assert_eq!(event.change, Change::Deleted);
        assert_eq!(event.occurred_at, None);
    }

    #[test]
    fn test_classify_unrecognized_type() {
        let result = classify(&record(json!({
            "objectId": 1,
            "eventId": 2,
            "subscriptionType": "unknown.thing"
        })));

        assert_eq!(
            result,
            Err(RecordError::UnrecognizedEventType {
                subscription_type: Some("unknown.thing".to_string())
            })
        );

        let missing = classify(&record(json!({ "objectId": 1, "eventId": 2 })));
        assert_eq!(
            missing,
            Err(RecordError::UnrecognizedEventType {
                subscription_type: None
            })
        );
    }

    #[test]
    fn test_classify_incomplete_events() {
        let no_object = classify(&record(json!({
            "eventId": 2,
            "subscriptionType": "deal.creation"
        })));
        assert_eq!(
            no_object,
            Err(RecordError::IncompleteEvent {
                event_type: EventType::new(Entity::Deal, Action::Created),
                field: "objectId",
            })
        );

        let string_object_id = classify(&record(json!({
            "objectId": "42",
            "eventId": 2,
            "subscriptionType": "company.creation"
        })));
        assert!(matches!(
            string_object_id,
            Err(RecordError::IncompleteEvent { field: "objectId", .. })
        ));

        let no_property = classify(&record(json!({
            "objectId": 42,
            "eventId": 2,
            "subscriptionType": "contact.propertyChange"
        })));
        assert!(matches!(
            no_property,
            Err(RecordError::IncompleteEvent { field: "propertyName", .. })
        ));
    }

    #[test]
    fn test_cleared_property_has_no_value() {
        let event = classify(&record(json!({
            "objectId": 42,
            "eventId": 2,
            "propertyName": "phone",
            "subscriptionType": "contact.propertyChange"
        })))
        .unwrap();

        assert_eq!(event.updated_property_name(), Some("phone"));
        assert_eq!(event.updated_property_value(), None);
    }

    #[test]
    fn test_batch_keeps_order_and_isolates_failures() {
        let body = json!([
            { "objectId": 1, "eventId": 11, "subscriptionType": "company.creation" },
            { "eventId": 12, "subscriptionType": "deal.creation" },
            { "objectId": 3, "eventId": 13, "subscriptionType": "unknown.thing" },
            { "objectId": 4, "eventId": 14, "propertyName": "name",
              "propertyValue": "Acme", "subscriptionType": "company.propertyChange" }
        ]);

        let parsed = parse_batch(body.to_string().as_bytes()).unwrap();

        assert_eq!(parsed.len(), 4);
        assert_eq!(parsed[0].event().unwrap().company_id(), Some(1));
        assert!(matches!(
            parsed[1].result,
            Err(RecordError::IncompleteEvent { field: "objectId", .. })
        ));
        assert!(matches!(
            parsed[2].result,
            Err(RecordError::UnrecognizedEventType { .. })
        ));
        assert_eq!(parsed[3].event().unwrap().updated_property_value(), Some("Acme"));
        assert_eq!(parsed[3].record.event_id, Some(14));
    }

    #[test]
    fn test_batch_with_non_object_element() {
        let parsed = parse_batch(br#"[42, {"objectId": 1, "eventId": 2, "subscriptionType": "deal.deletion"}]"#)
            .unwrap();

        assert_eq!(parsed.len(), 2);
        assert!(matches!(
            parsed[0].result,
            Err(RecordError::UnrecognizedEventType { subscription_type: None })
        ));
        assert_eq!(parsed[1].event().unwrap().deal_id(), Some(1));
    }

    #[test]
    fn test_malformed_batches() {
        let bodies: [&[u8]; 4] = [b"not json", br#"{"objectId": 1}"#, b"", b"null"];
        for body in bodies {
            assert!(matches!(
                parse_batch(body),
                Err(BatchError::MalformedBatch(_))
            ));
        }
    }

    #[test]
    fn test_empty_batch() {
        assert_eq!(parse_batch(b"[]").unwrap(), Vec::new());
        assert!(matches!(
            parse_single(b"[]"),
            Err(BatchError::MalformedBatch(_))
        ));
    }

    #[test]
    fn test_parse_single_ignores_trailing_records() {
        let parsed = parse_single(
            br#"[{"objectId": 1, "eventId": 2, "subscriptionType": "contact.deletion"}, "junk"]"#,
        )
        .unwrap();

        assert_eq!(parsed.event().unwrap().contact_id(), Some(1));
    }
}
