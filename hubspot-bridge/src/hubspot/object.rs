//! Shared representation of HubSpot API objects.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::{json, Map, Value};

use crate::error::ApiError;

/// Property name → value pairs written to HubSpot.
pub type PropertyMap = BTreeMap<String, String>;

/// Raw content of an object as returned by the HubSpot API.
///
/// CRM properties come back as
/// `{"properties": {"<name>": {"value": "...", "timestamp": ...}}}`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ApiObject {
    content: Value,
}

impl ApiObject {
    pub fn new(content: Value) -> Self {
        Self { content }
    }

    pub fn content(&self) -> &Value {
        &self.content
    }

    pub fn content_mut(&mut self) -> &mut Value {
        &mut self.content
    }

    pub fn into_content(self) -> Value {
        self.content
    }

    /// The `properties` object, if any.
    pub fn properties(&self) -> Option<&Map<String, Value>> {
        self.content.get("properties").and_then(Value::as_object)
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.properties().is_some_and(|p| p.contains_key(name))
    }

    /// The `value` of a CRM property, rendered as a string.
    pub fn property_value(&self, name: &str) -> Option<String> {
        self.properties()?
            .get(name)?
            .get("value")
            .and_then(scalar_to_string)
    }

    /// Whether every `having` property holds exactly the given value.
    pub fn matches(&self, having: &PropertyMap) -> bool {
        having
            .iter()
            .all(|(name, value)| self.property_value(name).as_deref() == Some(value.as_str()))
    }

    /// A top-level field rendered as a string (owners are not property-based).
    pub fn field(&self, name: &str) -> Option<String> {
        self.content.get(name).and_then(scalar_to_string)
    }

    /// A top-level field read as an id.
    pub fn id_field(&self, name: &str) -> Option<i64> {
        self.content.get(name).and_then(value_to_id)
    }
}

pub(crate) fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// HubSpot ids arrive either as JSON numbers or as numeric strings.
pub(crate) fn value_to_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Read the id HubSpot assigned to a newly created object.
pub(crate) fn created_id(content: &Value, field: &str) -> Result<i64, ApiError> {
    content
        .get(field)
        .and_then(value_to_id)
        .ok_or_else(|| ApiError::Decode(format!("missing `{}` in create response", field)))
}

/// `{"properties": [{"<key>": name, "value": value}, ...]}` request body.
///
/// Companies and deals name the key `name`, contacts name it `property`.
pub(crate) fn properties_payload(key: &str, properties: &PropertyMap) -> Value {
    let entries: Vec<Value> = properties
        .iter()
        .map(|(name, value)| json!({ key: name, "value": value }))
        .collect();
    json!({ "properties": entries })
}

/// An exact decimal amount of money in a given ISO 4217 currency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Money {
    pub amount: Decimal,
    pub currency: String,
}

impl Money {
    /// Parse a HubSpot amount. Returns `None` when either part is unusable.
    pub fn parse(amount: &str, currency: &str) -> Option<Self> {
        let amount = Decimal::from_str(amount.trim()).ok()?;
        let currency = currency.trim().to_uppercase();

        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return None;
        }

        Some(Self { amount, currency })
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut cents = self.amount.round_dp(2);
        cents.rescale(2);
        write!(f, "{} {}", cents, self.currency)
    }
}
