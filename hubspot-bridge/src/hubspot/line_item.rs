//! Deal line items.

use serde_json::Value;
use tracing::debug;

use super::client::HubspotClient;
use super::object::ApiObject;
use crate::error::ApiError;

/// Property linking a line item to the product it was created from.
pub(crate) const PRODUCT_ID_PROPERTY: &str = "hs_product_id";

#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    pub hubspot_id: i64,
    object: ApiObject,
}

impl LineItem {
    pub fn from_content(hubspot_id: i64, content: Value) -> Self {
        Self {
            hubspot_id,
            object: ApiObject::new(content),
        }
    }

    pub fn object(&self) -> &ApiObject {
        &self.object
    }

    pub(crate) fn into_object(self) -> ApiObject {
        self.object
    }

    /// Fetch a line item, asking HubSpot for the given properties.
    pub async fn fetch(client: &HubspotClient, hubspot_id: i64, properties: &[&str]) -> Result<Self, ApiError> {
        debug!(hubspot_id = hubspot_id, "hubspot_line_item_fetch");
        let query: Vec<(&str, String)> = properties
            .iter()
            .map(|p| ("properties", p.to_string()))
            .collect();

        let content = client
            .get(&format!("/crm-objects/v1/objects/line_items/{}", hubspot_id), &query)
            .await?;
        Ok(Self::from_content(hubspot_id, content))
    }

    /// Whether this line item stands for a catalogue product.
    pub fn is_product(&self) -> bool {
        self.object.has_property(PRODUCT_ID_PROPERTY)
    }

    pub fn product_id(&self) -> Option<i64> {
        self.object
            .property_value(PRODUCT_ID_PROPERTY)
            .and_then(|id| id.parse().ok())
    }
}
