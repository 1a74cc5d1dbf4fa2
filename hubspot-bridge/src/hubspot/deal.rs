//! Deal helpers.
//!
//! A deal links to contacts and companies through its `associations` block,
//! to its products through line items, and to its stage through the pipeline
//! it belongs to. Resolving stages and products costs extra API calls.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, error, warn};

use super::client::{AssociationType, HubspotClient};
use super::company::Company;
use super::contact::Contact;
use super::line_item::LineItem;
use super::object::{properties_payload, scalar_to_string, value_to_id, ApiObject, Money, PropertyMap};
use super::owner::Owner;
use super::product::Product;
use crate::error::ApiError;
use crate::util::parse_hubspot_timestamp;

/// Line item properties requested when loading deal products.
const LINE_ITEM_PROPERTIES: [&str; 5] = ["name", "price", "quantity", "discount", "hs_discount_percentage"];

/// One stage of a deal pipeline.
///
/// ```json
/// {"stageId": "closedwon", "label": "Deal concluded", "displayOrder": 2,
///  "metadata": {"isClosed": "true", "probability": "1.0"}, "active": true}
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealStage {
    pub stage_id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub display_order: Option<i64>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub active: Option<bool>,
}

impl DealStage {
    /// Chance (0.0 to 1.0) that a deal in this stage concludes.
    pub fn probability(&self) -> Option<f64> {
        self.metadata
            .get("probability")
            .and_then(scalar_to_string)
            .and_then(|p| p.trim().parse().ok())
    }

    pub fn is_closed(&self) -> Option<bool> {
        self.metadata
            .get("isClosed")
            .and_then(scalar_to_string)
            .and_then(|c| c.parse().ok())
    }

    /// Whether the deal was concluded successfully. `None` when the stage
    /// carries no usable probability.
    pub fn closed_won(&self) -> Option<bool> {
        self.probability().map(|p| p == 1.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Deal {
    pub hubspot_id: i64,
    object: ApiObject,
}

fn deal_path(id: i64) -> String {
    format!("/deals/v1/deal/{}", id)
}

impl Deal {
    pub fn from_content(hubspot_id: i64, content: Value) -> Self {
        Self {
            hubspot_id,
            object: ApiObject::new(content),
        }
    }

    pub fn object(&self) -> &ApiObject {
        &self.object
    }

    pub async fn fetch(client: &HubspotClient, hubspot_id: i64) -> Result<Self, ApiError> {
        debug!(hubspot_id = hubspot_id, "hubspot_deal_fetch");
        let content = client.get(&deal_path(hubspot_id), &[]).await?;
        Ok(Self::from_content(hubspot_id, content))
    }

    pub async fn update(&self, client: &HubspotClient, properties: &PropertyMap) -> Result<(), ApiError> {
        debug!(
            hubspot_id = self.hubspot_id,
            properties = ?properties.keys().collect::<Vec<_>>(),
            "hubspot_deal_update"
        );
        client
            .put(&deal_path(self.hubspot_id), &properties_payload("name", properties))
            .await?;
        Ok(())
    }

    pub fn name(&self) -> Option<String> {
        self.object.property_value("dealname")
    }

    pub fn currency_code(&self) -> Option<String> {
        self.object.property_value("deal_currency_code")
    }

    /// Deal amount in the portal's home currency.
    pub fn amount(&self) -> Option<Money> {
        Money::parse(
            &self.object.property_value("amount_in_home_currency")?,
            &self.currency_code()?,
        )
    }

    pub fn close_date(&self) -> Option<DateTime<Utc>> {
        self.object
            .property_value("closedate")
            .filter(|raw| !raw.is_empty())
            .and_then(|raw| parse_hubspot_timestamp(&raw))
    }

    pub fn payment_mode(&self) -> Option<String> {
        self.object.property_value("payment_mode")
    }

    pub fn owner_id(&self) -> Option<i64> {
        self.object
            .property_value("hubspot_owner_id")
            .and_then(|id| id.parse().ok())
    }

    pub fn pipeline_id(&self) -> Option<String> {
        self.object.property_value("pipeline")
    }

    pub fn deal_stage_id(&self) -> Option<String> {
        self.object.property_value("dealstage")
    }

    fn association_ids(&self, name: &str) -> Option<Vec<i64>> {
        let ids = self.object.content().get("associations")?.get(name)?.as_array()?;
        Some(ids.iter().filter_map(value_to_id).collect())
    }

    /// Visitor ids of the associated contacts.
    pub fn contact_ids(&self) -> Vec<i64> {
        self.association_ids("associatedVids").unwrap_or_default()
    }

    /// First associated company. Deals normally have at most one.
    pub fn company_id(&self) -> Option<i64> {
        self.association_ids("associatedCompanyIds")
            .and_then(|ids| ids.first().copied())
    }

    pub async fn contacts(&self, client: &HubspotClient) -> Result<Vec<Contact>, ApiError> {
        let mut contacts = Vec::new();
        for vid in self.contact_ids() {
            contacts.push(Contact::fetch(client, vid).await?);
        }
        Ok(contacts)
    }

    pub async fn company(&self, client: &HubspotClient) -> Result<Option<Company>, ApiError> {
        match self.company_id() {
            Some(id) => Ok(Some(Company::fetch(client, id).await?)),
            None => {
                warn!(hubspot_id = self.hubspot_id, "hubspot_deal_without_company");
                Ok(None)
            }
        }
    }

    pub async fn owner(&self, client: &HubspotClient) -> Result<Option<Owner>, ApiError> {
        match self.owner_id() {
            Some(id) => Ok(Some(Owner::fetch(client, id).await?)),
            None => Ok(None),
        }
    }

    /// Resolve the current stage from the deal's pipeline.
    ///
    /// Costs one call to the pipelines API. Returns `None` when the deal has
    /// no pipeline or stage, or when the pipeline does not list the stage.
    pub async fn deal_stage(&self, client: &HubspotClient) -> Result<Option<DealStage>, ApiError> {
        let Some(pipeline_id) = self.pipeline_id() else {
            error!(hubspot_id = self.hubspot_id, "hubspot_deal_without_pipeline");
            return Ok(None);
        };
        let Some(stage_id) = self.deal_stage_id() else {
            error!(hubspot_id = self.hubspot_id, "hubspot_deal_without_stage");
            return Ok(None);
        };

        let pipeline = client
            .get(&format!("/deals/v1/pipelines/{}", pipeline_id), &[])
            .await?;
        let stages = pipeline
            .get("stages")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        if stages.is_empty() {
            warn!(
                hubspot_id = self.hubspot_id,
                pipeline_id = %pipeline_id,
                "hubspot_pipeline_without_stages"
            );
        }

        let stage = stages
            .into_iter()
            .find(|s| s.get("stageId").and_then(Value::as_str) == Some(stage_id.as_str()));

        match stage {
            Some(stage) => serde_json::from_value(stage)
                .map(Some)
                .map_err(|e| ApiError::Decode(e.to_string())),
            None => {
                error!(
                    hubspot_id = self.hubspot_id,
                    pipeline_id = %pipeline_id,
                    stage_id = %stage_id,
                    "hubspot_deal_stage_not_in_pipeline"
                );
                Ok(None)
            }
        }
    }

    /// Load the products sold in this deal.
    ///
    /// One call to the associations API plus one call per line item. Line
    /// items that are not catalogue products are skipped.
    pub async fn products(&self, client: &HubspotClient, extra_properties: &[&str]) -> Result<Vec<Product>, ApiError> {
        let properties: Vec<&str> = LINE_ITEM_PROPERTIES
            .iter()
            .chain(extra_properties)
            .copied()
            .collect();

        let line_ids = client
            .associated_ids(self.hubspot_id, AssociationType::DealToLineItems)
            .await?;

        let mut products = Vec::with_capacity(line_ids.len());
        for line_id in line_ids {
            let line = LineItem::fetch(client, line_id, &properties).await?;
            match Product::from_line_item(line) {
                Ok(product) => products.push(product),
                Err(e) => {
                    warn!(
                        hubspot_id = self.hubspot_id,
                        line_item_id = line_id,
                        error = %e,
                        "hubspot_deal_line_item_skipped"
                    );
                }
            }
        }

        debug!(
            hubspot_id = self.hubspot_id,
            product_count = products.len(),
            "hubspot_deal_products_loaded"
        );
        Ok(products)
    }
}
