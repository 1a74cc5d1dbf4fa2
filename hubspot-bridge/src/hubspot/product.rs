//! Product helpers.

use rust_decimal::Decimal;
use serde_json::{json, Map, Value};
use tracing::{debug, error, info};

use super::client::HubspotClient;
use super::line_item::{LineItem, PRODUCT_ID_PROPERTY};
use super::object::{created_id, value_to_id, ApiObject, Money, PropertyMap};
use crate::error::ApiError;

const PRODUCTS_PATH: &str = "/crm-objects/v1/objects/products";

/// Properties always requested when fetching a product.
const DEFAULT_PROPERTIES: [&str; 2] = ["name", "price"];

/// Currency product prices are expressed in.
pub const PRODUCT_CURRENCY: &str = "EUR";

#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub hubspot_id: i64,
    object: ApiObject,
}

impl Product {
    pub fn from_content(hubspot_id: i64, content: Value) -> Self {
        Self {
            hubspot_id,
            object: ApiObject::new(content),
        }
    }

    pub fn object(&self) -> &ApiObject {
        &self.object
    }

    /// Fetch a product with `name`, `price` and any extra properties.
    pub async fn fetch(
        client: &HubspotClient,
        hubspot_id: i64,
        extra_properties: &[&str],
    ) -> Result<Self, ApiError> {
        debug!(hubspot_id = hubspot_id, "hubspot_product_fetch");
        let query: Vec<(&str, String)> = DEFAULT_PROPERTIES
            .iter()
            .chain(extra_properties)
            .map(|p| ("properties", p.to_string()))
            .collect();

        let content = client
            .get(&format!("{}/{}", PRODUCTS_PATH, hubspot_id), &query)
            .await?;
        Ok(Self::from_content(hubspot_id, content))
    }

    pub async fn create(
        client: &HubspotClient,
        name: &str,
        description: &str,
        price: Decimal,
        custom_fields: &PropertyMap,
    ) -> Result<Self, ApiError> {
        let mut entries = vec![
            json!({ "name": "name", "value": name }),
            json!({ "name": "description", "value": description }),
            json!({ "name": "price", "value": price.to_string() }),
        ];
        entries.extend(
            custom_fields
                .iter()
                .map(|(name, value)| json!({ "name": name, "value": value })),
        );

        let content = client.post(PRODUCTS_PATH, &Value::Array(entries)).await?;
        let hubspot_id = created_id(&content, "objectId")?;

        info!(hubspot_id = hubspot_id, name = %name, "hubspot_product_created");
        Ok(Self::from_content(hubspot_id, content))
    }

    /// Build a product from a line item without another API call.
    ///
    /// The line item properties become the product properties, minus the
    /// product id link.
    pub fn from_line_item(line_item: LineItem) -> Result<Self, ApiError> {
        let line_item_id = line_item.hubspot_id;
        let product_id = match line_item.product_id() {
            Some(id) if line_item.is_product() => id,
            _ => {
                error!(line_item_id = line_item_id, "hubspot_line_item_not_a_product");
                return Err(ApiError::NotAProduct { line_item_id });
            }
        };

        let mut content = match line_item.into_object().into_content() {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        if let Some(properties) = content.get_mut("properties").and_then(Value::as_object_mut) {
            properties.remove(PRODUCT_ID_PROPERTY);
        }
        content.insert("objectType".to_string(), json!("PRODUCT"));
        content.insert("objectId".to_string(), json!(product_id));

        Ok(Self::from_content(product_id, Value::Object(content)))
    }

    pub fn name(&self) -> Option<String> {
        self.object.property_value("name")
    }

    pub fn price(&self) -> Option<Money> {
        Money::parse(&self.object.property_value("price")?, PRODUCT_CURRENCY)
    }

    pub fn quantity(&self) -> Option<i64> {
        self.object
            .properties()?
            .get("quantity")?
            .get("value")
            .and_then(value_to_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    use crate::hubspot::test_client;

    fn product_line() -> LineItem {
        LineItem::from_content(
            129392745,
            json!({
                "objectType": "LINE_ITEM",
                "objectId": 129392745,
                "properties": {
                    "name": {"value": "Standing desk"},
                    "price": {"value": "450.00"},
                    "quantity": {"value": "3"},
                    "hs_product_id": {"value": "24349443"}
                },
                "isDeleted": false
            }),
        )
    }

    #[test]
    fn test_from_line_item() {
        let product = Product::from_line_item(product_line()).unwrap();

        assert_eq!(product.hubspot_id, 24349443);
        assert_eq!(product.object().field("objectType").as_deref(), Some("PRODUCT"));
        assert_eq!(product.object().id_field("objectId"), Some(24349443));
        assert!(!product.object().has_property("hs_product_id"));
        assert_eq!(product.name().as_deref(), Some("Standing desk"));
        assert_eq!(product.quantity(), Some(3));

        let price = product.price().unwrap();
        assert_eq!(price.amount, Decimal::from(450));
        assert_eq!(price.currency, "EUR");
    }

    #[test]
    fn test_from_line_item_rejects_custom_lines() {
        let line = LineItem::from_content(5, json!({"properties": {"name": {"value": "Setup fee"}}}));

        assert!(matches!(
            Product::from_line_item(line),
            Err(ApiError::NotAProduct { line_item_id: 5 })
        ));
    }

    #[test]
    fn test_price_absent_or_invalid() {
        let no_price = Product::from_content(1, json!({"properties": {}}));
        let bad_price = Product::from_content(2, json!({"properties": {"price": {"value": "free"}}}));

        assert!(no_price.price().is_none());
        assert!(bad_price.price().is_none());
    }

    #[tokio::test]
    async fn test_fetch_product() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/crm-objects/v1/objects/products/24349443")
            .match_query(Matcher::Exact(
                "properties=name&properties=price&properties=sku".into(),
            ))
            .with_body(r#"{"objectId": 24349443, "properties": {"price": {"value": "99.9"}}}"#)
            .create_async()
            .await;

        let product = Product::fetch(&test_client(&server.url()), 24349443, &["sku"])
            .await
            .unwrap();

        assert_eq!(product.price().unwrap().to_string(), "99.90 EUR");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_product() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", PRODUCTS_PATH)
            .match_body(Matcher::Json(json!([
                {"name": "name", "value": "Chair"},
                {"name": "description", "value": "Ergonomic"},
                {"name": "price", "value": "120.50"},
                {"name": "sku", "value": "CH-1"}
            ])))
            .with_body(r#"{"objectId": 31, "objectType": "PRODUCT"}"#)
            .create_async()
            .await;

        let mut custom = PropertyMap::new();
        custom.insert("sku".to_string(), "CH-1".to_string());
        let product = Product::create(&test_client(&server.url()), "Chair", "Ergonomic", Decimal::new(12050, 2), &custom)
            .await
            .unwrap();

        assert_eq!(product.hubspot_id, 31);
        mock.assert_async().await;
    }
}
