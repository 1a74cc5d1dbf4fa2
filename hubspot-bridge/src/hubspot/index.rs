//! In-memory reverse index of companies by property value.
//!
//! Used to find the HubSpot company carrying an external identifier (a
//! registration number, a legacy id) without a search API. Each property is
//! indexed on first use by listing every company once.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use super::client::HubspotClient;
use super::company::Company;
use crate::error::ApiError;

/// property value → company ids
type ValueIndex = HashMap<String, Vec<i64>>;

#[derive(Clone)]
pub struct CompanyIndex {
    client: HubspotClient,
    by_property: Arc<RwLock<HashMap<String, ValueIndex>>>,
}

impl CompanyIndex {
    pub fn new(client: HubspotClient) -> Self {
        Self {
            client,
            by_property: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Ids of the companies whose `property` equals `value`.
    ///
    /// A missing index is built without holding the lock, so lookups on
    /// other properties are never blocked by the listing.
    pub async fn filter(&self, property: &str, value: &str) -> Result<Vec<i64>, ApiError> {
        if let Some(ids) = self.lookup(property, value).await {
            return Ok(ids);
        }

        let built = self.build(property).await?;

        let mut indexes = self.by_property.write().await;
        // A concurrent build may have finished first; keep that one
        let index = indexes.entry(property.to_string()).or_insert(built);
        Ok(index.get(value).cloned().unwrap_or_default())
    }

    async fn lookup(&self, property: &str, value: &str) -> Option<Vec<i64>> {
        let indexes = self.by_property.read().await;
        indexes
            .get(property)
            .map(|index| index.get(value).cloned().unwrap_or_default())
    }

    /// First company whose `property` equals `value`.
    pub async fn first_id(&self, property: &str, value: &str) -> Result<Option<i64>, ApiError> {
        Ok(self.filter(property, value).await?.first().copied())
    }

    /// Rebuild the index of one property from HubSpot.
    pub async fn force_reindex(&self, property: &str) -> Result<(), ApiError> {
        let index = self.build(property).await?;
        self.by_property
            .write()
            .await
            .insert(property.to_string(), index);
        Ok(())
    }

    async fn build(&self, property: &str) -> Result<ValueIndex, ApiError> {
        info!(property = %property, "hubspot_company_index_building");

        let mut index = ValueIndex::new();
        for company in Company::all(&self.client, &[property]).await? {
            if let Some(value) = company.object().property_value(property).filter(|v| !v.is_empty()) {
                index.entry(value).or_default().push(company.hubspot_id);
            }
        }

        info!(
            property = %property,
            distinct_values = index.len(),
            "hubspot_company_index_built"
        );
        Ok(index)
    }
}
