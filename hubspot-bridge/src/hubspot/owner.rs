//! CRM owners (HubSpot users that own records).

use serde_json::Value;
use tracing::debug;

use super::client::HubspotClient;
use super::object::ApiObject;
use crate::error::ApiError;

const OWNERS_PATH: &str = "/owners/v2/owners";

#[derive(Debug, Clone, PartialEq)]
pub struct Owner {
    pub hubspot_id: i64,
    object: ApiObject,
}

impl Owner {
    pub fn from_content(hubspot_id: i64, content: Value) -> Self {
        Self {
            hubspot_id,
            object: ApiObject::new(content),
        }
    }

    pub async fn fetch(client: &HubspotClient, hubspot_id: i64) -> Result<Self, ApiError> {
        debug!(hubspot_id = hubspot_id, "hubspot_owner_fetch");
        let content = client
            .get(&format!("{}/{}", OWNERS_PATH, hubspot_id), &[])
            .await?;
        Ok(Self::from_content(hubspot_id, content))
    }

    /// Look an owner up by email. `None` when no owner has this address.
    pub async fn by_email(client: &HubspotClient, email: &str) -> Result<Option<Self>, ApiError> {
        let owners = client
            .get(OWNERS_PATH, &[("email", email.to_string())])
            .await?;

        let owner = owners
            .as_array()
            .and_then(|owners| owners.first())
            .map(|content| ApiObject::new(content.clone()))
            .and_then(|object| object.id_field("ownerId").map(|id| Self { hubspot_id: id, object }));

        debug!(found = owner.is_some(), "hubspot_owner_lookup");
        Ok(owner)
    }

    pub fn first_name(&self) -> Option<String> {
        self.object.field("firstName")
    }

    pub fn last_name(&self) -> Option<String> {
        self.object.field("lastName")
    }

    pub fn email(&self) -> Option<String> {
        self.object.field("email")
    }
}
