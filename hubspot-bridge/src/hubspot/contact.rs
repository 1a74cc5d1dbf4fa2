//! Contact helpers.
//!
//! Contacts are addressed by their `vid` (visitor id).

use serde_json::Value;
use tracing::{debug, info};

use super::client::HubspotClient;
use super::note::{create_note, NoteTarget};
use super::object::{created_id, properties_payload, ApiObject, PropertyMap};
use crate::error::ApiError;

/// Page size of the contact listing (the endpoint's maximum).
const LIST_PAGE_SIZE: u32 = 100;

fn contact_path(vid: i64) -> String {
    format!("/contacts/v1/contact/vid/{}", vid)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Contact {
    pub hubspot_id: i64,
    object: ApiObject,
}

impl Contact {
    pub fn from_content(hubspot_id: i64, content: Value) -> Self {
        Self {
            hubspot_id,
            object: ApiObject::new(content),
        }
    }

    pub fn object(&self) -> &ApiObject {
        &self.object
    }

    pub async fn fetch(client: &HubspotClient, vid: i64) -> Result<Self, ApiError> {
        debug!(hubspot_id = vid, "hubspot_contact_fetch");
        let content = client
            .get(&format!("{}/profile", contact_path(vid)), &[])
            .await?;
        Ok(Self::from_content(vid, content))
    }

    pub async fn create(client: &HubspotClient, properties: &PropertyMap) -> Result<Self, ApiError> {
        let content = client
            .post("/contacts/v1/contact", &properties_payload("property", properties))
            .await?;
        let vid = created_id(&content, "vid")?;

        info!(hubspot_id = vid, "hubspot_contact_created");
        Ok(Self::from_content(vid, content))
    }

    pub async fn delete(client: &HubspotClient, vid: i64) -> Result<(), ApiError> {
        client.delete(&contact_path(vid)).await?;
        info!(hubspot_id = vid, "hubspot_contact_deleted");
        Ok(())
    }

    /// List every contact, requesting the given properties on each.
    pub async fn all(client: &HubspotClient, properties: &[&str]) -> Result<Vec<Self>, ApiError> {
        let mut contacts = Vec::new();
        let mut vid_offset: Option<i64> = None;

        loop {
            let mut query: Vec<(&str, String)> = properties
                .iter()
                .map(|p| ("property", p.to_string()))
                .collect();
            query.push(("count", LIST_PAGE_SIZE.to_string()));
            if let Some(offset) = vid_offset {
                query.push(("vidOffset", offset.to_string()));
            }

            let page = client.get("/contacts/v1/lists/all/contacts/all", &query).await?;
            let items = page
                .get("contacts")
                .and_then(Value::as_array)
                .ok_or_else(|| ApiError::Decode("missing `contacts` in page".to_string()))?;

            for item in items {
                let object = ApiObject::new(item.clone());
                if let Some(vid) = object.id_field("vid") {
                    contacts.push(Self { hubspot_id: vid, object });
                }
            }

            match (
                page.get("has-more").and_then(Value::as_bool),
                page.get("vid-offset").and_then(Value::as_i64),
            ) {
                (Some(true), Some(next)) => vid_offset = Some(next),
                _ => break,
            }
        }

        debug!(count = contacts.len(), "hubspot_contacts_listed");
        Ok(contacts)
    }

    /// Delete every contact whose properties equal all of `having`.
    /// An empty `having` deletes every contact.
    ///
    /// Returns the number of deleted contacts.
    pub async fn delete_matching(client: &HubspotClient, having: &PropertyMap) -> Result<usize, ApiError> {
        let names: Vec<&str> = having.keys().map(String::as_str).collect();
        let contacts = Self::all(client, &names).await?;

        let mut deleted = 0;
        for contact in contacts.iter().filter(|c| c.object.matches(having)) {
            Self::delete(client, contact.hubspot_id).await?;
            deleted += 1;
        }

        info!(deleted = deleted, "hubspot_contacts_deleted");
        Ok(deleted)
    }

    /// Associate this contact to a company.
    pub async fn link_to_company(&self, client: &HubspotClient, company_id: i64) -> Result<(), ApiError> {
        client
            .put_empty(&format!("/companies/v2/companies/{}/contacts/{}", company_id, self.hubspot_id))
            .await?;

        info!(
            hubspot_id = self.hubspot_id,
            company_id = company_id,
            "hubspot_contact_linked"
        );
        Ok(())
    }

    pub async fn create_note(&self, client: &HubspotClient, body: &str) -> Result<Value, ApiError> {
        create_note(client, NoteTarget::Contact(self.hubspot_id), body).await
    }

    pub fn associated_company_id(&self) -> Option<i64> {
        self.object
            .property_value("associatedcompanyid")
            .and_then(|id| id.parse().ok())
    }

    pub fn first_name(&self) -> Option<String> {
        self.object.property_value("firstname")
    }

    pub fn last_name(&self) -> Option<String> {
        self.object.property_value("lastname")
    }

    pub fn email(&self) -> Option<String> {
        self.object.property_value("email")
    }

    pub fn phone(&self) -> Option<String> {
        self.object.property_value("phone")
    }

    /// ISO country code HubSpot derived from the phone number, e.g. `FR`.
    pub fn phone_number_country_code(&self) -> Option<String> {
        self.object
            .property_value("hs_calculated_phone_number_country_code")
    }
}
