//! Company helpers.

use serde_json::{json, Value};
use tracing::{debug, info};

use super::client::{AssociationType, HubspotClient, PAGE_LIMIT};
use super::contact::Contact;
use super::note::{create_note, NoteTarget};
use super::object::{created_id, properties_payload, ApiObject, PropertyMap};
use crate::error::ApiError;

/// A HubSpot company.
#[derive(Debug, Clone, PartialEq)]
pub struct Company {
    pub hubspot_id: i64,
    object: ApiObject,
}

fn company_path(id: i64) -> String {
    format!("/companies/v2/companies/{}", id)
}

impl Company {
    /// Wrap an API payload without another request.
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
        debug!(hubspot_id = hubspot_id, "hubspot_company_fetch");
        let content = client.get(&company_path(hubspot_id), &[]).await?;
        Ok(Self::from_content(hubspot_id, content))
    }

    pub async fn create(client: &HubspotClient, properties: &PropertyMap) -> Result<Self, ApiError> {
        let content = client
            .post("/companies/v2/companies", &properties_payload("name", properties))
            .await?;
        let hubspot_id = created_id(&content, "companyId")?;

        info!(hubspot_id = hubspot_id, "hubspot_company_created");
        Ok(Self::from_content(hubspot_id, content))
    }

    pub async fn update(&self, client: &HubspotClient, properties: &PropertyMap) -> Result<(), ApiError> {
        debug!(
            hubspot_id = self.hubspot_id,
            properties = ?properties.keys().collect::<Vec<_>>(),
            "hubspot_company_update"
        );
        client
            .put(&company_path(self.hubspot_id), &properties_payload("name", properties))
            .await?;
        Ok(())
    }

    pub async fn delete(client: &HubspotClient, hubspot_id: i64) -> Result<(), ApiError> {
        client.delete(&company_path(hubspot_id)).await?;
        info!(hubspot_id = hubspot_id, "hubspot_company_deleted");
        Ok(())
    }

    /// List every company, requesting the given properties on each.
    pub async fn all(client: &HubspotClient, properties: &[&str]) -> Result<Vec<Self>, ApiError> {
        let mut companies = Vec::new();
        let mut offset: Option<i64> = None;

        loop {
            let mut query: Vec<(&str, String)> = properties
                .iter()
                .map(|p| ("properties", p.to_string()))
                .collect();
            query.push(("limit", PAGE_LIMIT.to_string()));
            if let Some(offset) = offset {
                query.push(("offset", offset.to_string()));
            }

            let page = client.get("/companies/v2/companies/paged", &query).await?;
            let items = page
                .get("companies")
                .and_then(Value::as_array)
                .ok_or_else(|| ApiError::Decode("missing `companies` in page".to_string()))?;

            for item in items {
                let object = ApiObject::new(item.clone());
                if let Some(id) = object.id_field("companyId") {
                    companies.push(Self { hubspot_id: id, object });
                }
            }

            match (
                page.get("has-more").and_then(Value::as_bool),
                page.get("offset").and_then(Value::as_i64),
            ) {
                (Some(true), Some(next)) => offset = Some(next),
                _ => break,
            }
        }

        debug!(count = companies.len(), "hubspot_companies_listed");
        Ok(companies)
    }

    /// Delete every company whose properties equal all of `having`.
    /// An empty `having` deletes every company.
    ///
    /// Returns the number of deleted companies.
    pub async fn delete_matching(client: &HubspotClient, having: &PropertyMap) -> Result<usize, ApiError> {
        let names: Vec<&str> = having.keys().map(String::as_str).collect();
        let companies = Self::all(client, &names).await?;

        let mut deleted = 0;
        for company in companies.iter().filter(|c| c.object.matches(having)) {
            Self::delete(client, company.hubspot_id).await?;
            deleted += 1;
        }

        info!(deleted = deleted, "hubspot_companies_deleted");
        Ok(deleted)
    }

    pub fn name(&self) -> Option<String> {
        self.object.property_value("name")
    }

    pub fn website(&self) -> Option<String> {
        self.object.property_value("website")
    }

    pub fn address(&self) -> Option<String> {
        self.object.property_value("address")
    }

    pub fn address2(&self) -> Option<String> {
        self.object.property_value("address2")
    }

    pub fn country(&self) -> Option<String> {
        self.object.property_value("country")
    }

    pub fn city(&self) -> Option<String> {
        self.object.property_value("city")
    }

    pub fn zip(&self) -> Option<String> {
        self.object.property_value("zip")
    }

    pub fn parent_company_id(&self) -> Option<i64> {
        self.object
            .property_value("hs_parent_company_id")
            .and_then(|id| id.parse().ok())
    }

    pub async fn parent_company(&self, client: &HubspotClient) -> Result<Option<Company>, ApiError> {
        match self.parent_company_id() {
            Some(id) => Ok(Some(Company::fetch(client, id).await?)),
            None => Ok(None),
        }
    }

    /// Fetch the contacts associated to this company.
    pub async fn contacts(&self, client: &HubspotClient) -> Result<Vec<Contact>, ApiError> {
        let vids = client
            .associated_ids(self.hubspot_id, AssociationType::CompanyToContacts)
            .await?;

        let mut contacts = Vec::with_capacity(vids.len());
        for vid in vids {
            contacts.push(Contact::fetch(client, vid).await?);
        }
        Ok(contacts)
    }

    pub async fn create_note(&self, client: &HubspotClient, body: &str) -> Result<Value, ApiError> {
        create_note(client, NoteTarget::Company(self.hubspot_id), body).await
    }
}

impl From<Company> for Value {
    fn from(company: Company) -> Self {
        json!({ "hubspotId": company.hubspot_id, "content": company.object.into_content() })
    }
}
