//! Note engagements attached to companies or contacts.

use serde_json::{json, Value};
use tracing::info;

use super::client::HubspotClient;
use crate::error::ApiError;

const ENGAGEMENTS_PATH: &str = "/engagements/v1/engagements";

/// Object a note is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteTarget {
    Company(i64),
    Contact(i64),
}

impl NoteTarget {
    fn associations(&self) -> Value {
        match self {
            NoteTarget::Company(id) => json!({ "companyIds": [id] }),
            NoteTarget::Contact(id) => json!({ "contactIds": [id] }),
        }
    }
}

fn note_payload(target: NoteTarget, body: &str) -> Value {
    json!({
        "engagement": { "type": "NOTE" },
        "associations": target.associations(),
        "metadata": { "body": body },
    })
}

/// Create a NOTE engagement and return HubSpot's reply.
pub async fn create_note(client: &HubspotClient, target: NoteTarget, body: &str) -> Result<Value, ApiError> {
    let created = client.post(ENGAGEMENTS_PATH, &note_payload(target, body)).await?;

    info!(
        target = ?target,
        engagement_id = ?created.pointer("/engagement/id"),
        "hubspot_note_created"
    );
    Ok(created)
}

pub async fn create_company_note(client: &HubspotClient, company_id: i64, body: &str) -> Result<Value, ApiError> {
    create_note(client, NoteTarget::Company(company_id), body).await
}

pub async fn create_contact_note(client: &HubspotClient, contact_id: i64, body: &str) -> Result<Value, ApiError> {
    create_note(client, NoteTarget::Contact(contact_id), body).await
}
