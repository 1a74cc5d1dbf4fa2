//! Custom property and property group management.
//!
//! Properties have no id: they are addressed by object type and name.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use super::client::HubspotClient;
use crate::error::ApiError;

/// CRM object types that carry property definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Companies,
    Contacts,
    Deals,
    Products,
}

impl ObjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::Companies => "companies",
            ObjectType::Contacts => "contacts",
            ObjectType::Deals => "deals",
            ObjectType::Products => "products",
        }
    }

    fn properties_path(&self) -> String {
        format!("/properties/v1/{}/properties", self.as_str())
    }

    fn groups_path(&self) -> String {
        format!("/properties/v1/{}/groups", self.as_str())
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectType {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "companies" => Ok(ObjectType::Companies),
            "contacts" => Ok(ObjectType::Contacts),
            "deals" => Ok(ObjectType::Deals),
            "products" => Ok(ObjectType::Products),
            other => Err(ApiError::InvalidInput(format!(
                "{} is not a valid properties type",
                other
            ))),
        }
    }
}

/// Choice offered by an enumeration property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyOption {
    pub label: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_order: Option<i64>,
}

/// A property definition as listed by HubSpot.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDefinition {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub group_name: Option<String>,
    #[serde(rename = "type")]
    pub property_type: String,
    pub field_type: String,
    #[serde(default, rename = "readOnlyValue")]
    pub read_only: bool,
    #[serde(default)]
    pub hubspot_defined: Option<bool>,
    #[serde(default)]
    pub options: Vec<PropertyOption>,
}

impl PropertyDefinition {
    pub fn is_custom(&self) -> bool {
        self.hubspot_defined != Some(true)
    }
}

/// A property group as listed by HubSpot.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyGroup {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub display_order: Option<i64>,
    #[serde(default)]
    pub hubspot_defined: Option<bool>,
}

impl PropertyGroup {
    pub fn is_custom(&self) -> bool {
        self.hubspot_defined != Some(true)
    }
}

/// Stored data type of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Bool,
    Datetime,
    Enumeration,
    Number,
    String,
}

/// Form widget used to edit a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetType {
    Checkbox,
    Currency,
    Date,
    File,
    Number,
    Radio,
    Select,
    Text,
    Textarea,
}

/// A property to create.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProperty {
    /// Internal name; underscores only, no dashes.
    pub name: String,
    pub label: String,
    pub description: String,
    pub group_name: String,
    pub data_type: DataType,
    pub widget_type: WidgetType,
    pub options: Vec<PropertyOption>,
}

impl NewProperty {
    fn validate(&self) -> Result<(), ApiError> {
        if self.name.is_empty() || self.name.contains('-') {
            return Err(ApiError::InvalidInput(format!(
                "property name {:?} must be non-empty and must not contain dashes",
                self.name
            )));
        }
        Ok(())
    }

    /// Request body for the create call.
    ///
    /// HubSpot has no currency widget of its own: without options it is sent
    /// as a number displayed with the currency symbol.
    fn payload(&self) -> Value {
        let mut payload = json!({
            "name": self.name,
            "label": self.label,
            "description": self.description,
            "groupName": self.group_name,
            "type": self.data_type,
            "fieldType": self.widget_type,
        });

        if !self.options.is_empty() {
            payload["options"] = json!(self.options);
        } else if self.widget_type == WidgetType::Currency {
            payload["fieldType"] = json!(WidgetType::Number);
            payload["displayMode"] = json!("current_value");
            payload["showCurrencySymbol"] = json!(true);
        }

        payload
    }
}

/// List every property defined on an object type.
pub async fn list(client: &HubspotClient, object_type: ObjectType) -> Result<Vec<PropertyDefinition>, ApiError> {
    let content = client.get(&object_type.properties_path(), &[]).await?;
    let definitions: Vec<PropertyDefinition> =
        serde_json::from_value(content).map_err(|e| ApiError::Decode(e.to_string()))?;

    debug!(object_type = %object_type, count = definitions.len(), "hubspot_properties_listed");
    Ok(definitions)
}

pub async fn create(client: &HubspotClient, object_type: ObjectType, property: &NewProperty) -> Result<Value, ApiError> {
    property.validate()?;
    let created = client
        .post(&object_type.properties_path(), &property.payload())
        .await?;

    info!(object_type = %object_type, name = %property.name, "hubspot_property_created");
    Ok(created)
}

pub async fn delete(client: &HubspotClient, object_type: ObjectType, name: &str) -> Result<(), ApiError> {
    client
        .delete(&format!("{}/named/{}", object_type.properties_path(), name))
        .await?;

    info!(object_type = %object_type, name = %name, "hubspot_property_deleted");
    Ok(())
}

/// Delete every property that HubSpot did not define itself.
pub async fn delete_all_custom(client: &HubspotClient, object_type: ObjectType) -> Result<usize, ApiError> {
    let custom: Vec<PropertyDefinition> = list(client, object_type)
        .await?
        .into_iter()
        .filter(PropertyDefinition::is_custom)
        .collect();

    for property in &custom {
        delete(client, object_type, &property.name).await?;
    }
    Ok(custom.len())
}

pub async fn create_group(
    client: &HubspotClient,
    object_type: ObjectType,
    name: &str,
    display_name: &str,
) -> Result<Value, ApiError> {
    if name.contains('-') {
        return Err(ApiError::InvalidInput(format!(
            "property group name {:?} must not contain dashes",
            name
        )));
    }

    let created = client
        .post(
            &object_type.groups_path(),
            &json!({ "name": name, "displayName": display_name }),
        )
        .await?;

    info!(object_type = %object_type, name = %name, "hubspot_property_group_created");
    Ok(created)
}

pub async fn delete_group(client: &HubspotClient, object_type: ObjectType, name: &str) -> Result<(), ApiError> {
    client
        .delete(&format!("{}/named/{}", object_type.groups_path(), name))
        .await?;

    info!(object_type = %object_type, name = %name, "hubspot_property_group_deleted");
    Ok(())
}

/// List every property group of an object type.
pub async fn list_groups(client: &HubspotClient, object_type: ObjectType) -> Result<Vec<PropertyGroup>, ApiError> {
    let content = client.get(&object_type.groups_path(), &[]).await?;
    let groups: Vec<PropertyGroup> =
        serde_json::from_value(content).map_err(|e| ApiError::Decode(e.to_string()))?;

    debug!(object_type = %object_type, count = groups.len(), "hubspot_property_groups_listed");
    Ok(groups)
}

/// Delete every property group that HubSpot did not define itself.
pub async fn delete_all_custom_groups(client: &HubspotClient, object_type: ObjectType) -> Result<usize, ApiError> {
    let custom: Vec<PropertyGroup> = list_groups(client, object_type)
        .await?
        .into_iter()
        .filter(PropertyGroup::is_custom)
        .collect();

    for group in &custom {
        delete_group(client, object_type, &group.name).await?;
    }
    Ok(custom.len())
}
