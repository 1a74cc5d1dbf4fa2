//! Typed helpers over the HubSpot CRM REST API.
//!
//! Every helper takes a shared [`HubspotClient`]; objects keep the raw JSON
//! content they were fetched with and expose typed accessors over it.
//!
//! ```text
//! HubspotClient ─┬─ Company ── contacts(), CompanyIndex
//!                ├─ Contact ── all(), delete_matching()
//!                ├─ Deal ── deal_stage(), products() → LineItem → Product
//!                ├─ Owner
//!                ├─ note::create_*_note()
//!                └─ properties::{list, create, delete, *_group(s)}
//! ```

pub mod client;
pub mod company;
pub mod contact;
pub mod deal;
pub mod index;
pub mod line_item;
pub mod note;
pub mod object;
pub mod owner;
pub mod product;
pub mod properties;

pub use client::{AssociationType, HubspotClient};
pub use company::Company;
pub use contact::Contact;
pub use deal::{Deal, DealStage};
pub use index::CompanyIndex;
pub use line_item::LineItem;
pub use note::{create_company_note, create_contact_note, NoteTarget};
pub use object::{ApiObject, Money, PropertyMap};
pub use owner::Owner;
pub use product::Product;
pub use properties::{DataType, NewProperty, ObjectType, PropertyDefinition, PropertyGroup, PropertyOption, WidgetType};

#[cfg(test)]
pub(crate) fn test_client(base_url: &str) -> HubspotClient {
    HubspotClient::new(base_url, "test-token", std::time::Duration::from_secs(5)).unwrap()
}
