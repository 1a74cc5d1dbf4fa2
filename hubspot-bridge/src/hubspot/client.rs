//! Thin HTTP client for the HubSpot REST API.
//!
//! One `reqwest::Client` is shared by every helper object. Calls are single
//! requests with no retries; failures come back as [`ApiError`].

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::config::Config;
use crate::error::ApiError;

/// Page size for paged listing endpoints.
pub(crate) const PAGE_LIMIT: u32 = 250;

/// HubSpot-defined association types used by the helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssociationType {
    CompanyToContacts,
    DealToLineItems,
}

impl AssociationType {
    pub fn definition_id(&self) -> u32 {
        match self {
            AssociationType::CompanyToContacts => 2,
            AssociationType::DealToLineItems => 19,
        }
    }
}

/// Authenticated HubSpot API client.
#[derive(Clone)]
pub struct HubspotClient {
    http: Client,
    base_url: Url,
    api_key: String,
}

impl HubspotClient {
    /// Create a client for the given API root and private app token.
    pub fn new(base_url: &str, api_key: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url,
            api_key: api_key.into(),
        })
    }

    /// Create a client from application configuration.
    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        let api_key = config.api_key.clone().ok_or(ApiError::MissingApiKey)?;
        Self::new(
            &config.api_base_url,
            api_key,
            Duration::from_millis(config.request_timeout_ms),
        )
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let url = self.url(path)?;
        debug!(method = %method, url = %url, "hubspot_api_request");
        Ok(self.http.request(method, url).bearer_auth(&self.api_key))
    }

    /// GET a JSON document.
    pub async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Value, ApiError> {
        let response = self.request(Method::GET, path)?.query(query).send().await?;
        Self::read_json(path, response).await
    }

    /// Send a JSON body with the given method and read the JSON reply.
    pub async fn send(&self, method: Method, path: &str, body: &Value) -> Result<Value, ApiError> {
        let response = self.request(method, path)?.json(body).send().await?;
        Self::read_json(path, response).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        self.send(Method::POST, path, body).await
    }

    pub async fn put(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        self.send(Method::PUT, path, body).await
    }

    /// PUT without a request body (association endpoints).
    pub async fn put_empty(&self, path: &str) -> Result<Value, ApiError> {
        let response = self.request(Method::PUT, path)?.send().await?;
        Self::read_json(path, response).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let response = self.request(Method::DELETE, path)?.send().await?;
        Self::read_json(path, response).await.map(|_| ())
    }

    /// List the ids associated to an object, following pagination.
    pub async fn associated_ids(
        &self,
        object_id: i64,
        association: AssociationType,
    ) -> Result<Vec<i64>, ApiError> {
        let path = format!(
            "/crm-associations/v1/associations/{}/HUBSPOT_DEFINED/{}",
            object_id,
            association.definition_id()
        );

        let mut ids = Vec::new();
        let mut offset: Option<i64> = None;
        loop {
            let mut query = vec![("limit", PAGE_LIMIT.to_string())];
            if let Some(offset) = offset {
                query.push(("offset", offset.to_string()));
            }

            let page = self.get(&path, &query).await?;
            let results = page
                .get("results")
                .and_then(Value::as_array)
                .ok_or_else(|| ApiError::Decode(format!("missing `results` in {}", path)))?;
            ids.extend(results.iter().filter_map(Value::as_i64));

            match (page.get("hasMore").and_then(Value::as_bool), page.get("offset").and_then(Value::as_i64)) {
                (Some(true), Some(next)) => offset = Some(next),
                _ => break,
            }
        }

        Ok(ids)
    }

    async fn read_json(path: &str, response: Response) -> Result<Value, ApiError> {
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound {
                path: path.to_string(),
            });
        }

        let text = response.text().await?;

        if !status.is_success() {
            warn!(
                path = %path,
                status = status.as_u16(),
                body_preview = %text.chars().take(200).collect::<String>(),
                "hubspot_api_error"
            );
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    use crate::hubspot::test_client;

    #[test]
    fn test_from_config_requires_api_key() {
        let config = Config::new("secret").unwrap();

        assert!(matches!(
            HubspotClient::from_config(&config),
            Err(ApiError::MissingApiKey)
        ));
    }

    #[test]
    fn test_base_url_keeps_path_prefix() {
        let client = test_client("http://localhost:8080/hubspot");

        assert_eq!(
            client.url("/deals/v1/deal/1").unwrap().as_str(),
            "http://localhost:8080/hubspot/deals/v1/deal/1"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            HubspotClient::new("not a url", "token", Duration::from_secs(1)),
            Err(ApiError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_get_sends_bearer_token() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/owners/v2/owners/7")
            .match_header("authorization", "Bearer test-token")
            .with_status(200)
            .with_body(r#"{"ownerId": 7}"#)
            .create_async()
            .await;

        let value = test_client(&server.url())
            .get("/owners/v2/owners/7", &[])
            .await
            .unwrap();

        assert_eq!(value["ownerId"], 7);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/deals/v1/deal/1")
            .with_status(404)
            .create_async()
            .await;
        server
            .mock("GET", "/deals/v1/deal/2")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let client = test_client(&server.url());

        assert!(matches!(
            client.get("/deals/v1/deal/1", &[]).await,
            Err(ApiError::NotFound { .. })
        ));
        match client.get("/deals/v1/deal/2", &[]).await {
            Err(ApiError::Status { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("Expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_delete_accepts_empty_body() {
        let mut server = Server::new_async().await;
        server
            .mock("DELETE", "/companies/v2/companies/9")
            .with_status(204)
            .create_async()
            .await;

        assert!(test_client(&server.url())
            .delete("/companies/v2/companies/9")
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_put_empty_sends_no_body() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PUT", "/companies/v2/companies/4/contacts/5")
            .match_header("content-type", Matcher::Missing)
            .match_body(Matcher::Exact(String::new()))
            .with_body(r#"{"companyId": 4}"#)
            .create_async()
            .await;

        let value = test_client(&server.url())
            .put_empty("/companies/v2/companies/4/contacts/5")
            .await
            .unwrap();

        assert_eq!(value["companyId"], 4);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_associated_ids_follows_pages() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/crm-associations/v1/associations/10/HUBSPOT_DEFINED/2")
            .match_query(Matcher::Exact("limit=250".into()))
            .with_body(json!({"results": [1, 2], "hasMore": true, "offset": 2}).to_string())
            .create_async()
            .await;
        server
            .mock("GET", "/crm-associations/v1/associations/10/HUBSPOT_DEFINED/2")
            .match_query(Matcher::Exact("limit=250&offset=2".into()))
            .with_body(json!({"results": [3], "hasMore": false, "offset": 3}).to_string())
            .create_async()
            .await;

        let ids = test_client(&server.url())
            .associated_ids(10, AssociationType::CompanyToContacts)
            .await
            .unwrap();

        assert_eq!(ids, vec![1, 2, 3]);
    }
}
