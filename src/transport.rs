//! Authenticated access to the Notion API.
//!
//! [`NotionApi`] is the seam every component talks through: three verbs,
//! each returning the decoded JSON body or an [`ApiError`]. The
//! [`NotionClient`] implementation logs every failure (method, URL,
//! status, response body) before returning it, so callers may skip the
//! dependent step without printing anything themselves.
//!
//! There are no retries, no timeout override and no rate-limit handling:
//! a failed call is reported once and the step that needed it is skipped.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use crate::config::Config;
use crate::error::ApiError;

/// Transport used by every provisioning component.
///
/// Paths are relative to the API base (e.g. `/databases/{id}`).
#[async_trait]
pub trait NotionApi: Send + Sync {
    /// Read a collection schema.
    async fn get(&self, path: &str) -> Result<Value, ApiError>;

    /// Create a collection or record, or run a query.
    async fn post(&self, path: &str, body: Value) -> Result<Value, ApiError>;

    /// Partially update a collection schema.
    async fn patch(&self, path: &str, body: Value) -> Result<Value, ApiError>;
}

/// `reqwest`-backed client carrying the bearer token and protocol version.
pub struct NotionClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    notion_version: String,
}

impl NotionClient {
    pub fn new(base_url: &str, api_key: &str, notion_version: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            notion_version: notion_version.to_string(),
        }
    }

    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `NOTION_API_KEY` is not set.
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config.require_api_key()?;
        Ok(Self::new(
            &config.api.base_url,
            api_key,
            &config.api.notion_version,
        ))
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, ApiError> {
        let url = self.url(path);
        let method_name = method_label(&method);

        let mut req = self
            .client
            .request(method, &url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .header("Notion-Version", &self.notion_version);
        if let Some(ref body) = body {
            req = req.json(body);
        }

        let resp = match req.send().await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::error!(method = method_name, url = %url, error = %e, "request failed");
                return Err(ApiError::RequestFailed {
                    method: method_name,
                    url,
                    status: None,
                    message: e.to_string(),
                });
            }
        };

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            tracing::error!(
                method = method_name,
                url = %url,
                status = status.as_u16(),
                body = %text,
                "request rejected"
            );
            return Err(ApiError::RequestFailed {
                method: method_name,
                url,
                status: Some(status.as_u16()),
                message: text,
            });
        }

        match resp.json::<Value>().await {
            Ok(json) => Ok(json),
            Err(e) => {
                tracing::error!(method = method_name, url = %url, error = %e, "unreadable response body");
                Err(ApiError::RequestFailed {
                    method: method_name,
                    url,
                    status: Some(status.as_u16()),
                    message: e.to_string(),
                })
            }
        }
    }
}

fn method_label(method: &reqwest::Method) -> &'static str {
    match *method {
        reqwest::Method::GET => "GET",
        reqwest::Method::POST => "POST",
        reqwest::Method::PATCH => "PATCH",
        _ => "REQUEST",
    }
}

#[async_trait]
impl NotionApi for NotionClient {
    async fn get(&self, path: &str) -> Result<Value, ApiError> {
        self.send(reqwest::Method::GET, path, None).await
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value, ApiError> {
        self.send(reqwest::Method::POST, path, Some(body)).await
    }

    async fn patch(&self, path: &str, body: Value) -> Result<Value, ApiError> {
        self.send(reqwest::Method::PATCH, path, Some(body)).await
    }
}
