use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, ETAG, IF_MATCH};
use reqwest::StatusCode;
use tracing::debug;

use crate::errors::ServiceError;
use super::{Document, DocumentStore, WriteOptions};

const MS_VERSION_HEADER: &str = "x-ms-version";

/// HTTP client for JSON files kept in a OneLake lakehouse folder.
///
/// Every document lives at `{base_url}/{name}`. Reads are anonymous; writes
/// send the session's bearer token together with the storage API version.
#[derive(Clone)]
pub struct OneLakeStore {
    http: reqwest::Client,
    base_url: String,
    api_version: String,
}

impl OneLakeStore {
    pub fn new(base_url: impl Into<String>, api_version: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, api_version)
    }

    /// Reuse an existing [`reqwest::Client`] (connection pooling across stores).
    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>, api_version: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { http, base_url, api_version: api_version.into() }
    }

    pub fn from_config(cfg: &configs::StoreConfig) -> Result<Self, ServiceError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .build()?;
        Ok(Self::with_client(http, cfg.base_url.clone(), cfg.api_version.clone()))
    }

    pub fn base_url(&self) -> &str { &self.base_url }

    fn url(&self, name: &str) -> String { format!("{}/{}", self.base_url, name) }

    async fn status_error(response: reqwest::Response) -> ServiceError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = if body.trim().is_empty() {
            status.canonical_reason().unwrap_or("unknown status").to_string()
        } else {
            body
        };
        ServiceError::Status { status: status.as_u16(), message }
    }

    fn etag_of(response: &reqwest::Response) -> Option<String> {
        response
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
    }
}

#[async_trait]
impl DocumentStore for OneLakeStore {
    async fn get(&self, name: &str) -> Result<Document, ServiceError> {
        let url = self.url(name);
        let response = self.http.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }
        let etag = Self::etag_of(&response);
        let body = response.bytes().await?.to_vec();
        debug!(%url, bytes = body.len(), etag = ?etag, "document fetched");
        Ok(Document { body, etag })
    }

    async fn put(&self, name: &str, body: Vec<u8>, opts: WriteOptions<'_>) -> Result<Option<String>, ServiceError> {
        let url = self.url(name);
        let mut request = self
            .http
            .put(&url)
            .header(CONTENT_TYPE, "application/json")
            .header(MS_VERSION_HEADER, &self.api_version)
            .body(body);
        if let Some(token) = opts.token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        if let Some(etag) = opts.if_match {
            request = request.header(IF_MATCH, etag);
        }

        let response = request.send().await?;
        let status = response.status();
        if status == StatusCode::PRECONDITION_FAILED {
            return Err(ServiceError::Conflict(format!("{name} changed since it was read")));
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let err = Self::status_error(response).await;
            return Err(ServiceError::Auth(err.to_string()));
        }
        if !status.is_success() {
            return Err(Self::status_error(response).await);
        }
        let etag = Self::etag_of(&response);
        debug!(%url, status = status.as_u16(), etag = ?etag, "document replaced");
        Ok(etag)
    }
}
