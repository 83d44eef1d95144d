mod error;

use anyhow::{anyhow, Context, Result};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use url::Url;

use crate::models::{EntityKind, Resource};
pub use error::ApiError;

// ─── Client ─────────────────────────────────────────────────────────────────

/// Uniform CRUD client for the school administration backend.
///
/// Every entity lives under `{base}/{kind.path()}` and supports list, get,
/// create (POST), update (PUT) and delete.
#[derive(Debug, Clone)]
pub struct SchoolClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl SchoolClient {
    pub fn new(base_url: &str, token: Option<&str>) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid API URL: {base_url}"))?;
        if base_url.cannot_be_a_base() {
            return Err(anyhow!("API URL cannot be used as a base: {base_url}"));
        }

        let client = Client::builder()
            .user_agent(concat!("school-admin-tui/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url,
            token: token.filter(|t| !t.is_empty()).map(str::to_string),
        })
    }

    fn url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Other(anyhow!("Bad API base URL: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, method: Method, url: Url, body: Option<&Value>) -> Result<Response, ApiError> {
        tracing::debug!(%method, %url, "api request");
        let mut builder = self.request(method.clone(), url.clone());
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let resp = builder.send().await.map_err(|e| {
            tracing::warn!(%method, %url, error = %e, "api request failed");
            ApiError::Network(e)
        })?;
        Self::check_status(resp).await
    }

    async fn check_status(resp: Response) -> Result<Response, ApiError> {
        match resp.status() {
            StatusCode::UNAUTHORIZED => {
                let body = resp.text().await.unwrap_or_default();
                let message = error::message_from_body(&body);
                tracing::warn!(status = 401, message = ?message, "api request unauthorized");
                Err(ApiError::Unauthorized { message })
            }
            s if s.is_client_error() || s.is_server_error() => {
                let status = s.as_u16();
                let body = resp.text().await.unwrap_or_default();
                let message = error::message_from_body(&body)
                    .unwrap_or_else(|| format!("Request failed with status code {status}"));
                tracing::warn!(status, %message, "api error response");
                Err(ApiError::Api { status, message })
            }
            _ => Ok(resp),
        }
    }

    // ── CRUD ────────────────────────────────────────────────────────────

    /// Records that cannot be decoded are skipped so one bad row does not
    /// empty the whole collection.
    pub async fn list<T: Resource>(&self) -> Result<Vec<T>, ApiError> {
        let url = self.url(&[T::KIND.path()])?;
        let resp = self.send(Method::GET, url, None).await?;
        let rows: Vec<Value> = resp.json().await?;
        let total = rows.len();
        let records: Vec<T> = rows
            .into_iter()
            .filter_map(|row| match serde_json::from_value(row) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(kind = T::KIND.path(), error = %e, "skipping malformed record");
                    None
                }
            })
            .collect();
        if records.len() < total {
            tracing::warn!(
                kind = T::KIND.path(),
                skipped = total - records.len(),
                total,
                "collection loaded with skipped records"
            );
        }
        Ok(records)
    }

    pub async fn get_by_id<T: Resource>(&self, id: &str) -> Result<T, ApiError> {
        let url = self.url(&[T::KIND.path(), id])?;
        let resp = self.send(Method::GET, url, None).await?;
        Ok(resp.json().await?)
    }

    pub async fn create<T: Resource>(&self, payload: &Value) -> Result<T, ApiError> {
        let url = self.url(&[T::KIND.path()])?;
        let resp = self.send(Method::POST, url, Some(payload)).await?;
        Ok(resp.json().await?)
    }

    /// `payload` may carry any subset of the entity's writable fields.
    pub async fn update<T: Resource>(&self, id: &str, payload: &Value) -> Result<T, ApiError> {
        let url = self.url(&[T::KIND.path(), id])?;
        let resp = self.send(Method::PUT, url, Some(payload)).await?;
        Ok(resp.json().await?)
    }

    pub async fn delete(&self, kind: EntityKind, id: &str) -> Result<(), ApiError> {
        let url = self.url(&[kind.path(), id])?;
        self.send(Method::DELETE, url, None).await?;
        Ok(())
    }
}
