//! Uniform JSON client for the registry backend.
//!
//! Every screen talks to the API through [`ResourceClient`]. The client never
//! retries, caches or rewrites errors: a non-2xx answer becomes
//! [`AppError::Backend`] and is handed back to the caller untouched.

pub mod person;

use std::sync::{Arc, RwLock};

use reqwest::Method;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

use crate::api::models::{ApiResponse, ErrorBody};
use crate::config::Config;
use crate::error::{AppError, AppResult};

pub use person::PersonLookup;

const JSON: &str = "application/json";

/// Bearer token shared between the session store and the client.
#[derive(Clone, Default)]
pub struct TokenSlot(Arc<RwLock<Option<String>>>);

impl std::fmt::Debug for TokenSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = if self.get().is_some() { "set" } else { "empty" };
        f.debug_tuple("TokenSlot").field(&state).finish()
    }
}

impl TokenSlot {
    pub fn set(&self, token: Option<String>) {
        let mut slot = self.0.write().unwrap_or_else(|e| e.into_inner());
        *slot = token;
    }

    pub fn get(&self) -> Option<String> {
        self.0.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[derive(Debug, Clone)]
pub struct ResourceClient {
    http: reqwest::Client,
    base_url: String,
    token: TokenSlot,
}

impl ResourceClient {
    pub fn new(config: &Config) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| AppError::Config(format!("failed to build http client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token: TokenSlot::default(),
        })
    }

    pub fn token_slot(&self) -> TokenSlot {
        self.token.clone()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Sends one request and returns the decoded JSON body.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> AppResult<Value> {
        let url = self.url(path);
        let request_id = Uuid::new_v4();

        let mut builder = self
            .http
            .request(method.clone(), &url)
            .header(CONTENT_TYPE, JSON)
            .header(ACCEPT, JSON)
            .header("X-Request-Id", request_id.to_string());
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(token) = self.token.get() {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        tracing::debug!(%request_id, %method, %url, "sending request");
        let response = builder.send().await.map_err(|e| {
            let err = AppError::from(e);
            tracing::warn!(%request_id, %method, %url, "request failed: {}", err);
            err
        })?;

        let status = response.status();
        let bytes = response.bytes().await?;
        tracing::debug!(%request_id, status = status.as_u16(), "response received");

        if status.is_success() {
            if bytes.is_empty() {
                return Ok(Value::Null);
            }
            return Ok(serde_json::from_slice(&bytes)?);
        }

        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap_or_default();
        let message = body.message.unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });
        tracing::warn!(%request_id, status = status.as_u16(), "backend rejected request: {}", message);

        Err(AppError::Backend {
            status: status.as_u16(),
            message,
            field_errors: body.errors.unwrap_or_default(),
        })
    }

    pub async fn get(&self, path: &str, query: &[(&str, String)]) -> AppResult<Value> {
        self.request(Method::GET, path, query, None).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> AppResult<Value> {
        self.request(Method::POST, path, &[], Some(body)).await
    }

    pub async fn put(&self, path: &str, body: &Value) -> AppResult<Value> {
        self.request(Method::PUT, path, &[], Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> AppResult<Value> {
        self.request(Method::DELETE, path, &[], None).await
    }
}

/// Reads the `{data, message, errors, meta}` envelope out of a response body.
pub fn envelope<T: DeserializeOwned>(body: Value) -> AppResult<ApiResponse<T>> {
    if body.is_null() {
        return Ok(ApiResponse {
            data: None,
            message: None,
            errors: None,
            meta: None,
        });
    }
    Ok(serde_json::from_value(body)?)
}
