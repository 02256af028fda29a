//! HTTP adapter for the trace API.
//!
//! Every request writes its outcome into the shared store; the controller
//! only ever reads the store back.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use resource_state::{ErrorInfo, ResourcePath};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::config::Config;
use crate::selector::{authenticated_user_path, lock_store, trace_path, SharedStore};
use crate::traits::BaseTraceApi;
use crate::types::TracePatch;

/// Error type for trace API requests
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<ApiError> for ErrorInfo {
    fn from(error: ApiError) -> Self {
        let info = ErrorInfo::new(error.to_string());
        match error {
            ApiError::Status { status, .. } => info.with_status(status),
            _ => info,
        }
    }
}

#[derive(Clone)]
pub struct HttpTraceApi {
    client: reqwest::Client,
    api_base: String,
    auth_token: Option<String>,
    store: SharedStore,
}

impl HttpTraceApi {
    pub fn new(api_base: impl Into<String>, store: SharedStore) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            auth_token: None,
            store,
        }
    }

    pub fn from_config(config: &Config, store: SharedStore) -> Self {
        let api = Self::new(config.api_url.clone(), store);
        match &config.api_token {
            Some(token) => api.with_token(token.clone()),
            None => api,
        }
    }

    /// Send a bearer token with every request
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Populate the session user's envelope.
    pub async fn fetch_authenticated_user(&self) {
        let url = format!("{}/user", self.api_base);
        self.fetch_into(&authenticated_user_path(), &url).await;
    }

    async fn fetch_into(&self, path: &ResourcePath, url: &str) {
        lock_store(&self.store).begin(path);

        let result = self.send(self.request(Method::GET, url)).await;
        let result = match result {
            Ok(response) => response.json::<Value>().await.map_err(ApiError::from),
            Err(e) => Err(e),
        };

        let mut store = lock_store(&self.store);
        match result {
            Ok(data) => store.resolve(path, data),
            Err(e) => {
                debug!(path = %path, error = %e, "fetch failed");
                store.reject(path, &ErrorInfo::from(e));
            }
        }
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let request = self.client.request(method, url);
        match &self.auth_token {
            Some(token) => request.header("Authorization", format!("Bearer {}", token)),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Status {
            status: status.as_u16(),
            message: error_message(&body)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string()),
        })
    }

    fn trace_url(&self, id: &str) -> String {
        format!("{}/traces/{}", self.api_base, id)
    }
}

#[async_trait]
impl BaseTraceApi for HttpTraceApi {
    async fn fetch_trace(&self, id: &str) {
        self.fetch_into(&trace_path(id), &self.trace_url(id)).await;
    }

    async fn update_trace(&self, id: &str, patch: TracePatch) -> Result<(), ErrorInfo> {
        let request = self.request(Method::PATCH, &self.trace_url(id)).json(&patch);
        self.send(request).await?;

        lock_store(&self.store).update_data(&trace_path(id), |data| apply_patch(data, &patch));
        Ok(())
    }

    async fn delete_trace(&self, id: &str) -> Result<(), ErrorInfo> {
        self.send(self.request(Method::DELETE, &self.trace_url(id)))
            .await?;

        lock_store(&self.store).remove(&trace_path(id));
        Ok(())
    }
}

/// Write patched fields into the stored feature's properties.
pub fn apply_patch(data: &mut Value, patch: &TracePatch) {
    let feature = if data.get("results").is_some_and(Value::is_object) {
        &mut data["results"]
    } else {
        data
    };
    let Some(properties) = feature
        .get_mut("properties")
        .and_then(Value::as_object_mut)
    else {
        return;
    };
    if let Some(description) = &patch.description {
        properties.insert("description".into(), Value::String(description.clone()));
    }
}

/// `message` or `error` from a JSON error body.
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .or_else(|| value.get("error"))
        .and_then(Value::as_str)
        .map(str::to_string)
}
