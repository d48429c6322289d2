//! HTTP client for the Reelcast ingestion service.
//!
//! Provides a minimal client with optional API-key auth, generic GET/POST
//! helpers, the ingestion endpoints (session, part authorization, finalize,
//! video list), the pre-signed part uploader, and the [`UploadOrchestrator`]
//! that drives one multi-part upload end to end.

pub mod api;
pub mod authorization;
pub mod orchestrator;
pub mod retry;
pub mod source;
pub mod uploader;

use anyhow::{Context, Result};
use reelcast_core::ClientConfig;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Authentication strategy for the ingestion service.
#[derive(Clone, Debug)]
pub enum Auth {
    /// No credentials (the public ingestion endpoints)
    None,
    /// `X-API-Key: {key}`
    XApiKey(String),
}

/// HTTP client for the ingestion service.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    auth: Auth,
}

impl ApiClient {
    pub fn new(base_url: String, auth: Auth, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let auth = match &config.api_key {
            Some(key) => Auth::XApiKey(key.clone()),
            None => Auth::None,
        };
        Self::new(
            config.api_url.clone(),
            auth,
            Duration::from_secs(config.http_timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn apply_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth {
            Auth::None => request,
            Auth::XApiKey(key) => request.header("X-API-Key", key.as_str()),
        }
    }

    /// Turn a non-success response into an error carrying the body text.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(anyhow::anyhow!(
            "API request failed with status {}: {}",
            status,
            error_text
        ))
    }

    /// GET request. Deserializes JSON response.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.build_url(path);
        let request = self.apply_auth(self.client.get(&url));

        let response = request.send().await.context("Failed to send request")?;
        let response = Self::ensure_success(response).await?;

        response
            .json()
            .await
            .context("Failed to parse response as JSON")
    }

    /// POST JSON body and deserialize response.
    pub async fn post_json<T: DeserializeOwned, B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = self.build_url(path);
        let request = self.apply_auth(self.client.post(&url).json(body));

        let response = request.send().await.context("Failed to send request")?;
        let response = Self::ensure_success(response).await?;

        response
            .json()
            .await
            .context("Failed to parse response as JSON")
    }

    /// POST JSON body, ignoring the response body. Returns Ok(()) on success.
    pub async fn post_json_no_content<B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<()> {
        let url = self.build_url(path);
        let request = self.apply_auth(self.client.post(&url).json(body));

        let response = request.send().await.context("Failed to send request")?;
        Self::ensure_success(response).await?;

        Ok(())
    }
}

// Re-export the upload surface for convenience.
pub use orchestrator::{
    IngestionApi, MediaFile, PartTransport, UploadOptions, UploadOrchestrator, UploadRequest,
};
pub use retry::RetryPolicy;
pub use source::{FileSource, MemorySource, PartSource};
pub use uploader::PartUploader;
