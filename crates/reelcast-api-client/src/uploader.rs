//! Transfer of one part to its pre-signed target.

use std::time::Duration;

use anyhow::{Context, Result};
use bytes::Bytes;
use reelcast_core::models::{CompletedPart, PartAuthorization};
use reelcast_core::UploadError;
use reqwest::header::{CONTENT_TYPE, ETAG};
use reqwest::Client;

/// PUTs part bytes to pre-signed URLs. Carries no service credentials: the
/// URL itself authorizes the request.
#[derive(Clone, Debug)]
pub struct PartUploader {
    client: Client,
}

impl PartUploader {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Upload exactly `bytes` and return the store's entity tag.
    pub async fn upload_part(
        &self,
        authorization: &PartAuthorization,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<CompletedPart, UploadError> {
        let part_number = authorization.part_number;
        let transfer_error = |cause: String| UploadError::Transfer { part_number, cause };

        let size = bytes.len();
        let response = self
            .client
            .put(&authorization.target_url)
            .header(CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| transfer_error(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(transfer_error(format!(
                "store responded with status {}: {}",
                status, error_text
            )));
        }

        let integrity_token = response
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .ok_or_else(|| transfer_error("response carried no ETag header".to_string()))?;

        tracing::debug!(part_number, size, "Part uploaded");

        Ok(CompletedPart {
            part_number,
            integrity_token,
        })
    }
}
