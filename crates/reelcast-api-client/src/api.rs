//! Ingestion service endpoints.
//!
//! Transport failures are mapped onto the [`UploadError`] taxonomy here so the
//! orchestrator only ever sees typed errors.

use crate::authorization::index_authorizations;
use crate::ApiClient;
use anyhow::Result;
use reelcast_core::models::{
    CompletedPart, CreateSessionRequest, FinalizeUploadRequest, PartAuthorization,
    PartAuthorizationRequest, PartAuthorizationResponse, UploadSession, VideoSummary,
};
use reelcast_core::UploadError;
use validator::Validate;

pub const CREATE_SESSION_PATH: &str = "/video";
pub const PART_URLS_PATH: &str = "/get-upload-part-urls";
pub const FINALIZE_PATH: &str = "/complete-multipart-upload";
pub const VIDEOS_PATH: &str = "/videos";

impl ApiClient {
    /// Create an upload session; the service also creates the transcoding job.
    pub async fn create_upload_session(
        &self,
        request: &CreateSessionRequest,
    ) -> Result<UploadSession, UploadError> {
        request.validate()?;

        let session: UploadSession = self
            .post_json(CREATE_SESSION_PATH, request)
            .await
            .map_err(|e| UploadError::Session(format!("{:#}", e)))?;

        tracing::info!(
            job_id = %session.job_id,
            storage_key = %session.storage_key,
            "Upload session created"
        );
        Ok(session)
    }

    /// Request one pre-signed target per part number in a single call.
    ///
    /// The result is ordered by part number and contains exactly one entry for
    /// every requested part; anything else is an [`UploadError::Authorization`].
    pub async fn get_part_authorizations(
        &self,
        session: &UploadSession,
        part_numbers: &[u32],
    ) -> Result<Vec<PartAuthorization>, UploadError> {
        let body = PartAuthorizationRequest {
            storage_key: &session.storage_key,
            session_id: &session.session_id,
            job_id: &session.job_id,
            part_numbers,
        };

        let response: PartAuthorizationResponse = self
            .post_json(PART_URLS_PATH, &body)
            .await
            .map_err(|e| UploadError::Authorization(format!("{:#}", e)))?;

        let indexed = index_authorizations(part_numbers, response.authorizations)?;
        Ok(indexed.into_values().collect())
    }

    /// Complete the multi-part upload with parts sorted ascending.
    pub async fn finalize_upload(
        &self,
        session: &UploadSession,
        parts: &[CompletedPart],
    ) -> Result<(), UploadError> {
        let body = FinalizeUploadRequest {
            storage_key: &session.storage_key,
            session_id: &session.session_id,
            parts,
            job_id: &session.job_id,
        };

        self.post_json_no_content(FINALIZE_PATH, &body)
            .await
            .map_err(|e| UploadError::Finalize(format!("{:#}", e)))?;

        tracing::info!(
            job_id = %session.job_id,
            part_count = parts.len(),
            "Multi-part upload finalized"
        );
        Ok(())
    }

    /// List uploaded videos.
    pub async fn list_videos(&self) -> Result<Vec<VideoSummary>> {
        self.get(VIDEOS_PATH).await
    }
}
