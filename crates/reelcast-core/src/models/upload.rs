use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::string_or_number;

/// Request to open a multi-part upload session for one file
#[derive(Debug, Clone, Serialize, Validate)]
pub struct CreateSessionRequest {
    /// Title shown in the video list
    #[validate(length(
        min = 1,
        max = 255,
        message = "Title must be between 1 and 255 characters"
    ))]
    pub title: String,
    /// Original filename
    #[serde(rename = "fileName")]
    #[validate(length(
        min = 1,
        max = 255,
        message = "Filename must be between 1 and 255 characters"
    ))]
    pub file_name: String,
    /// Content type (MIME type) of the whole file
    #[validate(length(
        min = 1,
        max = 255,
        message = "Content type must be between 1 and 255 characters"
    ))]
    pub content_type: String,
}

/// Identifiers of one server-tracked upload, immutable for its lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadSession {
    /// Multi-part upload id issued by the object store
    #[serde(rename = "UploadId")]
    pub session_id: String,
    /// Object key the file is assembled under
    #[serde(rename = "Key")]
    pub storage_key: String,
    /// Transcoding job created for this upload
    #[serde(rename = "video_id", with = "string_or_number")]
    pub job_id: String,
    #[serde(rename = "Bucket", default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
}

/// Batched request for one pre-signed target per part
#[derive(Debug, Clone, Serialize)]
pub struct PartAuthorizationRequest<'a> {
    #[serde(rename = "Key")]
    pub storage_key: &'a str,
    #[serde(rename = "UploadId")]
    pub session_id: &'a str,
    #[serde(rename = "videoId")]
    pub job_id: &'a str,
    #[serde(rename = "PartNumbers")]
    pub part_numbers: &'a [u32],
}

#[derive(Debug, Clone, Deserialize)]
pub struct PartAuthorizationResponse {
    #[serde(rename = "signedUrls")]
    pub authorizations: Vec<PartAuthorization>,
}

/// One-time destination for exactly one part's bytes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartAuthorization {
    #[serde(rename = "PartNumber")]
    pub part_number: u32,
    #[serde(rename = "signedUrl")]
    pub target_url: String,
}

/// Proof that one part reached the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedPart {
    #[serde(rename = "PartNumber")]
    pub part_number: u32,
    /// Entity tag returned by the store for this part
    #[serde(rename = "ETag")]
    pub integrity_token: String,
}

/// Request to assemble the uploaded parts into the final object
#[derive(Debug, Clone, Serialize)]
pub struct FinalizeUploadRequest<'a> {
    #[serde(rename = "Key")]
    pub storage_key: &'a str,
    #[serde(rename = "UploadId")]
    pub session_id: &'a str,
    /// Completed parts, ascending by part number
    #[serde(rename = "Parts")]
    pub parts: &'a [CompletedPart],
    #[serde(rename = "videoId")]
    pub job_id: &'a str,
}

/// Outcome of a successful upload
#[derive(Debug, Clone, Serialize)]
pub struct UploadReport {
    pub session: UploadSession,
    pub part_count: u32,
    pub bytes_uploaded: u64,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}
