//! Multi-part upload orchestration.
//!
//! One [`UploadOrchestrator`] drives one file through
//! create session -> notify observer -> authorize parts -> concurrent transfer -> finalize.
//! The upload is all-or-nothing: finalize is only called with a completed part
//! set that matches the planned parts exactly.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use reelcast_core::models::{
    CompletedPart, CreateSessionRequest, PartAuthorization, UploadReport, UploadSession,
};
use reelcast_core::{
    infer_content_type, plan_parts, ClientConfig, ErrorMetadata, JobObserver, LogLevel, Part,
    UploadError, UploadPhase, UploadStateMachine, DEFAULT_CHUNK_SIZE,
};
use tokio_util::sync::CancellationToken;
use validator::Validate;

use crate::authorization::index_authorizations;
use crate::retry::RetryPolicy;
use crate::source::{FileSource, PartSource};
use crate::uploader::PartUploader;
use crate::ApiClient;

/// Ingestion service calls made by the orchestrator.
#[async_trait]
pub trait IngestionApi: Send + Sync {
    async fn create_session(
        &self,
        request: &CreateSessionRequest,
    ) -> Result<UploadSession, UploadError>;

    async fn authorize_parts(
        &self,
        session: &UploadSession,
        part_numbers: &[u32],
    ) -> Result<Vec<PartAuthorization>, UploadError>;

    async fn finalize(
        &self,
        session: &UploadSession,
        parts: &[CompletedPart],
    ) -> Result<(), UploadError>;
}

#[async_trait]
impl IngestionApi for ApiClient {
    async fn create_session(
        &self,
        request: &CreateSessionRequest,
    ) -> Result<UploadSession, UploadError> {
        self.create_upload_session(request).await
    }

    async fn authorize_parts(
        &self,
        session: &UploadSession,
        part_numbers: &[u32],
    ) -> Result<Vec<PartAuthorization>, UploadError> {
        self.get_part_authorizations(session, part_numbers).await
    }

    async fn finalize(
        &self,
        session: &UploadSession,
        parts: &[CompletedPart],
    ) -> Result<(), UploadError> {
        self.finalize_upload(session, parts).await
    }
}

/// Transfer of a single part to its authorized target.
#[async_trait]
pub trait PartTransport: Send + Sync {
    async fn upload_part(
        &self,
        authorization: &PartAuthorization,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<CompletedPart, UploadError>;
}

#[async_trait]
impl PartTransport for PartUploader {
    async fn upload_part(
        &self,
        authorization: &PartAuthorization,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<CompletedPart, UploadError> {
        PartUploader::upload_part(self, authorization, bytes, content_type).await
    }
}

/// The file being uploaded.
#[derive(Clone)]
pub struct MediaFile {
    pub file_name: String,
    pub content_type: String,
    pub source: Arc<dyn PartSource>,
}

impl MediaFile {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        source: Arc<dyn PartSource>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            source,
        }
    }

    /// Open a file on disk, inferring its content type from the extension.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, UploadError> {
        let path = path.as_ref();
        let source = FileSource::open(path).await.map_err(|e| {
            UploadError::Validation(format!("Cannot read {}: {}", path.display(), e))
        })?;

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                UploadError::Validation(format!("Invalid file name: {}", path.display()))
            })?
            .to_string();

        Ok(Self::new(file_name, infer_content_type(path), Arc::new(source)))
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }
}

/// What to upload.
#[derive(Clone)]
pub struct UploadRequest {
    pub title: String,
    pub file: Option<MediaFile>,
}

impl UploadRequest {
    pub fn new(title: impl Into<String>, file: MediaFile) -> Self {
        Self {
            title: title.into(),
            file: Some(file),
        }
    }
}

/// Upload tuning.
#[derive(Debug, Clone)]
pub struct UploadOptions {
    pub chunk_size: u64,
    /// Cap on simultaneous part transfers
    pub max_concurrent_parts: usize,
    pub retry: RetryPolicy,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_concurrent_parts: 4,
            retry: RetryPolicy::default(),
        }
    }
}

impl UploadOptions {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            chunk_size: config.chunk_size_bytes,
            max_concurrent_parts: config.max_concurrent_parts,
            retry: RetryPolicy::from_config(config),
        }
    }
}

/// Validated input of one upload.
struct PreparedUpload {
    create: CreateSessionRequest,
    file: MediaFile,
    parts: Vec<Part>,
}

/// Drives exactly one upload; a second `run` fails with `InvalidState`.
pub struct UploadOrchestrator<A, T> {
    api: Arc<A>,
    transport: Arc<T>,
    options: UploadOptions,
    observer: Option<Arc<dyn JobObserver>>,
    state: UploadStateMachine,
    session: Option<UploadSession>,
}

impl<A, T> UploadOrchestrator<A, T>
where
    A: IngestionApi,
    T: PartTransport,
{
    pub fn new(api: Arc<A>, transport: Arc<T>, options: UploadOptions) -> Self {
        Self {
            api,
            transport,
            options,
            observer: None,
            state: UploadStateMachine::new(),
            session: None,
        }
    }

    /// Attach an observer that is told about the job as soon as it exists.
    pub fn with_observer(mut self, observer: Arc<dyn JobObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn phase(&self) -> &UploadPhase {
        self.state.phase()
    }

    /// Session created by this upload, once the service has issued one.
    pub fn session(&self) -> Option<&UploadSession> {
        self.session.as_ref()
    }

    /// Run the upload to completion, failure, or cancellation.
    ///
    /// Cancelling `cancel` drops every in-flight transfer and never finalizes.
    pub async fn run(
        &mut self,
        request: UploadRequest,
        cancel: CancellationToken,
    ) -> Result<UploadReport, UploadError> {
        if self.state.phase() != &UploadPhase::Idle {
            return Err(UploadError::InvalidState {
                from: self.state.phase().to_string(),
                to: UploadPhase::SessionCreated.to_string(),
            });
        }

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(UploadError::Cancelled),
            result = self.execute(request) => result,
        };

        if let Err(err) = &outcome {
            self.state.fail(err.to_string());
            let job_id = self.session.as_ref().map(|s| s.job_id.as_str());
            let session_id = self.session.as_ref().map(|s| s.session_id.as_str());
            match err.log_level() {
                LogLevel::Debug => {
                    tracing::debug!(?job_id, error = %err, "Upload rejected")
                }
                LogLevel::Warn => {
                    tracing::warn!(?job_id, ?session_id, error = %err, "Upload stopped")
                }
                LogLevel::Error => tracing::error!(
                    ?job_id,
                    ?session_id,
                    error_code = err.error_code(),
                    recoverable = err.is_recoverable(),
                    error = %err,
                    "Upload failed"
                ),
            }
        }

        outcome
    }

    async fn execute(&mut self, request: UploadRequest) -> Result<UploadReport, UploadError> {
        let started_at = Utc::now();
        let PreparedUpload { create, file, parts } = self.prepare(request)?;

        let session = self.api.create_session(&create).await?;
        self.state.advance(UploadPhase::SessionCreated)?;
        self.session = Some(session.clone());

        if let Some(observer) = &self.observer {
            observer.session_created(&session);
        }

        let part_numbers: Vec<u32> = parts.iter().map(|p| p.part_number).collect();
        let authorizations = self.api.authorize_parts(&session, &part_numbers).await?;
        let authorizations = index_authorizations(&part_numbers, authorizations)?;
        self.state.advance(UploadPhase::PartsAuthorized)?;

        self.state.advance(UploadPhase::PartsUploading)?;
        tracing::info!(
            job_id = %session.job_id,
            part_count = parts.len(),
            max_concurrent_parts = self.options.max_concurrent_parts,
            "Uploading parts"
        );
        let (completed, bytes_uploaded) =
            self.upload_parts(&parts, authorizations, &file).await?;
        let completed = verify_completed(&part_numbers, completed)?;

        self.state.advance(UploadPhase::Finalizing)?;
        self.api.finalize(&session, &completed).await?;
        self.state.advance(UploadPhase::Completed)?;

        Ok(UploadReport {
            session,
            part_count: parts.len() as u32,
            bytes_uploaded,
            started_at,
            completed_at: Utc::now(),
        })
    }

    /// Input checks that must pass before any network call.
    fn prepare(&self, request: UploadRequest) -> Result<PreparedUpload, UploadError> {
        let title = request.title.trim();
        if title.is_empty() {
            return Err(UploadError::Validation(
                "Title must not be empty".to_string(),
            ));
        }

        let file = request
            .file
            .ok_or_else(|| UploadError::Validation("No file selected".to_string()))?;
        if file.source.is_empty() {
            return Err(UploadError::Validation(format!(
                "{} is empty",
                file.file_name
            )));
        }

        if self.options.max_concurrent_parts == 0 {
            return Err(UploadError::Validation(
                "max_concurrent_parts must be greater than 0".to_string(),
            ));
        }

        let create = CreateSessionRequest {
            title: title.to_string(),
            file_name: file.file_name.clone(),
            content_type: file.content_type.clone(),
        };
        create.validate()?;

        let parts = plan_parts(file.source.len(), self.options.chunk_size)?;

        Ok(PreparedUpload {
            create,
            file,
            parts,
        })
    }

    /// Transfer every part, at most `max_concurrent_parts` at a time.
    ///
    /// The first failed part ends the upload and drops the transfers still in flight.
    /// Returns the completed parts and the number of bytes they carried.
    async fn upload_parts(
        &self,
        parts: &[Part],
        mut authorizations: BTreeMap<u32, PartAuthorization>,
        file: &MediaFile,
    ) -> Result<(Vec<CompletedPart>, u64), UploadError> {
        let mut jobs = Vec::with_capacity(parts.len());
        for part in parts {
            let authorization = authorizations.remove(&part.part_number).ok_or_else(|| {
                UploadError::Authorization(format!(
                    "Missing authorization for part {}",
                    part.part_number
                ))
            })?;
            jobs.push((*part, authorization));
        }

        let transport = self.transport.as_ref();
        let source = file.source.as_ref();
        let content_type = file.content_type.as_str();
        let retry = &self.options.retry;

        let mut transfers = stream::iter(jobs)
            .map(move |(part, authorization)| async move {
                upload_with_retry(transport, source, part, authorization, content_type, retry)
                    .await
                    .map(|completed| (part.len(), completed))
            })
            .buffer_unordered(self.options.max_concurrent_parts);

        let mut completed = Vec::with_capacity(parts.len());
        let mut bytes_uploaded = 0u64;
        while let Some(result) = transfers.next().await {
            let (size, part) = result?;
            bytes_uploaded += size;
            completed.push(part);
            tracing::debug!(
                completed = completed.len(),
                total = parts.len(),
                bytes_uploaded,
                "Upload progress"
            );
        }

        Ok((completed, bytes_uploaded))
    }
}

async fn upload_with_retry<T: PartTransport + ?Sized>(
    transport: &T,
    source: &dyn PartSource,
    part: Part,
    authorization: PartAuthorization,
    content_type: &str,
    retry: &RetryPolicy,
) -> Result<CompletedPart, UploadError> {
    let part_number = part.part_number;
    let bytes = source
        .read_part(&part)
        .await
        .map_err(|e| UploadError::Transfer {
            part_number,
            cause: format!("failed to read part: {}", e),
        })?;

    let mut backoff = retry.backoff();
    loop {
        match transport
            .upload_part(&authorization, bytes.clone(), content_type)
            .await
        {
            Ok(completed) if completed.part_number == part_number => {
                tracing::info!(part_number, size = part.len(), "Part transferred");
                return Ok(completed);
            }
            Ok(completed) => {
                return Err(UploadError::Transfer {
                    part_number,
                    cause: format!("store acknowledged part {}", completed.part_number),
                });
            }
            Err(err) if backoff.attempt() < retry.max_retries => {
                let delay = backoff.next_delay();
                tracing::warn!(
                    part_number,
                    attempt = backoff.attempt(),
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Part transfer failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Sort completed parts ascending and check they match the planned parts exactly.
fn verify_completed(
    planned: &[u32],
    mut completed: Vec<CompletedPart>,
) -> Result<Vec<CompletedPart>, UploadError> {
    completed.sort_by_key(|p| p.part_number);

    let mut expected = planned.to_vec();
    expected.sort_unstable();
    let actual: Vec<u32> = completed.iter().map(|p| p.part_number).collect();

    if actual != expected {
        return Err(UploadError::Finalize(format!(
            "Completed parts {:?} do not match planned parts {:?}",
            actual, expected
        )));
    }

    Ok(completed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn done(part_number: u32) -> CompletedPart {
        CompletedPart {
            part_number,
            integrity_token: format!("etag-{}", part_number),
        }
    }

    #[test]
    fn verify_sorts_ascending() {
        let sorted = verify_completed(&[1, 2, 3], vec![done(3), done(1), done(2)]).unwrap();
        let numbers: Vec<u32> = sorted.iter().map(|p| p.part_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[test]
    fn verify_rejects_subset() {
        assert!(verify_completed(&[1, 2, 3], vec![done(1), done(3)]).is_err());
    }

    #[test]
    fn verify_rejects_duplicates() {
        assert!(verify_completed(&[1, 2], vec![done(1), done(1), done(2)]).is_err());
    }

    #[test]
    fn verify_rejects_superset() {
        assert!(verify_completed(&[1], vec![done(1), done(2)]).is_err());
    }

    #[test]
    fn options_from_config() {
        let config = ClientConfig {
            chunk_size_bytes: 8 * 1024 * 1024,
            max_concurrent_parts: 6,
            ..ClientConfig::default()
        };
        let options = UploadOptions::from_config(&config);
        assert_eq!(options.chunk_size, 8 * 1024 * 1024);
        assert_eq!(options.max_concurrent_parts, 6);
        assert_eq!(options.retry.max_retries, config.part_max_retries);
    }
}
