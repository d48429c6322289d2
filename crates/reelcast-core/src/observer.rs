use crate::models::UploadSession;

/// Notified as soon as the ingestion service has created a session, before
/// any part is authorized, so no early pipeline events are missed.
///
/// The hook cannot fail: an observer problem must never affect the upload.
pub trait JobObserver: Send + Sync {
    fn session_created(&self, session: &UploadSession);
}
