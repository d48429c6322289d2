//! Error types module
//!
//! All failures of an upload attempt are unified under [`UploadError`]. Each
//! variant describes itself through [`ErrorMetadata`] so callers can decide how
//! to log and present it without matching on every variant.
//!
//! Decode failures on the notification channel are not represented here: the
//! event subscriber discards malformed payloads and never surfaces them.

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like a cancelled upload
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata describing how an error should be reported to the user.
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "TRANSFER_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether restarting the whole upload may succeed
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the user
    fn suggested_action(&self) -> Option<&'static str>;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Session creation failed: {0}")]
    Session(String),

    #[error("Authorization error: {0}")]
    Authorization(String),

    #[error("Transfer of part {part_number} failed: {cause}")]
    Transfer { part_number: u32, cause: String },

    #[error("Finalize error: {0}")]
    Finalize(String),

    #[error("Upload cancelled")]
    Cancelled,

    #[error("Invalid upload state transition: {from} -> {to}")]
    InvalidState { from: String, to: String },
}

impl From<validator::ValidationErrors> for UploadError {
    fn from(err: validator::ValidationErrors) -> Self {
        UploadError::Validation(err.to_string())
    }
}

/// Static metadata for each variant: (error_code, recoverable, suggested_action, log_level).
fn upload_error_static_metadata(
    err: &UploadError,
) -> (&'static str, bool, Option<&'static str>, LogLevel) {
    match err {
        UploadError::Validation(_) => (
            "VALIDATION_ERROR",
            false,
            Some("Check the file and title and try again"),
            LogLevel::Debug,
        ),
        UploadError::Session(_) => (
            "SESSION_ERROR",
            true,
            Some("Check that the ingestion service is reachable and retry"),
            LogLevel::Error,
        ),
        UploadError::Authorization(_) => (
            "AUTHORIZATION_ERROR",
            true,
            Some("Restart the upload to request fresh part URLs"),
            LogLevel::Error,
        ),
        UploadError::Transfer { .. } => (
            "TRANSFER_ERROR",
            true,
            Some("Restart the upload; parts are not resumable"),
            LogLevel::Error,
        ),
        UploadError::Finalize(_) => (
            "FINALIZE_ERROR",
            true,
            Some("Restart the entire upload"),
            LogLevel::Error,
        ),
        UploadError::Cancelled => ("CANCELLED", true, None, LogLevel::Warn),
        UploadError::InvalidState { .. } => (
            "INVALID_STATE",
            false,
            Some("Create a new orchestrator for each upload"),
            LogLevel::Error,
        ),
    }
}

impl UploadError {
    /// Part number of a failed transfer, if this is a transfer error.
    pub fn part_number(&self) -> Option<u32> {
        match self {
            UploadError::Transfer { part_number, .. } => Some(*part_number),
            _ => None,
        }
    }
}

impl ErrorMetadata for UploadError {
    fn error_code(&self) -> &'static str {
        upload_error_static_metadata(self).0
    }

    fn is_recoverable(&self) -> bool {
        upload_error_static_metadata(self).1
    }

    fn suggested_action(&self) -> Option<&'static str> {
        upload_error_static_metadata(self).2
    }

    fn log_level(&self) -> LogLevel {
        upload_error_static_metadata(self).3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_metadata_validation() {
        let err = UploadError::Validation("title must not be empty".to_string());
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        assert!(!err.is_recoverable());
        assert_eq!(err.log_level(), LogLevel::Debug);
        assert_eq!(err.part_number(), None);
    }

    #[test]
    fn test_error_metadata_transfer() {
        let err = UploadError::Transfer {
            part_number: 3,
            cause: "HTTP 500".to_string(),
        };
        assert_eq!(err.error_code(), "TRANSFER_ERROR");
        assert!(err.is_recoverable());
        assert_eq!(err.part_number(), Some(3));
        assert_eq!(err.to_string(), "Transfer of part 3 failed: HTTP 500");
        assert_eq!(err.log_level(), LogLevel::Error);
    }

    #[test]
    fn test_error_metadata_cancelled() {
        let err = UploadError::Cancelled;
        assert_eq!(err.error_code(), "CANCELLED");
        assert_eq!(err.suggested_action(), None);
        assert_eq!(err.log_level(), LogLevel::Warn);
    }

    #[test]
    fn test_validation_errors_convert() {
        let mut errors = validator::ValidationErrors::new();
        errors.add("title", validator::ValidationError::new("length"));
        let err = UploadError::from(errors);
        assert!(matches!(err, UploadError::Validation(_)));
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }
}
