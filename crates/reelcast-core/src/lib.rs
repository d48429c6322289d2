//! Reelcast Core Library
//!
//! Domain models, chunk planning, the upload lifecycle, error types and client
//! configuration shared by the API client, the event subscriber and the CLI.

pub mod backoff;
pub mod chunk;
pub mod config;
pub mod content_type;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod observer;

// Re-export commonly used types
pub use backoff::Backoff;
pub use chunk::{plan_parts, Part, DEFAULT_CHUNK_SIZE, MAX_PART_COUNT, MIN_PART_SIZE};
pub use config::{chunk_size_from_mb, ClientConfig};
pub use content_type::infer_content_type;
pub use error::{ErrorMetadata, LogLevel, UploadError};
pub use lifecycle::{UploadPhase, UploadStateMachine};
pub use observer::JobObserver;
