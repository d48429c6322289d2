//! Job notification payloads.

use serde::{Deserialize, Serialize};

/// Topic carrying the notifications of one transcoding job.
pub fn topic_for(job_id: &str) -> String {
    format!("logs:{}", job_id)
}

/// A notification published by the transcoding pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum NotificationEvent {
    StatusUpdate { status: String },
    LogMessage { message: String },
}

/// Result of decoding one raw payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    Event(NotificationEvent),
    /// Unparseable, unknown type, or empty field; carries the reason
    Malformed(String),
}

pub fn decode_event(payload: &str) -> Decoded {
    let event = match serde_json::from_str::<NotificationEvent>(payload) {
        Ok(event) => event,
        Err(e) => return Decoded::Malformed(e.to_string()),
    };

    match &event {
        NotificationEvent::StatusUpdate { status } if status.is_empty() => {
            Decoded::Malformed("empty status".to_string())
        }
        NotificationEvent::LogMessage { message } if message.is_empty() => {
            Decoded::Malformed("empty message".to_string())
        }
        _ => Decoded::Event(event),
    }
}
