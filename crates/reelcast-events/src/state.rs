use serde::Serialize;

use crate::event::NotificationEvent;

/// What the client knows about one job's processing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionState {
    pub job_id: Option<String>,
    /// Latest status; `None` until the first status update
    pub status: Option<String>,
    /// Log lines in broker order
    pub messages: Vec<String>,
}

impl SessionState {
    pub fn for_job(job_id: impl Into<String>) -> Self {
        Self {
            job_id: Some(job_id.into()),
            ..Self::default()
        }
    }

    pub fn apply(&mut self, event: NotificationEvent) {
        match event {
            NotificationEvent::StatusUpdate { status } => self.status = Some(status),
            NotificationEvent::LogMessage { message } => self.messages.push(message),
        }
    }

    /// Whether the job reached `completed` or `failed`.
    pub fn is_finished(&self) -> bool {
        self.status.as_deref().is_some_and(is_terminal_status)
    }
}

/// Terminal pipeline statuses, compared case-insensitively.
pub fn is_terminal_status(status: &str) -> bool {
    status.eq_ignore_ascii_case("completed") || status.eq_ignore_ascii_case("failed")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_overwrites_status_and_appends_logs() {
        let mut state = SessionState::for_job("1");
        state.apply(NotificationEvent::StatusUpdate {
            status: "queued".to_string(),
        });
        state.apply(NotificationEvent::LogMessage {
            message: "a".to_string(),
        });
        state.apply(NotificationEvent::StatusUpdate {
            status: "processing".to_string(),
        });
        state.apply(NotificationEvent::LogMessage {
            message: "b".to_string(),
        });

        assert_eq!(state.status.as_deref(), Some("processing"));
        assert_eq!(state.messages, vec!["a", "b"]);
        assert!(!state.is_finished());
    }

    #[test]
    fn test_terminal_status() {
        assert!(is_terminal_status("Completed"));
        assert!(is_terminal_status("FAILED"));
        assert!(!is_terminal_status("processing"));
    }
}
