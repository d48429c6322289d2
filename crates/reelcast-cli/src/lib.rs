use reelcast_events::SessionState;

/// Truncate a string to max_len characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Turns successive session snapshots into the lines not printed yet.
#[derive(Debug, Default)]
pub struct SessionPrinter {
    job_id: Option<String>,
    status: Option<String>,
    printed: usize,
}

impl SessionPrinter {
    pub fn render(&mut self, snapshot: &SessionState) -> Vec<String> {
        if snapshot.job_id != self.job_id {
            *self = Self {
                job_id: snapshot.job_id.clone(),
                ..Self::default()
            };
        }

        let mut lines = Vec::new();
        if snapshot.status != self.status {
            if let Some(status) = &snapshot.status {
                lines.push(format!("[status] {}", status));
            }
            self.status = snapshot.status.clone();
        }
        for message in snapshot.messages.iter().skip(self.printed) {
            lines.push(format!("[log] {}", message));
        }
        self.printed = snapshot.messages.len();
        lines
    }
}

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}
