//! Upload attempt lifecycle.
//!
//! `Idle -> SessionCreated -> PartsAuthorized -> PartsUploading -> Finalizing -> Completed`,
//! with every non-terminal phase able to move to `Failed`. Phases are never re-entered.

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::error::UploadError;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UploadPhase {
    #[default]
    Idle,
    SessionCreated,
    PartsAuthorized,
    PartsUploading,
    Finalizing,
    Completed,
    Failed(String),
}

impl Display for UploadPhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            UploadPhase::Idle => write!(f, "idle"),
            UploadPhase::SessionCreated => write!(f, "session_created"),
            UploadPhase::PartsAuthorized => write!(f, "parts_authorized"),
            UploadPhase::PartsUploading => write!(f, "parts_uploading"),
            UploadPhase::Finalizing => write!(f, "finalizing"),
            UploadPhase::Completed => write!(f, "completed"),
            UploadPhase::Failed(_) => write!(f, "failed"),
        }
    }
}

impl UploadPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadPhase::Completed | UploadPhase::Failed(_))
    }

    fn next(&self) -> Option<UploadPhase> {
        match self {
            UploadPhase::Idle => Some(UploadPhase::SessionCreated),
            UploadPhase::SessionCreated => Some(UploadPhase::PartsAuthorized),
            UploadPhase::PartsAuthorized => Some(UploadPhase::PartsUploading),
            UploadPhase::PartsUploading => Some(UploadPhase::Finalizing),
            UploadPhase::Finalizing => Some(UploadPhase::Completed),
            UploadPhase::Completed | UploadPhase::Failed(_) => None,
        }
    }

    pub fn can_transition_to(&self, target: &UploadPhase) -> bool {
        match target {
            UploadPhase::Failed(_) => !self.is_terminal(),
            _ => self.next().as_ref() == Some(target),
        }
    }
}

/// Tracks the phase of exactly one upload attempt.
#[derive(Debug, Default)]
pub struct UploadStateMachine {
    phase: UploadPhase,
}

impl UploadStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &UploadPhase {
        &self.phase
    }

    pub fn advance(&mut self, target: UploadPhase) -> Result<(), UploadError> {
        if !self.phase.can_transition_to(&target) {
            return Err(UploadError::InvalidState {
                from: self.phase.to_string(),
                to: target.to_string(),
            });
        }
        tracing::debug!(from = %self.phase, to = %target, "Upload phase changed");
        self.phase = target;
        Ok(())
    }

    /// Move to `Failed`. A terminal phase is left untouched.
    pub fn fail(&mut self, reason: impl Into<String>) {
        if !self.phase.is_terminal() {
            self.phase = UploadPhase::Failed(reason.into());
        }
    }
}
