/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    Config(String),
}

/// What the caller should offer the user after a [`GenerationError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Send the user back through login.
    Relogin,
    /// Prompt a credit purchase or plan upgrade.
    PurchaseCredits,
    /// A generic failure; the user may simply try again.
    Retry,
    /// Nothing to offer (the user abandoned the generation).
    None,
}

/// Caller-facing failure of a single generation.
///
/// Every failure inside the submit-and-poll client resolves to exactly one
/// of these variants before it reaches the caller.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenerationError {
    /// No session at submission time, or the backend refused the credential.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The backend rejected the request or returned no job handle.
    #[error("Submission failed: {0}")]
    Submission(String),

    /// The caller's credits are exhausted.
    #[error("Insufficient credits: {0}")]
    InsufficientResource(String),

    /// The backend reported the job as `failed`.
    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    /// The attempt budget ran out before a terminal status was seen.
    #[error("Generation timed out after {attempts} status checks")]
    Timeout { attempts: u32 },

    /// The caller cancelled the poll loop.
    #[error("Generation cancelled")]
    Cancelled,
}

impl GenerationError {
    /// Recovery hint for presenting this error to a user.
    pub fn recovery_action(&self) -> RecoveryAction {
        match self {
            Self::Authentication(_) => RecoveryAction::Relogin,
            Self::InsufficientResource(_) => RecoveryAction::PurchaseCredits,
            Self::Submission(_) | Self::GenerationFailed(_) | Self::Timeout { .. } => {
                RecoveryAction::Retry
            }
            Self::Cancelled => RecoveryAction::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovery_actions_follow_error_kind() {
        assert_eq!(
            GenerationError::Authentication("expired".into()).recovery_action(),
            RecoveryAction::Relogin
        );
        assert_eq!(
            GenerationError::InsufficientResource("0 left".into()).recovery_action(),
            RecoveryAction::PurchaseCredits
        );
        assert_eq!(
            GenerationError::Timeout { attempts: 60 }.recovery_action(),
            RecoveryAction::Retry
        );
        assert_eq!(GenerationError::Cancelled.recovery_action(), RecoveryAction::None);
    }

    #[test]
    fn timeout_display_includes_attempts() {
        let err = GenerationError::Timeout { attempts: 60 };
        assert_eq!(err.to_string(), "Generation timed out after 60 status checks");
    }
}
