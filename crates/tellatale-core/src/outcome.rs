//! Terminal result of a buffered generation call.

/// Why a generation call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// No backend credential was configured; the backend was never called.
    MissingCredential,
    /// The backend call failed or returned an unusable response.
    Backend,
}

/// Outcome of one generation request. Exactly one of story or message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// The generated story, trimmed.
    Story(String),
    /// The backend declined the prompt on content-policy grounds.
    SafetyBlocked {
        /// Fixed user-facing message.
        message: String,
    },
    /// Any other failure.
    Failed {
        /// Failure category.
        reason: FailureReason,
        /// Fixed user-facing message.
        message: String,
    },
}

impl GenerationOutcome {
    /// Returns `true` for a generated story.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Story(_))
    }

    /// The user-facing error message, if this is a failure.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Story(_) => None,
            Self::SafetyBlocked { message } | Self::Failed { message, .. } => Some(message),
        }
    }
}
