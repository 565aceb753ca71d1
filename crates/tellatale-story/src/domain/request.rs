//! Validated story request.

use thiserror::Error;

/// The topic was missing or blank.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("story topic must not be empty")]
pub struct ValidationError;

/// A story request whose topic is known to be non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    topic: String,
}

impl GenerationRequest {
    /// Validates a caller-supplied topic.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the topic is absent or whitespace-only.
    pub fn new(topic: Option<&str>) -> Result<Self, ValidationError> {
        let topic = topic.map(str::trim).unwrap_or_default();
        if topic.is_empty() {
            return Err(ValidationError);
        }
        Ok(Self {
            topic: topic.to_owned(),
        })
    }

    /// The trimmed topic.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }
}
