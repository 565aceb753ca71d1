//! Generation backend abstraction.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::credential::ApiKey;
use crate::error::BackendError;
use crate::params::GenerationParams;
use crate::safety::SafetySetting;

/// One outbound generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendRequest {
    /// Model identifier, as listed by the backend or configured.
    pub model: String,
    /// The full composed prompt.
    pub prompt: String,
    /// Sampling parameters.
    pub params: GenerationParams,
    /// Safety thresholds.
    pub safety: Vec<SafetySetting>,
}

/// What the backend produced: text, or a content-policy refusal.
///
/// Used both for a complete buffered response and for each streamed chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendReply {
    /// Generated text. May be empty for streamed chunks that carry no text.
    Text(String),
    /// The prompt or response was blocked by content filtering.
    Blocked {
        /// Backend-supplied reason, for logs.
        reason: String,
    },
}

/// Chunks of a streaming backend call, in arrival order.
pub type ReplyStream = Pin<Box<dyn Stream<Item = Result<BackendReply, BackendError>> + Send>>;

/// An external text-generation service.
#[async_trait]
pub trait StoryBackend: Send + Sync {
    /// Lists identifiers of models that can serve generation requests.
    async fn list_models(&self, api_key: &ApiKey) -> Result<Vec<String>, BackendError>;

    /// Runs one generation call to completion.
    async fn generate(
        &self,
        api_key: &ApiKey,
        request: &BackendRequest,
    ) -> Result<BackendReply, BackendError>;

    /// Opens a streaming generation call.
    async fn generate_stream(
        &self,
        api_key: &ApiKey,
        request: &BackendRequest,
    ) -> Result<ReplyStream, BackendError>;
}
