//! REST client for the Generative Language API.

use async_stream::stream;
use async_trait::async_trait;
use futures::StreamExt;
use tellatale_core::backend::{BackendReply, BackendRequest, ReplyStream, StoryBackend};
use tellatale_core::credential::ApiKey;
use tellatale_core::error::BackendError;
use tracing::{debug, instrument};

use crate::sse::SseDecoder;
use crate::wire::{Delivery, GenerateContentRequest, GenerateContentResponse, ListModelsResponse};

/// Public endpoint of the Generative Language API.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

const API_VERSION: &str = "v1beta";
const API_KEY_HEADER: &str = "x-goog-api-key";
const MODEL_PREFIX: &str = "models/";

/// Connection settings for `GeminiClient`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeminiSettings {
    /// Scheme and host, without the API version path.
    pub base_url: String,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
        }
    }
}

/// Gemini backend over HTTPS.
///
/// The credential is supplied per call; the client itself holds none.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
}

impl GeminiClient {
    /// Creates a client. No request timeout is set: streamed stories can take
    /// a while and deadlines belong to the serving layer.
    #[must_use]
    pub fn new(settings: GeminiSettings) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: settings.base_url.trim_end_matches('/').to_owned(),
        }
    }

    fn models_url(&self) -> String {
        format!("{}/{API_VERSION}/models", self.base_url)
    }

    fn method_url(&self, model: &str, method: &str) -> String {
        let model = model.strip_prefix(MODEL_PREFIX).unwrap_or(model);
        format!("{}/{API_VERSION}/models/{model}:{method}", self.base_url)
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        api_key: &ApiKey,
    ) -> Result<reqwest::Response, BackendError> {
        let response = request
            .header(API_KEY_HEADER, api_key.expose())
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

fn parse_chunk(data: &str) -> Result<BackendReply, BackendError> {
    serde_json::from_str::<GenerateContentResponse>(data)
        .map_err(|e| BackendError::MalformedResponse(e.to_string()))?
        .into_reply(Delivery::Streamed)
}

#[async_trait]
impl StoryBackend for GeminiClient {
    #[instrument(skip_all)]
    async fn list_models(&self, api_key: &ApiKey) -> Result<Vec<String>, BackendError> {
        let request = self
            .http
            .get(self.models_url())
            .query(&[("pageSize", "1000")]);
        let listing: ListModelsResponse = self
            .send(request, api_key)
            .await?
            .json()
            .await
            .map_err(|e| BackendError::MalformedResponse(e.to_string()))?;

        let models = listing.generative_models();
        debug!(count = models.len(), "listed generative models");
        Ok(models)
    }

    #[instrument(skip_all, fields(model = %request.model))]
    async fn generate(
        &self,
        api_key: &ApiKey,
        request: &BackendRequest,
    ) -> Result<BackendReply, BackendError> {
        let http_request = self
            .http
            .post(self.method_url(&request.model, "generateContent"))
            .json(&GenerateContentRequest::from(request));
        let response: GenerateContentResponse = self
            .send(http_request, api_key)
            .await?
            .json()
            .await
            .map_err(|e| BackendError::MalformedResponse(e.to_string()))?;

        response.into_reply(Delivery::Buffered)
    }

    #[instrument(skip_all, fields(model = %request.model))]
    async fn generate_stream(
        &self,
        api_key: &ApiKey,
        request: &BackendRequest,
    ) -> Result<ReplyStream, BackendError> {
        let http_request = self
            .http
            .post(self.method_url(&request.model, "streamGenerateContent"))
            .query(&[("alt", "sse")])
            .json(&GenerateContentRequest::from(request));
        let response = self.send(http_request, api_key).await?;
        let mut bytes = Box::pin(response.bytes_stream());

        Ok(Box::pin(stream! {
            let mut decoder = SseDecoder::default();
            while let Some(chunk) = bytes.next().await {
                match chunk {
                    Ok(chunk) => {
                        for event in decoder.push(&chunk) {
                            yield parse_chunk(&event);
                        }
                    }
                    Err(e) => {
                        yield Err(BackendError::Transport(e.to_string()));
                        return;
                    }
                }
            }
            if let Some(event) = decoder.finish() {
                yield parse_chunk(&event);
            }
        }))
    }
}
