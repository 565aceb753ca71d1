//! JSON shapes of the Generative Language REST API.

use serde::{Deserialize, Serialize};
use tellatale_core::backend::{BackendReply, BackendRequest};
use tellatale_core::error::BackendError;

/// Finish reasons that mean the candidate was withheld by content filtering.
const BLOCKING_FINISH_REASONS: [&str; 4] = ["SAFETY", "PROHIBITED_CONTENT", "BLOCKLIST", "SPII"];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
    safety_settings: Vec<SafetySettingBody>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [TextPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
}

#[derive(Debug, Serialize)]
struct SafetySettingBody {
    category: &'static str,
    threshold: &'static str,
}

impl<'a> From<&'a BackendRequest> for GenerateContentRequest<'a> {
    fn from(request: &'a BackendRequest) -> Self {
        Self {
            contents: [Content {
                role: "user",
                parts: [TextPart {
                    text: &request.prompt,
                }],
            }],
            generation_config: GenerationConfig {
                temperature: request.params.temperature,
                top_p: request.params.top_p,
                top_k: request.params.top_k,
                max_output_tokens: request.params.max_output_tokens,
            },
            safety_settings: request
                .safety
                .iter()
                .map(|s| SafetySettingBody {
                    category: s.category.as_str(),
                    threshold: s.threshold.as_str(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: u16,
    #[serde(default)]
    message: String,
}

/// Whether a response is a whole reply or one streamed chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Delivery {
    Buffered,
    Streamed,
}

impl GenerateContentResponse {
    /// Interprets the response. Streamed chunks without candidates are
    /// empty text; a buffered response without candidates is an error.
    pub(crate) fn into_reply(self, delivery: Delivery) -> Result<BackendReply, BackendError> {
        if let Some(error) = self.error {
            return Err(BackendError::Status {
                status: error.code,
                body: error.message,
            });
        }
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Ok(BackendReply::Blocked { reason });
        }

        let Some(candidate) = self.candidates.into_iter().next() else {
            return match delivery {
                Delivery::Buffered => Err(BackendError::EmptyResponse),
                Delivery::Streamed => Ok(BackendReply::Text(String::new())),
            };
        };

        let text: String = candidate
            .content
            .map(|c| c.parts)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|p| p.text)
            .collect();

        match candidate.finish_reason {
            Some(reason)
                if text.is_empty() && BLOCKING_FINISH_REASONS.contains(&reason.as_str()) =>
            {
                Ok(BackendReply::Blocked { reason })
            }
            _ => Ok(BackendReply::Text(text)),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListModelsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelInfo {
    name: String,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

impl ListModelsResponse {
    /// Names of models that support `generateContent`, in listing order.
    pub(crate) fn generative_models(self) -> Vec<String> {
        self.models
            .into_iter()
            .filter(|m| {
                m.supported_generation_methods
                    .iter()
                    .any(|method| method == "generateContent")
            })
            .map(|m| m.name)
            .collect()
    }
}
