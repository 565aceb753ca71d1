//! Story generation endpoints.

use std::convert::Infallible;

use axum::body::Body;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing::post};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tellatale_story::domain::request::GenerationRequest;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for both generation endpoints.
#[derive(Debug, Deserialize)]
pub struct TaleRequest {
    /// The parent's story topic.
    #[serde(default)]
    pub prompt_text: Option<String>,
}

/// Response body for POST /generate_tale.
#[derive(Debug, Serialize)]
pub struct TaleResponse {
    /// The generated story.
    pub story: String,
}

/// Rejects unreadable bodies and blank topics with the fixed validation
/// message, before any backend work.
fn validate(
    state: &AppState,
    payload: Result<Json<TaleRequest>, JsonRejection>,
) -> Result<GenerationRequest, ApiError> {
    let validation_error = || ApiError::Validation(state.generator.messages().validation.clone());

    let Json(body) = payload.map_err(|rejection| {
        warn!(%rejection, "unreadable story request body");
        validation_error()
    })?;

    GenerationRequest::new(body.prompt_text.as_deref()).map_err(|_| validation_error())
}

/// POST /generate_tale
#[instrument(skip_all, fields(correlation_id = %Uuid::new_v4()))]
async fn generate_tale(
    State(state): State<AppState>,
    payload: Result<Json<TaleRequest>, JsonRejection>,
) -> Result<Json<TaleResponse>, ApiError> {
    let request = validate(&state, payload)?;
    info!(topic_len = request.topic().len(), "generating tale");

    let prompt = state.composer.compose(&request);
    let story = ApiError::story_or_error(state.generator.generate(&prompt).await)?;

    Ok(Json(TaleResponse { story }))
}

/// POST /generate_tale/stream
#[instrument(skip_all, fields(correlation_id = %Uuid::new_v4()))]
async fn generate_tale_stream(
    State(state): State<AppState>,
    payload: Result<Json<TaleRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let request = validate(&state, payload)?;
    if !state.generator.is_configured() {
        warn!("no backend credential configured, refusing stream");
        return Err(ApiError::MissingCredential(
            state.generator.messages().missing_credential.clone(),
        ));
    }
    info!(topic_len = request.topic().len(), "streaming tale");

    let prompt = state.composer.compose(&request);
    let fragments = state
        .generator
        .generate_stream(&prompt)
        .map(Ok::<_, Infallible>);

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
            (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
        ],
        Body::from_stream(fragments),
    )
        .into_response())
}

/// Returns the router for the story endpoints.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/generate_tale", post(generate_tale))
        .route("/generate_tale/stream", post(generate_tale_stream))
}
