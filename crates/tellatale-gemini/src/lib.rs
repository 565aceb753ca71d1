//! Gemini Generative Language API backend.
//!
//! Implements `StoryBackend` over the public REST API: model listing,
//! `generateContent`, and `streamGenerateContent` delivered as server-sent
//! events.

pub mod client;
pub mod sse;
mod wire;

pub use client::{DEFAULT_BASE_URL, GeminiClient, GeminiSettings};
