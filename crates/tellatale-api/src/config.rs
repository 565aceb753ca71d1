//! Startup configuration read from the environment.

use std::fmt::Display;
use std::str::FromStr;

use tellatale_core::credential::ApiKey;
use tellatale_core::language::Language;
use tellatale_core::params::GenerationParams;
use tellatale_core::safety::{HarmThreshold, default_safety, uniform_safety};
use tellatale_gemini::{DEFAULT_BASE_URL, GeminiSettings};
use tellatale_story::application::generator::GeneratorConfig;

use crate::error::AppError;

/// Model requested when none is configured.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Everything the server reads once at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Output language for prompts and messages.
    pub language: Language,
    /// Model tried first.
    pub preferred_model: String,
    /// Model used when the listing offers nothing.
    pub default_model: String,
    /// Gemini connection settings.
    pub gemini: GeminiSettings,
    /// Generator settings, credential included.
    pub generator: GeneratorConfig,
    /// OTLP collector endpoint. Traces are only exported when set.
    pub otlp_endpoint: Option<String>,
}

impl ServerConfig {
    /// Reads configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, which returns a variable's
    /// value if set.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is set to an invalid value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let language: Language = parse_or(&lookup, "STORY_LANGUAGE", Language::default())?;

        let defaults = GenerationParams::default();
        let params = GenerationParams {
            temperature: parse_or(&lookup, "STORY_TEMPERATURE", defaults.temperature)?,
            top_p: parse_or(&lookup, "STORY_TOP_P", defaults.top_p)?,
            top_k: parse_or(&lookup, "STORY_TOP_K", defaults.top_k)?,
            max_output_tokens: parse_or(
                &lookup,
                "STORY_MAX_OUTPUT_TOKENS",
                defaults.max_output_tokens,
            )?,
        };

        let safety = match parse::<HarmThreshold>(&lookup, "STORY_SAFETY_THRESHOLD")? {
            Some(threshold) => uniform_safety(threshold),
            None => default_safety(),
        };

        let generator = GeneratorConfig {
            api_key: lookup("GEMINI_API_KEY").and_then(ApiKey::new),
            params,
            safety,
            messages: language.messages(),
            discover_models: parse_flag(&lookup, "GEMINI_DISCOVER_MODELS", true)?,
        };

        Ok(Self {
            host: non_empty(&lookup, "HOST").unwrap_or_else(|| "0.0.0.0".to_owned()),
            port: parse_or(&lookup, "PORT", 5000)?,
            language,
            preferred_model: non_empty(&lookup, "GEMINI_MODEL")
                .unwrap_or_else(|| DEFAULT_MODEL.to_owned()),
            default_model: non_empty(&lookup, "GEMINI_DEFAULT_MODEL")
                .unwrap_or_else(|| DEFAULT_MODEL.to_owned()),
            gemini: GeminiSettings {
                base_url: non_empty(&lookup, "GEMINI_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned()),
            },
            generator,
            otlp_endpoint: non_empty(&lookup, "OTEL_EXPORTER_OTLP_ENDPOINT"),
        })
    }
}

fn non_empty(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key)
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>, AppError>
where
    T: FromStr,
    T::Err: Display,
{
    non_empty(lookup, key)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|e| AppError::Config(format!("{key} is invalid: {e}")))
        })
        .transpose()
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: Display,
{
    Ok(parse(lookup, key)?.unwrap_or(default))
}

fn parse_flag(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: bool,
) -> Result<bool, AppError> {
    match non_empty(lookup, key).map(|v| v.to_ascii_lowercase()).as_deref() {
        None => Ok(default),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(other) => Err(AppError::Config(format!(
            "{key} must be a boolean, got {other:?}"
        ))),
    }
}
