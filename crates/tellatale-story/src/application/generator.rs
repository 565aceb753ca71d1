//! Story generation against an external backend.
//!
//! Every call moves through the same states: credential check, then either
//! an immediate failure or a single backend call, ending in a story, a
//! safety block or a failure. Nothing is retried. Backend errors are logged
//! here and replaced by fixed messages before they reach the caller.

use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use async_stream::stream;
use futures::{Stream, StreamExt};
use tellatale_core::backend::{BackendReply, BackendRequest, StoryBackend};
use tellatale_core::credential::ApiKey;
use tellatale_core::language::Messages;
use tellatale_core::outcome::{FailureReason, GenerationOutcome};
use tellatale_core::params::GenerationParams;
use tellatale_core::safety::{SafetySetting, default_safety};
use tracing::{Span, debug, info, info_span, instrument, warn};

use crate::application::model_resolution::ModelResolver;

/// Fragments of a streamed story, in arrival order. Finite and not
/// restartable; dropping it stops consumption.
pub type FragmentStream = Pin<Box<dyn Stream<Item = String> + Send>>;

/// Process-wide generation settings, fixed at startup.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Backend credential. `None` makes every call fail fast.
    pub api_key: Option<ApiKey>,
    /// Sampling parameters.
    pub params: GenerationParams,
    /// Safety thresholds.
    pub safety: Vec<SafetySetting>,
    /// Fixed user-facing messages.
    pub messages: Messages,
    /// Whether to consult the backend's model listing before each call.
    pub discover_models: bool,
}

impl GeneratorConfig {
    /// Default parameters, safety table and messages with the given
    /// credential.
    #[must_use]
    pub fn new(api_key: Option<ApiKey>) -> Self {
        Self {
            api_key,
            params: GenerationParams::default(),
            safety: default_safety(),
            messages: Messages::default(),
            discover_models: true,
        }
    }
}

/// Runs composed prompts through a backend.
#[derive(Clone)]
pub struct StoryGenerator {
    config: Arc<GeneratorConfig>,
    backend: Arc<dyn StoryBackend>,
    resolver: Arc<dyn ModelResolver>,
}

impl fmt::Debug for StoryGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoryGenerator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl StoryGenerator {
    /// Creates a generator.
    #[must_use]
    pub fn new(
        config: GeneratorConfig,
        backend: Arc<dyn StoryBackend>,
        resolver: Arc<dyn ModelResolver>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            backend,
            resolver,
        }
    }

    /// Whether a backend credential is configured.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    /// The fixed message table in use.
    #[must_use]
    pub fn messages(&self) -> &Messages {
        &self.config.messages
    }

    /// Generates a complete story.
    #[instrument(skip_all, fields(prompt_len = full_prompt.len()))]
    pub async fn generate(&self, full_prompt: &str) -> GenerationOutcome {
        let messages = &self.config.messages;
        let Some(api_key) = &self.config.api_key else {
            warn!("no backend credential configured, skipping generation");
            return missing_credential(messages);
        };

        let request = prepare(
            &self.config,
            self.backend.as_ref(),
            self.resolver.as_ref(),
            api_key,
            full_prompt,
        )
        .await;
        info!(model = %request.model, "calling generation backend");

        match self.backend.generate(api_key, &request).await {
            Ok(BackendReply::Text(text)) => {
                let story = text.trim();
                if story.is_empty() {
                    warn!("backend returned blank text");
                    unavailable(messages)
                } else {
                    info!(story_len = story.len(), "story generated");
                    GenerationOutcome::Story(story.to_owned())
                }
            }
            Ok(BackendReply::Blocked { reason }) => {
                warn!(%reason, "prompt blocked by content filter");
                GenerationOutcome::SafetyBlocked {
                    message: messages.safety_blocked.clone(),
                }
            }
            Err(err) => {
                warn!(error = %err, "generation backend call failed");
                unavailable(messages)
            }
        }
    }

    /// Generates a story as a sequence of fragments.
    ///
    /// Failures end the sequence with one fixed-message fragment. The
    /// span is opened here, under the caller's current span, and entered
    /// on every poll of the returned stream.
    #[must_use]
    pub fn generate_stream(&self, full_prompt: &str) -> FragmentStream {
        let span = info_span!("generate_stream", prompt_len = full_prompt.len());
        let config = Arc::clone(&self.config);
        let backend = Arc::clone(&self.backend);
        let resolver = Arc::clone(&self.resolver);
        let prompt = full_prompt.to_owned();

        let fragments = stream! {
            let Some(api_key) = config.api_key.clone() else {
                warn!("no backend credential configured, skipping streaming generation");
                yield config.messages.missing_credential.clone();
                return;
            };

            let request = prepare(
                &config,
                backend.as_ref(),
                resolver.as_ref(),
                &api_key,
                &prompt,
            )
            .await;
            info!(model = %request.model, "opening backend stream");

            let mut chunks = match backend.generate_stream(&api_key, &request).await {
                Ok(chunks) => chunks,
                Err(err) => {
                    warn!(error = %err, "failed to open backend stream");
                    yield config.messages.unavailable.clone();
                    return;
                }
            };

            let mut emitted = 0_usize;
            while let Some(chunk) = chunks.next().await {
                match chunk {
                    Ok(BackendReply::Text(text)) => {
                        if !text.is_empty() {
                            emitted += 1;
                            yield text;
                        }
                    }
                    Ok(BackendReply::Blocked { reason }) => {
                        warn!(%reason, fragments = emitted, "stream blocked by content filter");
                        yield config.messages.safety_blocked.clone();
                        return;
                    }
                    Err(err) => {
                        warn!(error = %err, fragments = emitted, "backend stream failed");
                        yield config.messages.unavailable.clone();
                        return;
                    }
                }
            }

            if emitted == 0 {
                warn!("backend stream closed without text");
                yield config.messages.unavailable.clone();
            } else {
                debug!(fragments = emitted, "backend stream closed");
            }
        };

        Box::pin(InSpan {
            inner: Box::pin(fragments),
            span,
        })
    }
}

/// Enters `span` around each poll of `inner`.
struct InSpan {
    inner: FragmentStream,
    span: Span,
}

impl Stream for InSpan {
    type Item = String;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<String>> {
        let this = &mut *self;
        let _entered = this.span.enter();
        this.inner.poll_next_unpin(cx)
    }
}

/// Resolves the model and assembles the outbound request. Never fails: a
/// listing error falls back to the resolver's answer for an empty listing.
async fn prepare(
    config: &GeneratorConfig,
    backend: &dyn StoryBackend,
    resolver: &dyn ModelResolver,
    api_key: &ApiKey,
    prompt: &str,
) -> BackendRequest {
    let model = if config.discover_models {
        match backend.list_models(api_key).await {
            Ok(available) => resolver.resolve(&available),
            Err(err) => {
                warn!(error = %err, "model listing failed, using fallback model");
                resolver.resolve(&[])
            }
        }
    } else {
        resolver.preferred()
    };

    BackendRequest {
        model,
        prompt: prompt.to_owned(),
        params: config.params.clone(),
        safety: config.safety.clone(),
    }
}

fn missing_credential(messages: &Messages) -> GenerationOutcome {
    GenerationOutcome::Failed {
        reason: FailureReason::MissingCredential,
        message: messages.missing_credential.clone(),
    }
}

fn unavailable(messages: &Messages) -> GenerationOutcome {
    GenerationOutcome::Failed {
        reason: FailureReason::Backend,
        message: messages.unavailable.clone(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use futures::StreamExt;
    use tellatale_core::language::{Language, Messages};
    use tellatale_core::outcome::{FailureReason, GenerationOutcome};
    use tellatale_test_support::{FailingBackend, Script, ScriptedBackend, test_api_key};

    use super::{GeneratorConfig, StoryGenerator};
    use crate::application::model_resolution::FallbackModelResolver;

    fn resolver() -> Arc<FallbackModelResolver> {
        Arc::new(FallbackModelResolver::new("gemini-1.5-flash", "gemini-pro"))
    }

    fn configured() -> GeneratorConfig {
        GeneratorConfig::new(Some(test_api_key()))
    }

    fn generator_with(config: GeneratorConfig, backend: Arc<ScriptedBackend>) -> StoryGenerator {
        StoryGenerator::new(config, backend, resolver())
    }

    fn text(s: &str) -> Script {
        Script::Text(s.to_owned())
    }

    #[tokio::test]
    async fn test_generate_returns_trimmed_story() {
        // Arrange
        let backend = Arc::new(ScriptedBackend::replying("\n  Once upon a time...  \n"));
        let generator = generator_with(configured(), Arc::clone(&backend));

        // Act
        let outcome = generator.generate("prompt").await;

        // Assert
        assert_eq!(outcome, GenerationOutcome::Story("Once upon a time...".into()));
        assert_eq!(backend.invocation_count(), 1);
        assert_eq!(backend.requests()[0].prompt, "prompt");
    }

    #[tokio::test]
    async fn test_generate_without_credential_never_calls_backend() {
        // Arrange
        let backend = Arc::new(ScriptedBackend::replying("unused"));
        let generator = generator_with(GeneratorConfig::new(None), Arc::clone(&backend));

        // Act
        let outcome = generator.generate("prompt").await;

        // Assert
        assert_eq!(
            outcome,
            GenerationOutcome::Failed {
                reason: FailureReason::MissingCredential,
                message: Messages::default().missing_credential,
            }
        );
        assert_eq!(backend.invocation_count(), 0);
        assert_eq!(backend.list_calls(), 0);
    }

    #[tokio::test]
    async fn test_generate_maps_safety_block_to_distinct_message() {
        // Arrange
        let backend = Arc::new(ScriptedBackend::with_reply(Script::Blocked("SAFETY".into())));
        let generator = generator_with(configured(), backend);
        let messages = Messages::default();

        // Act
        let outcome = generator.generate("prompt").await;

        // Assert
        assert_eq!(
            outcome,
            GenerationOutcome::SafetyBlocked {
                message: messages.safety_blocked.clone(),
            }
        );
        assert_ne!(outcome.error_message(), Some(messages.unavailable.as_str()));
    }

    #[tokio::test]
    async fn test_generate_hides_raw_backend_error() {
        // Arrange
        let backend = Arc::new(ScriptedBackend::with_reply(Script::Fail(
            "socket hang up at 10.0.0.7".into(),
        )));
        let generator = generator_with(configured(), backend);

        // Act
        let outcome = generator.generate("prompt").await;

        // Assert
        let message = outcome.error_message().unwrap();
        assert_eq!(message, Messages::default().unavailable);
        assert!(!message.contains("socket hang up"));
    }

    #[tokio::test]
    async fn test_generate_treats_blank_text_as_failure() {
        let backend = Arc::new(ScriptedBackend::replying("   "));
        let generator = generator_with(configured(), backend);

        let outcome = generator.generate("prompt").await;

        assert!(matches!(
            outcome,
            GenerationOutcome::Failed {
                reason: FailureReason::Backend,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_generate_uses_configured_message_table() {
        let backend = Arc::new(ScriptedBackend::with_reply(Script::Fail("boom".into())));
        let mut config = configured();
        config.messages = Language::English.messages();
        let generator = generator_with(config, backend);

        let outcome = generator.generate("prompt").await;

        assert_eq!(
            outcome.error_message(),
            Some(Language::English.messages().unavailable.as_str())
        );
    }

    #[tokio::test]
    async fn test_generate_with_failing_backend_degrades_to_generic_failure() {
        // Arrange
        let backend = Arc::new(FailingBackend::default());
        let generator = StoryGenerator::new(configured(), backend.clone(), resolver());

        // Act
        let outcome = generator.generate("prompt").await;

        // Assert: listing failed, then the generation call failed.
        assert_eq!(backend.invocation_count(), 2);
        assert_eq!(
            outcome.error_message(),
            Some(Messages::default().unavailable.as_str())
        );
    }

    #[tokio::test]
    async fn test_generate_prefers_listed_preferred_model() {
        let backend = Arc::new(
            ScriptedBackend::replying("story")
                .with_models(&["models/gemini-1.0-pro", "models/gemini-1.5-flash"]),
        );
        let generator = generator_with(configured(), Arc::clone(&backend));

        generator.generate("prompt").await;

        assert_eq!(backend.requests()[0].model, "models/gemini-1.5-flash");
    }

    #[tokio::test]
    async fn test_generate_falls_back_to_default_model_when_listing_fails() {
        let backend = Arc::new(ScriptedBackend::replying("story").with_failing_listing());
        let generator = generator_with(configured(), Arc::clone(&backend));

        let outcome = generator.generate("prompt").await;

        assert!(outcome.is_success());
        assert_eq!(backend.requests()[0].model, "gemini-pro");
    }

    #[tokio::test]
    async fn test_generate_skips_listing_when_discovery_disabled() {
        let backend = Arc::new(ScriptedBackend::replying("story").with_models(&["models/other"]));
        let mut config = configured();
        config.discover_models = false;
        let generator = generator_with(config, Arc::clone(&backend));

        generator.generate("prompt").await;

        assert_eq!(backend.list_calls(), 0);
        assert_eq!(backend.requests()[0].model, "gemini-1.5-flash");
    }

    #[tokio::test]
    async fn test_generate_sends_configured_params_and_safety() {
        let backend = Arc::new(ScriptedBackend::replying("story"));
        let config = configured();
        let generator = generator_with(config.clone(), Arc::clone(&backend));

        generator.generate("prompt").await;

        let request = &backend.requests()[0];
        assert_eq!(request.params, config.params);
        assert_eq!(request.safety, config.safety);
    }

    #[tokio::test]
    async fn test_stream_yields_fragments_in_order() {
        // Arrange
        let backend = Arc::new(ScriptedBackend::streaming(vec![
            text("Egyszer "),
            text("volt, "),
            text("hol nem volt."),
        ]));
        let generator = generator_with(configured(), backend);

        // Act
        let fragments: Vec<String> = generator.generate_stream("prompt").collect().await;

        // Assert
        assert_eq!(fragments, vec!["Egyszer ", "volt, ", "hol nem volt."]);
        assert_eq!(fragments.concat(), "Egyszer volt, hol nem volt.");
    }

    #[tokio::test]
    async fn test_stream_skips_empty_chunks() {
        let backend = Arc::new(ScriptedBackend::streaming(vec![
            text("Egyszer "),
            text(""),
            text("volt."),
        ]));
        let generator = generator_with(configured(), backend);

        let fragments: Vec<String> = generator.generate_stream("prompt").collect().await;

        assert_eq!(fragments, vec!["Egyszer ", "volt."]);
    }

    #[tokio::test]
    async fn test_stream_without_credential_yields_single_message() {
        // Arrange
        let backend = Arc::new(ScriptedBackend::streaming(vec![text("unused")]));
        let generator = generator_with(GeneratorConfig::new(None), Arc::clone(&backend));

        // Act
        let fragments: Vec<String> = generator.generate_stream("prompt").collect().await;

        // Assert
        assert_eq!(fragments, vec![Messages::default().missing_credential]);
        assert_eq!(backend.invocation_count(), 0);
    }

    #[tokio::test]
    async fn test_stream_error_after_first_fragment_ends_with_one_error_fragment() {
        // Arrange
        let backend = Arc::new(ScriptedBackend::streaming(vec![
            text("Egyszer "),
            Script::Fail("connection reset".into()),
            text("never seen"),
        ]));
        let generator = generator_with(configured(), backend);

        // Act
        let fragments: Vec<String> = generator.generate_stream("prompt").collect().await;

        // Assert
        assert_eq!(
            fragments,
            vec!["Egyszer ".to_owned(), Messages::default().unavailable]
        );
    }

    #[tokio::test]
    async fn test_stream_open_failure_yields_generic_message() {
        let backend =
            Arc::new(ScriptedBackend::streaming(vec![text("unused")]).with_failing_stream_open());
        let generator = generator_with(configured(), backend);

        let fragments: Vec<String> = generator.generate_stream("prompt").collect().await;

        assert_eq!(fragments, vec![Messages::default().unavailable]);
    }

    #[tokio::test]
    async fn test_stream_safety_block_ends_with_safety_message() {
        let backend = Arc::new(ScriptedBackend::streaming(vec![
            text("Egyszer "),
            Script::Blocked("SAFETY".into()),
            text("never seen"),
        ]));
        let generator = generator_with(configured(), backend);

        let fragments: Vec<String> = generator.generate_stream("prompt").collect().await;

        assert_eq!(
            fragments,
            vec!["Egyszer ".to_owned(), Messages::default().safety_blocked]
        );
    }

    #[tokio::test]
    async fn test_stream_with_no_text_reports_unavailable() {
        let backend = Arc::new(ScriptedBackend::streaming(vec![text(""), text("")]));
        let generator = generator_with(configured(), backend);

        let fragments: Vec<String> = generator.generate_stream("prompt").collect().await;

        assert_eq!(fragments, vec![Messages::default().unavailable]);
    }

    #[tokio::test]
    async fn test_stream_is_lazy_until_polled() {
        let backend = Arc::new(ScriptedBackend::streaming(vec![text("a")]));
        let generator = generator_with(configured(), Arc::clone(&backend));

        let mut fragments = generator.generate_stream("prompt");
        assert_eq!(backend.invocation_count(), 0);

        assert_eq!(fragments.next().await.as_deref(), Some("a"));
        assert_eq!(backend.invocation_count(), 1);
        assert_eq!(fragments.next().await, None);
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_stream_failure_is_logged_under_callers_span() {
        // Arrange
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        let _default = tracing::subscriber::set_default(subscriber);

        let backend = Arc::new(ScriptedBackend::streaming(vec![
            text("Egyszer "),
            Script::Fail("connection reset".into()),
        ]));
        let generator = generator_with(configured(), backend);
        let fragments = {
            let _handler = tracing::info_span!("handler", correlation_id = "req-42").entered();
            generator.generate_stream("prompt")
        };

        // Act
        let collected: Vec<String> = fragments.collect().await;

        // Assert
        assert_eq!(collected.len(), 2);
        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        let line = output
            .lines()
            .find(|line| line.contains("backend stream failed"))
            .unwrap();
        assert!(line.contains("req-42"), "log line: {line}");
        assert!(line.contains("generate_stream"), "log line: {line}");
    }
}
