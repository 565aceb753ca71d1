//! Test backends: fake `StoryBackend` implementations for tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use futures::stream;
use tellatale_core::backend::{BackendReply, BackendRequest, ReplyStream, StoryBackend};
use tellatale_core::credential::ApiKey;
use tellatale_core::error::BackendError;

/// One scripted backend response or streamed chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Script {
    /// Reply with text.
    Text(String),
    /// Reply with a content-policy block.
    Blocked(String),
    /// Fail with a transport error carrying this detail.
    Fail(String),
}

impl Script {
    fn play(&self) -> Result<BackendReply, BackendError> {
        match self {
            Self::Text(text) => Ok(BackendReply::Text(text.clone())),
            Self::Blocked(reason) => Ok(BackendReply::Blocked {
                reason: reason.clone(),
            }),
            Self::Fail(detail) => Err(BackendError::Transport(detail.clone())),
        }
    }
}

/// A backend that plays back a fixed script and records every request it
/// receives.
///
/// Buffered calls return `reply`; streaming calls yield `chunks` in order.
/// A `Script::Fail` inside `chunks` is yielded as an error and the stream
/// keeps going, so tests can check that the consumer stops on its own.
#[derive(Debug)]
pub struct ScriptedBackend {
    models: Option<Vec<String>>,
    reply: Script,
    chunks: Vec<Script>,
    fail_stream_open: bool,
    requests: Mutex<Vec<BackendRequest>>,
    list_calls: AtomicUsize,
}

impl ScriptedBackend {
    /// A backend whose buffered call returns `text`.
    #[must_use]
    pub fn replying(text: impl Into<String>) -> Self {
        Self::with_reply(Script::Text(text.into()))
    }

    /// A backend whose buffered call plays `reply`.
    #[must_use]
    pub fn with_reply(reply: Script) -> Self {
        Self {
            models: Some(Vec::new()),
            reply,
            chunks: Vec::new(),
            fail_stream_open: false,
            requests: Mutex::new(Vec::new()),
            list_calls: AtomicUsize::new(0),
        }
    }

    /// A backend whose streaming call yields `chunks` in order.
    #[must_use]
    pub fn streaming(chunks: Vec<Script>) -> Self {
        Self {
            chunks,
            ..Self::with_reply(Script::Fail("no buffered reply scripted".into()))
        }
    }

    /// Sets the model listing returned by `list_models`.
    #[must_use]
    pub fn with_models(mut self, models: &[&str]) -> Self {
        self.models = Some(models.iter().map(|m| (*m).to_owned()).collect());
        self
    }

    /// Makes `list_models` fail.
    #[must_use]
    pub fn with_failing_listing(mut self) -> Self {
        self.models = None;
        self
    }

    /// Makes opening a stream fail before any chunk is produced.
    #[must_use]
    pub fn with_failing_stream_open(mut self) -> Self {
        self.fail_stream_open = true;
        self
    }

    /// Returns a snapshot of all generation requests received, buffered and
    /// streaming alike.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn requests(&self) -> Vec<BackendRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of generation calls received.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn invocation_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Number of `list_models` calls received.
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    fn record(&self, request: &BackendRequest) {
        self.requests.lock().unwrap().push(request.clone());
    }
}

#[async_trait]
impl StoryBackend for ScriptedBackend {
    async fn list_models(&self, _api_key: &ApiKey) -> Result<Vec<String>, BackendError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.models
            .clone()
            .ok_or_else(|| BackendError::Transport("model listing unavailable".into()))
    }

    async fn generate(
        &self,
        _api_key: &ApiKey,
        request: &BackendRequest,
    ) -> Result<BackendReply, BackendError> {
        self.record(request);
        self.reply.play()
    }

    async fn generate_stream(
        &self,
        _api_key: &ApiKey,
        request: &BackendRequest,
    ) -> Result<ReplyStream, BackendError> {
        self.record(request);
        if self.fail_stream_open {
            return Err(BackendError::Status {
                status: 503,
                body: "service unavailable".into(),
            });
        }
        let items: Vec<_> = self.chunks.iter().map(Script::play).collect();
        Ok(Box::pin(stream::iter(items)))
    }
}

/// A backend that fails every call with a transport error. Useful for
/// testing error-handling paths.
#[derive(Debug, Default)]
pub struct FailingBackend {
    calls: AtomicUsize,
}

impl FailingBackend {
    /// Number of calls received, listing included.
    pub fn invocation_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn fail(&self) -> BackendError {
        self.calls.fetch_add(1, Ordering::SeqCst);
        BackendError::Transport("connection refused".into())
    }
}

#[async_trait]
impl StoryBackend for FailingBackend {
    async fn list_models(&self, _api_key: &ApiKey) -> Result<Vec<String>, BackendError> {
        Err(self.fail())
    }

    async fn generate(
        &self,
        _api_key: &ApiKey,
        _request: &BackendRequest,
    ) -> Result<BackendReply, BackendError> {
        Err(self.fail())
    }

    async fn generate_stream(
        &self,
        _api_key: &ApiKey,
        _request: &BackendRequest,
    ) -> Result<ReplyStream, BackendError> {
        Err(self.fail())
    }
}
