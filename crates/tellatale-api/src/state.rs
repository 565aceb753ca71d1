//! Shared application state.

use std::sync::Arc;

use tellatale_story::application::generator::StoryGenerator;
use tellatale_story::domain::prompt::PromptComposer;

/// Application state shared across all request handlers. Read-only after
/// startup.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Runs composed prompts through the backend.
    pub generator: StoryGenerator,
    /// Builds the full prompt from a topic.
    pub composer: Arc<PromptComposer>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(generator: StoryGenerator, composer: PromptComposer) -> Self {
        Self {
            generator,
            composer: Arc::new(composer),
        }
    }
}
