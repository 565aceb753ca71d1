//! Prompt composition.
//!
//! The instruction block is fixed per output language. The topic is appended
//! after a separator so the model can tell guidelines from request.

use tellatale_core::language::Language;

use crate::domain::request::GenerationRequest;

const SEPARATOR: &str = "\n\n---\n\n";

/// Builds the full text sent to the generation backend.
#[derive(Debug, Clone)]
pub struct PromptComposer {
    instructions: String,
}

impl PromptComposer {
    /// Creates a composer whose output-language directive names `language`.
    #[must_use]
    pub fn new(language: Language) -> Self {
        Self {
            instructions: instructions_for(language),
        }
    }

    /// The fixed instruction block.
    #[must_use]
    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    /// Merges the instruction block with a validated request.
    #[must_use]
    pub fn compose(&self, request: &GenerationRequest) -> String {
        self.compose_topic(request.topic())
    }

    /// Merges the instruction block with a topic the caller has already
    /// checked to be non-empty.
    #[must_use]
    pub fn compose_topic(&self, topic: &str) -> String {
        format!("{}{SEPARATOR}Topic: {topic}", self.instructions)
    }
}

impl Default for PromptComposer {
    fn default() -> Self {
        Self::new(Language::default())
    }
}

fn instructions_for(language: Language) -> String {
    let name = language.prompt_name();
    format!(
        "You are a children's storyteller who writes bedtime stories in the \
         tradition of story therapy.\n\
         \n\
         Audience: children aged 3 to 8, read aloud by a parent at bedtime.\n\
         \n\
         Tone:\n\
         - warm, gentle and calming; nothing frightening, violent or sad without comfort\n\
         - simple sentences and words a small child understands\n\
         - the story winds down towards sleep\n\
         \n\
         Structure:\n\
         - a relatable hero the child can identify with\n\
         - a small challenge that mirrors the topic below\n\
         - the hero finds a kind, brave or clever way through it, with help if needed\n\
         - a reassuring resolution and a quiet, positive closing image\n\
         - about 400 to 700 words\n\
         \n\
         Write the story in {name}.\n\
         Return only the story text: no title, no notes, no commentary."
    )
}
