//! Output language and its fixed user-facing messages.

use std::str::FromStr;

use thiserror::Error;

/// The language stories are written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    /// Hungarian.
    #[default]
    Hungarian,
    /// English.
    English,
}

impl Language {
    /// Language name as it appears in the prompt's output directive.
    #[must_use]
    pub fn prompt_name(self) -> &'static str {
        match self {
            Self::Hungarian => "Hungarian",
            Self::English => "English",
        }
    }

    /// The fixed message table for this language.
    #[must_use]
    pub fn messages(self) -> Messages {
        match self {
            Self::Hungarian => Messages {
                validation: "Kérjük, adjon meg egy mesepromptot.".to_owned(),
                missing_credential:
                    "A mesegenerátor nincs beállítva: hiányzik az API kulcs.".to_owned(),
                safety_blocked: "A kérést a tartalomszűrő letiltotta. \
                                 Kérjük, fogalmazza meg másképp a mese témáját."
                    .to_owned(),
                unavailable: "A mese létrehozása jelenleg nem elérhető. \
                              Kérjük, próbálja újra később."
                    .to_owned(),
            },
            Self::English => Messages {
                validation: "Please provide a prompt for your story.".to_owned(),
                missing_credential: "The story generator is not configured: \
                                     the API key is missing."
                    .to_owned(),
                safety_blocked: "The request was blocked by the content filter. \
                                 Please rephrase the story topic."
                    .to_owned(),
                unavailable: "Story generation is currently unavailable. \
                              Please try again later."
                    .to_owned(),
            },
        }
    }
}

/// Returned when a language code is not supported.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unsupported story language: {0}")]
pub struct UnsupportedLanguage(pub String);

impl FromStr for Language {
    type Err = UnsupportedLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hu" | "hungarian" => Ok(Self::Hungarian),
            "en" | "english" => Ok(Self::English),
            _ => Err(UnsupportedLanguage(s.to_owned())),
        }
    }
}

/// Fixed, localized messages returned in place of raw errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Messages {
    /// Topic missing or blank.
    pub validation: String,
    /// No backend credential configured.
    pub missing_credential: String,
    /// Backend refused the prompt on content-policy grounds.
    pub safety_blocked: String,
    /// Any other backend failure.
    pub unavailable: String,
}

impl Default for Messages {
    fn default() -> Self {
        Language::default().messages()
    }
}
