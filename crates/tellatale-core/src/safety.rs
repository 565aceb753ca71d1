//! Content-safety thresholds.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// A content category the backend can filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HarmCategory {
    /// Harassment.
    Harassment,
    /// Hate speech.
    HateSpeech,
    /// Sexually explicit content.
    SexuallyExplicit,
    /// Dangerous content.
    DangerousContent,
}

impl HarmCategory {
    /// Every category, in the order they are sent to the backend.
    pub const ALL: [Self; 4] = [
        Self::Harassment,
        Self::HateSpeech,
        Self::SexuallyExplicit,
        Self::DangerousContent,
    ];

    /// Wire name understood by the backend.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Harassment => "HARM_CATEGORY_HARASSMENT",
            Self::HateSpeech => "HARM_CATEGORY_HATE_SPEECH",
            Self::SexuallyExplicit => "HARM_CATEGORY_SEXUALLY_EXPLICIT",
            Self::DangerousContent => "HARM_CATEGORY_DANGEROUS_CONTENT",
        }
    }
}

impl fmt::Display for HarmCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Minimum probability at which content in a category is blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HarmThreshold {
    /// Never block.
    BlockNone,
    /// Block only high-probability content.
    BlockOnlyHigh,
    /// Block medium- and high-probability content.
    BlockMediumAndAbove,
    /// Block low-, medium- and high-probability content.
    BlockLowAndAbove,
}

impl HarmThreshold {
    /// Wire name understood by the backend.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BlockNone => "BLOCK_NONE",
            Self::BlockOnlyHigh => "BLOCK_ONLY_HIGH",
            Self::BlockMediumAndAbove => "BLOCK_MEDIUM_AND_ABOVE",
            Self::BlockLowAndAbove => "BLOCK_LOW_AND_ABOVE",
        }
    }
}

impl fmt::Display for HarmThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a threshold name is not recognised.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown safety threshold: {0}")]
pub struct UnknownThreshold(pub String);

impl FromStr for HarmThreshold {
    type Err = UnknownThreshold;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BLOCK_NONE" => Ok(Self::BlockNone),
            "BLOCK_ONLY_HIGH" => Ok(Self::BlockOnlyHigh),
            "BLOCK_MEDIUM_AND_ABOVE" => Ok(Self::BlockMediumAndAbove),
            "BLOCK_LOW_AND_ABOVE" => Ok(Self::BlockLowAndAbove),
            _ => Err(UnknownThreshold(s.to_owned())),
        }
    }
}

/// One row of the safety table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SafetySetting {
    /// Category being filtered.
    pub category: HarmCategory,
    /// Blocking threshold for the category.
    pub threshold: HarmThreshold,
}

/// Builds a table applying the same threshold to every category.
#[must_use]
pub fn uniform_safety(threshold: HarmThreshold) -> Vec<SafetySetting> {
    HarmCategory::ALL
        .into_iter()
        .map(|category| SafetySetting {
            category,
            threshold,
        })
        .collect()
}

/// The table used when nothing is configured.
#[must_use]
pub fn default_safety() -> Vec<SafetySetting> {
    uniform_safety(HarmThreshold::BlockMediumAndAbove)
}
