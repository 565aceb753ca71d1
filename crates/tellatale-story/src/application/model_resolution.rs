//! Model selection policy.

/// Picks the model identifier for a generation call from the backend's
/// current listing. Implementations must always return an identifier.
pub trait ModelResolver: Send + Sync {
    /// The identifier to use when the listing is skipped.
    fn preferred(&self) -> String;

    /// Chooses a model. `available` may be empty.
    fn resolve(&self, available: &[String]) -> String;
}

const MODEL_PREFIX: &str = "models/";

/// Preferred identifier if listed, else the first listed model, else a
/// fixed default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackModelResolver {
    preferred: String,
    default: String,
}

impl FallbackModelResolver {
    /// Creates a resolver. Identifiers may be given with or without the
    /// `models/` prefix.
    #[must_use]
    pub fn new(preferred: impl Into<String>, default: impl Into<String>) -> Self {
        Self {
            preferred: preferred.into(),
            default: default.into(),
        }
    }
}

fn bare(name: &str) -> &str {
    name.strip_prefix(MODEL_PREFIX).unwrap_or(name)
}

impl ModelResolver for FallbackModelResolver {
    fn preferred(&self) -> String {
        self.preferred.clone()
    }

    fn resolve(&self, available: &[String]) -> String {
        let wanted = bare(&self.preferred);
        if let Some(found) = available.iter().find(|m| bare(m) == wanted) {
            return found.clone();
        }
        available
            .first()
            .cloned()
            .unwrap_or_else(|| self.default.clone())
    }
}
