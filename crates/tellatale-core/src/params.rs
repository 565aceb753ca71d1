//! Sampling parameters sent with every generation request.

/// Fixed generation configuration for story requests.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    /// Sampling temperature.
    pub temperature: f32,
    /// Nucleus-sampling probability mass.
    pub top_p: f32,
    /// Nucleus-sampling candidate count.
    pub top_k: u32,
    /// Upper bound on generated tokens.
    pub max_output_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.95,
            top_k: 40,
            max_output_tokens: 2048,
        }
    }
}
