//! Heuristic token counting

/// Approximate characters per token
pub const CHARS_PER_TOKEN: f32 = 4.0;

/// Token counter
///
/// Uses the `ceil(len / ratio)` heuristic; no model tokenizer is involved.
/// Counting holds no state, so prompts are never retained.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenCounter {
    chars_per_token: f32,
}

impl TokenCounter {
    pub fn new() -> Self {
        Self::with_ratio(CHARS_PER_TOKEN)
    }

    /// Create with a specific chars-per-token ratio
    pub fn with_ratio(chars_per_token: f32) -> Self {
        Self { chars_per_token }
    }

    /// Estimate with the default ratio
    pub fn estimate(text: &str) -> u32 {
        Self::new().count(text)
    }

    /// Count tokens in text (approximate)
    pub fn count(&self, text: &str) -> u32 {
        (text.len() as f32 / self.chars_per_token).ceil() as u32
    }
}

impl Default for TokenCounter {
    fn default() -> Self {
        Self::new()
    }
}
