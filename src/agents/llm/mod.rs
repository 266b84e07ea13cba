//! Model providers and routing
//!
//! Every backend implements [`ModelProvider`]:
//! - OpenAI (GPT-4o)
//! - Anthropic (Claude)
//! - Google Gemini
//! - Mock (canned, offline)
//!
//! [`ModelRouter`] picks one provider per request from context size,
//! cost and preference.

mod anthropic;
mod gemini;
mod mock;
mod openai;
mod router;

pub use anthropic::AnthropicProvider;
pub use gemini::GeminiProvider;
pub use mock::MockProvider;
pub use openai::OpenAiProvider;
pub use router::{Complexity, ModelRouter, RoutedGeneration, RoutingRequirements};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::agents::config::LlmProviderType;
use crate::agents::error::{LlmError, LlmResult};
use crate::agents::token::TokenCounter;
use crate::config::ProviderSettings;

/// Share of tokens billed at the input rate when only a total is known
pub const INPUT_TOKEN_SHARE: f64 = 0.7;

/// Sampling parameters for a single generation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,
}

impl GenerationConfig {
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Token usage information
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }

    /// Heuristic usage for providers that do not report it
    pub fn estimated(prompt: &str, completion: &str) -> Self {
        Self::new(TokenCounter::estimate(prompt), TokenCounter::estimate(completion))
    }
}

/// Text plus the tokens it took to produce it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generation {
    pub text: String,
    pub usage: TokenUsage,
}

/// Price per 1,000 tokens, in dollars
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pricing {
    pub input_per_1k: f64,
    pub output_per_1k: f64,
}

impl Pricing {
    pub const fn new(input_per_1k: f64, output_per_1k: f64) -> Self {
        Self {
            input_per_1k,
            output_per_1k,
        }
    }

    /// Cost of `tokens` assuming a 70/30 input/output split
    pub fn blended_cost(&self, tokens: u32) -> f64 {
        let thousands = tokens as f64 / 1000.0;
        thousands * INPUT_TOKEN_SHARE * self.input_per_1k
            + thousands * (1.0 - INPUT_TOKEN_SHARE) * self.output_per_1k
    }
}

/// A text-generation backend
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Name the router keys this provider by
    fn name(&self) -> &str;

    /// Provider family, used for routing bias
    fn kind(&self) -> LlmProviderType;

    /// Get the model being used
    fn model(&self) -> &str;

    /// Generate a completion for a single prompt
    async fn generate_response(&self, prompt: &str, config: &GenerationConfig) -> LlmResult<String>;

    /// Generate and report token usage
    ///
    /// The default estimates usage from prompt and completion length.
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> LlmResult<Generation> {
        let text = self.generate_response(prompt, config).await?;
        let usage = TokenUsage::estimated(prompt, &text);
        Ok(Generation { text, usage })
    }

    /// Per-1K token prices
    fn pricing(&self) -> Pricing;

    /// Dollar cost of `tokens`
    fn calculate_cost(&self, tokens: u32) -> f64 {
        self.pricing().blended_cost(tokens)
    }

    /// Context window in tokens
    fn max_tokens(&self) -> u32;
}

/// Create a live provider from settings
///
/// Fails with `Authentication` when no usable key is configured.
pub fn create_provider(
    kind: LlmProviderType,
    settings: &ProviderSettings,
) -> LlmResult<Arc<dyn ModelProvider>> {
    let key = || {
        settings.credential(kind).cloned().ok_or_else(|| {
            LlmError::Authentication(format!("no API key configured for {}", kind))
        })
    };

    match kind {
        LlmProviderType::OpenAI => {
            let mut provider = OpenAiProvider::new(key()?, settings.openai_model.clone());
            if let Some(url) = &settings.openai_base_url {
                provider = provider.with_base_url(url.clone());
            }
            Ok(Arc::new(provider))
        }
        LlmProviderType::Anthropic => {
            let mut provider = AnthropicProvider::new(key()?, settings.anthropic_model.clone());
            if let Some(url) = &settings.anthropic_base_url {
                provider = provider.with_base_url(url.clone());
            }
            Ok(Arc::new(provider))
        }
        LlmProviderType::Gemini => {
            let mut provider = GeminiProvider::new(key()?, settings.gemini_model.clone());
            if let Some(url) = &settings.gemini_base_url {
                provider = provider.with_base_url(url.clone());
            }
            Ok(Arc::new(provider))
        }
        LlmProviderType::Mock => Ok(Arc::new(MockProvider::new())),
    }
}
