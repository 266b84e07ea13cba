//! Provider selection by context size, cost and preference

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{create_provider, GenerationConfig, MockProvider, ModelProvider};
use crate::agents::config::LlmProviderType;
use crate::agents::error::{LlmError, LlmResult};
use crate::agents::token::TokenCounter;
use crate::config::{ProviderMode, ProviderSettings};

/// Discount applied to OpenAI-class providers for high-complexity work
const HIGH_COMPLEXITY_OPENAI_FACTOR: f64 = 0.8;
/// Discount applied to Gemini-class providers for low-complexity work
const LOW_COMPLEXITY_GEMINI_FACTOR: f64 = 0.9;

/// How demanding a request is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Low,
    Medium,
    High,
}

/// Constraints for one routing decision
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RoutingRequirements {
    /// Upper bound on the (bias-adjusted) estimated cost
    pub max_cost: Option<f64>,
    /// Provider name that wins whenever it is eligible
    pub preferred_provider: Option<String>,
    pub complexity: Option<Complexity>,
    /// Extra tokens expected beyond the prompt
    pub context_length: Option<u32>,
}

impl RoutingRequirements {
    pub fn with_max_cost(mut self, max_cost: f64) -> Self {
        self.max_cost = Some(max_cost);
        self
    }

    pub fn with_preferred_provider(mut self, provider: impl Into<String>) -> Self {
        self.preferred_provider = Some(provider.into());
        self
    }

    pub fn with_complexity(mut self, complexity: Complexity) -> Self {
        self.complexity = Some(complexity);
        self
    }

    pub fn with_context_length(mut self, tokens: u32) -> Self {
        self.context_length = Some(tokens);
        self
    }
}

/// Generation annotated with the provider that served it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutedGeneration {
    pub provider: String,
    pub text: String,
    pub tokens_used: u32,
    pub cost: f64,
}

/// Chooses one registered provider per request
pub struct ModelRouter {
    providers: Vec<Arc<dyn ModelProvider>>,
    counter: TokenCounter,
    mode: ProviderMode,
}

impl ModelRouter {
    pub fn new(mode: ProviderMode) -> Self {
        Self {
            providers: Vec::new(),
            counter: TokenCounter::new(),
            mode,
        }
    }

    /// Router with a single mock provider
    pub fn mock() -> Self {
        Self::with_mock(MockProvider::new())
    }

    pub fn with_mock(provider: MockProvider) -> Self {
        let mut router = Self::new(ProviderMode::Mock);
        router.register(Arc::new(provider));
        router
    }

    /// Build from settings: every provider with a usable key in live mode,
    /// the mock provider otherwise
    pub fn from_settings(settings: &ProviderSettings) -> Self {
        let mut router = Self::new(settings.mode());

        if router.mode == ProviderMode::Live {
            for kind in settings.live_providers() {
                match create_provider(kind, settings) {
                    Ok(provider) => {
                        router.register(provider);
                    }
                    Err(e) => warn!(provider = %kind, "Failed to create provider: {}", e),
                }
            }
        }

        if router.providers.is_empty() {
            if router.mode == ProviderMode::Live {
                warn!("No live provider could be created; falling back to mock mode");
            }
            router.mode = ProviderMode::Mock;
            router.register(Arc::new(MockProvider::new()));
        }

        debug!(mode = ?router.mode, providers = ?router.provider_names(), "Model router ready");
        router
    }

    /// Register a provider, replacing one with the same name in place
    pub fn register(&mut self, provider: Arc<dyn ModelProvider>) -> &mut Self {
        match self.providers.iter().position(|p| p.name() == provider.name()) {
            Some(index) => self.providers[index] = provider,
            None => self.providers.push(provider),
        }
        self
    }

    pub fn remove(&mut self, name: &str) -> Option<Arc<dyn ModelProvider>> {
        let index = self.providers.iter().position(|p| p.name() == name)?;
        Some(self.providers.remove(index))
    }

    pub fn provider(&self, name: &str) -> Option<Arc<dyn ModelProvider>> {
        self.providers.iter().find(|p| p.name() == name).cloned()
    }

    /// Names in registration order
    pub fn provider_names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }

    pub fn mode(&self) -> ProviderMode {
        self.mode
    }

    /// Pick a provider for `prompt`.
    ///
    /// Providers whose context window cannot hold the prompt plus
    /// `context_length` are dropped. An eligible preferred provider wins
    /// outright; otherwise the cheapest bias-adjusted estimate within
    /// `max_cost` wins, ties going to the earliest registered.
    pub fn select_provider(
        &self,
        prompt: &str,
        requirements: &RoutingRequirements,
    ) -> LlmResult<Arc<dyn ModelProvider>> {
        if self.providers.is_empty() {
            return Err(LlmError::NoProviders);
        }

        let required = self
            .counter
            .count(prompt)
            .saturating_add(requirements.context_length.unwrap_or(0));

        let eligible: Vec<&Arc<dyn ModelProvider>> = self
            .providers
            .iter()
            .filter(|p| p.max_tokens() >= required)
            .collect();

        if eligible.is_empty() {
            let largest = self.providers.iter().map(|p| p.max_tokens()).max().unwrap_or(0);
            return Err(LlmError::ContextLengthExceeded { required, largest });
        }

        if let Some(preferred) = &requirements.preferred_provider {
            if let Some(provider) = eligible.iter().find(|p| p.name() == preferred) {
                return Ok(Arc::clone(provider));
            }
        }

        let mut best: Option<(f64, &Arc<dyn ModelProvider>)> = None;
        let mut cheapest = f64::INFINITY;
        for provider in eligible {
            let cost = Self::adjusted_cost(provider.as_ref(), required, requirements.complexity);
            cheapest = cheapest.min(cost);
            if requirements.max_cost.is_some_and(|max| cost > max) {
                continue;
            }
            if best.map_or(true, |(best_cost, _)| cost < best_cost) {
                best = Some((cost, provider));
            }
        }

        match best {
            Some((_, provider)) => Ok(Arc::clone(provider)),
            None => Err(LlmError::CostCeilingExceeded {
                max_cost: requirements.max_cost.unwrap_or(0.0),
                cheapest,
            }),
        }
    }

    fn adjusted_cost(provider: &dyn ModelProvider, tokens: u32, complexity: Option<Complexity>) -> f64 {
        let cost = provider.calculate_cost(tokens);
        match (provider.kind(), complexity) {
            (LlmProviderType::OpenAI, Some(Complexity::High)) => cost * HIGH_COMPLEXITY_OPENAI_FACTOR,
            (LlmProviderType::Gemini, Some(Complexity::Low)) => cost * LOW_COMPLEXITY_GEMINI_FACTOR,
            _ => cost,
        }
    }

    /// Select a provider and generate with it
    pub async fn generate(
        &self,
        prompt: &str,
        requirements: &RoutingRequirements,
        config: &GenerationConfig,
    ) -> LlmResult<RoutedGeneration> {
        let provider = self.select_provider(prompt, requirements)?;
        let generation = provider.generate(prompt, config).await?;
        let cost = provider.calculate_cost(generation.usage.total_tokens);

        debug!(
            provider = provider.name(),
            tokens = generation.usage.total_tokens,
            cost,
            "Generated response"
        );

        Ok(RoutedGeneration {
            provider: provider.name().to_string(),
            text: generation.text,
            tokens_used: generation.usage.total_tokens,
            cost,
        })
    }
}
