//! Offline provider with canned answers

use std::collections::VecDeque;
use std::sync::{LazyLock, Mutex};

use async_trait::async_trait;
use regex::Regex;
use serde_json::json;

use super::{GenerationConfig, ModelProvider, Pricing};
use crate::agents::config::LlmProviderType;
use crate::agents::error::{LlmError, LlmResult};

static PLAN_REQUEST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""steps"\s*:"#).expect("valid plan regex"));
static SYNTHESIS_REQUEST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bsynthesi[sz]e\b").expect("valid synthesis regex"));
static CLONE_REQUEST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bclon(e|ing)\b").expect("valid clone regex"));
static COMPONENT_REQUEST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bcomponents?\b").expect("valid component regex"));
static ANALYSIS_REQUEST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\banaly[sz](e|is|ing)\b").expect("valid analysis regex"));

/// Provider that answers from a fixed script, then from prompt classification
///
/// Used when no live keys are configured and throughout the test suite.
pub struct MockProvider {
    name: String,
    kind: LlmProviderType,
    pricing: Pricing,
    max_tokens: u32,
    scripted: Mutex<VecDeque<String>>,
    failures: Vec<String>,
    prompts: Mutex<Vec<String>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            name: "mock".to_string(),
            kind: LlmProviderType::Mock,
            pricing: Pricing::new(0.0001, 0.0002),
            max_tokens: 100_000,
            scripted: Mutex::new(VecDeque::new()),
            failures: Vec::new(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Answers returned in order before falling back to classification
    pub fn scripted<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let provider = Self::new();
        provider.push_responses(responses);
        provider
    }

    pub fn push_responses<I, S>(&self, responses: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut queue = self.scripted.lock().unwrap_or_else(|e| e.into_inner());
        queue.extend(responses.into_iter().map(Into::into));
    }

    /// Fail every prompt containing `needle`
    pub fn with_failure(mut self, needle: impl Into<String>) -> Self {
        self.failures.push(needle.into());
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Report a different provider family to the router
    pub fn with_kind(mut self, kind: LlmProviderType) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_pricing(mut self, pricing: Pricing) -> Self {
        self.pricing = pricing;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Every prompt received so far
    pub fn recorded_prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn canned_response(prompt: &str) -> String {
        if PLAN_REQUEST.is_match(prompt) {
            return json!({
                "steps": [
                    {
                        "action": "analyze_requirements",
                        "tool": null,
                        "parameters": {},
                        "expected_outcome": "Clear list of requirements and constraints"
                    },
                    {
                        "action": "produce_deliverable",
                        "tool": null,
                        "parameters": {},
                        "expected_outcome": "Deliverable that satisfies the task"
                    }
                ]
            })
            .to_string();
        }

        if SYNTHESIS_REQUEST.is_match(prompt) {
            return "Final deliverable: all steps completed. Requirements were analyzed, \
                    the deliverable was produced and checked against the expected output."
                .to_string();
        }

        if CLONE_REQUEST.is_match(prompt) {
            return "Clone analysis: the page uses a header with navigation, a hero section, \
                    a three-column feature grid and a footer. Layout is responsive with a \
                    single breakpoint at 768px."
                .to_string();
        }

        if COMPONENT_REQUEST.is_match(prompt) {
            return "```tsx\nexport function Component({ title }: { title: string }) {\n  \
                    return <section className=\"p-6 rounded-lg shadow\"><h2>{title}</h2></section>;\n}\n```"
                .to_string();
        }

        if ANALYSIS_REQUEST.is_match(prompt) {
            return "Analysis: the subject shows three main themes, moderate competition and \
                    clear opportunities in performance and accessibility."
                .to_string();
        }

        "Completed the requested work and summarized the outcome.".to_string()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModelProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> LlmProviderType {
        self.kind
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn generate_response(&self, prompt: &str, _config: &GenerationConfig) -> LlmResult<String> {
        self.prompts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(prompt.to_string());

        if let Some(needle) = self.failures.iter().find(|n| prompt.contains(n.as_str())) {
            return Err(LlmError::Api {
                status: 500,
                message: format!("mock failure triggered by '{}'", needle),
            });
        }

        let scripted = self
            .scripted
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        Ok(scripted.unwrap_or_else(|| Self::canned_response(prompt)))
    }

    fn pricing(&self) -> Pricing {
        self.pricing
    }

    fn max_tokens(&self) -> u32 {
        self.max_tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::domain::Plan;

    async fn ask(provider: &MockProvider, prompt: &str) -> LlmResult<String> {
        provider.generate_response(prompt, &GenerationConfig::default()).await
    }

    #[tokio::test]
    async fn test_plan_request_yields_parseable_plan() {
        let provider = MockProvider::new();
        let answer = ask(&provider, r#"Respond with {"steps": [...]}"#).await.unwrap();
        let plan = Plan::parse(&answer).unwrap();
        assert_eq!(plan.len(), 2);
    }

    #[tokio::test]
    async fn test_classification() {
        let provider = MockProvider::new();
        assert!(ask(&provider, "Clone https://example.com").await.unwrap().starts_with("Clone analysis"));
        assert!(ask(&provider, "Build a pricing component").await.unwrap().contains("export function"));
        assert!(ask(&provider, "Analyze the market").await.unwrap().starts_with("Analysis"));
        assert!(ask(&provider, "Synthesize the results").await.unwrap().starts_with("Final deliverable"));
        assert!(ask(&provider, "hello").await.unwrap().starts_with("Completed"));
    }

    #[tokio::test]
    async fn test_scripted_answers_come_first() {
        let provider = MockProvider::scripted(["one", "two"]);
        assert_eq!(ask(&provider, "Clone it").await.unwrap(), "one");
        assert_eq!(ask(&provider, "Clone it").await.unwrap(), "two");
        assert!(ask(&provider, "Clone it").await.unwrap().starts_with("Clone analysis"));
        assert_eq!(provider.recorded_prompts().len(), 3);
    }

    #[tokio::test]
    async fn test_failure_needle() {
        let provider = MockProvider::scripted(["unused"]).with_failure("Agent Alpha");
        let err = ask(&provider, "You are Agent Alpha").await.unwrap_err();
        assert!(matches!(err, LlmError::Api { status: 500, .. }));
        // failures do not consume scripted answers
        assert_eq!(ask(&provider, "You are Agent Beta").await.unwrap(), "unused");
    }

    #[tokio::test]
    async fn test_default_generate_estimates_usage() {
        let provider = MockProvider::scripted(["abcd"]);
        let generation = provider
            .generate("abcdefgh", &GenerationConfig::default())
            .await
            .unwrap();
        assert_eq!(generation.usage.total_tokens, 3);
        assert_eq!(provider.max_tokens(), 100_000);
    }
}
