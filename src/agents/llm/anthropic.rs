//! Anthropic messages provider

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{Generation, GenerationConfig, ModelProvider, Pricing, TokenUsage};
use crate::agents::config::LlmProviderType;
use crate::agents::error::{LlmError, LlmResult};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";
/// The messages API requires an explicit completion limit
const DEFAULT_MAX_OUTPUT: u32 = 4096;

/// Anthropic LLM Provider
pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
}

impl AnthropicProvider {
    pub fn new(api_key: SecretString, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: model.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn build_request_body(&self, prompt: &str, config: &GenerationConfig) -> Value {
        let mut body = json!({
            "model": self.model,
            "max_tokens": config.max_tokens.unwrap_or(DEFAULT_MAX_OUTPUT),
            "messages": [{"role": "user", "content": prompt}],
        });

        if let Some(temp) = config.temperature {
            // Anthropic caps temperature at 1.0
            body["temperature"] = json!(temp.min(1.0));
        }
        if let Some(top_p) = config.top_p {
            body["top_p"] = json!(top_p);
        }

        body
    }
}

#[async_trait]
impl ModelProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn kind(&self) -> LlmProviderType {
        LlmProviderType::Anthropic
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate_response(&self, prompt: &str, config: &GenerationConfig) -> LlmResult<String> {
        self.generate(prompt, config).await.map(|g| g.text)
    }

    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> LlmResult<Generation> {
        let body = self.build_request_body(prompt, config);

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", API_VERSION)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 401 {
            return Err(LlmError::Authentication("Anthropic rejected the API key".to_string()));
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let anthropic_response: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(format!("Failed to parse response: {}", e)))?;

        let text: String = anthropic_response
            .content
            .iter()
            .filter(|block| block.block_type == "text")
            .filter_map(|block| block.text.as_deref())
            .collect();
        if text.is_empty() && anthropic_response.content.is_empty() {
            return Err(LlmError::Parse("No content blocks in response".to_string()));
        }

        let usage = match anthropic_response.usage {
            Some(u) => TokenUsage::new(u.input_tokens, u.output_tokens),
            None => TokenUsage::estimated(prompt, &text),
        };

        Ok(Generation { text, usage })
    }

    fn pricing(&self) -> Pricing {
        match self.model.as_str() {
            m if m.contains("haiku") => Pricing::new(0.0008, 0.004),
            m if m.contains("opus") => Pricing::new(0.015, 0.075),
            _ => Pricing::new(0.003, 0.015),
        }
    }

    fn max_tokens(&self) -> u32 {
        200000
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_always_sets_max_tokens() {
        let provider = AnthropicProvider::new(SecretString::from("key".to_string()), "claude-3-5-sonnet-latest");
        let body = provider.build_request_body("hi", &GenerationConfig::default().with_temperature(1.4));
        assert_eq!(body["max_tokens"], 4096);
        assert!((body["temperature"].as_f64().unwrap() - 1.0).abs() < 1e-6);
    }
}
