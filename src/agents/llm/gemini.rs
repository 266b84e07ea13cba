//! Google Gemini generateContent provider

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{Generation, GenerationConfig, ModelProvider, Pricing, TokenUsage};
use crate::agents::config::LlmProviderType;
use crate::agents::error::{LlmError, LlmResult};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Google Gemini LLM Provider
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
}

impl GeminiProvider {
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
        let mut generation_config = json!({});
        if let Some(temp) = config.temperature {
            generation_config["temperature"] = json!(temp);
        }
        if let Some(max_tokens) = config.max_tokens {
            generation_config["maxOutputTokens"] = json!(max_tokens);
        }
        if let Some(top_p) = config.top_p {
            generation_config["topP"] = json!(top_p);
        }
        if let Some(penalty) = config.frequency_penalty {
            generation_config["frequencyPenalty"] = json!(penalty);
        }
        if let Some(penalty) = config.presence_penalty {
            generation_config["presencePenalty"] = json!(penalty);
        }

        json!({
            "contents": [{"role": "user", "parts": [{"text": prompt}]}],
            "generationConfig": generation_config,
        })
    }
}

#[async_trait]
impl ModelProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn kind(&self) -> LlmProviderType {
        LlmProviderType::Gemini
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate_response(&self, prompt: &str, config: &GenerationConfig) -> LlmResult<String> {
        self.generate(prompt, config).await.map(|g| g.text)
    }

    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> LlmResult<Generation> {
        let body = self.build_request_body(prompt, config);
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.expose_secret())])
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let gemini_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(format!("Failed to parse response: {}", e)))?;

        let candidate = gemini_response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::Parse("No candidates in response".to_string()))?;
        let text: String = candidate
            .content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();

        let usage = match gemini_response.usage_metadata {
            Some(u) => TokenUsage {
                prompt_tokens: u.prompt_token_count,
                completion_tokens: u.candidates_token_count,
                total_tokens: u.total_token_count,
            },
            None => TokenUsage::estimated(prompt, &text),
        };

        Ok(Generation { text, usage })
    }

    fn pricing(&self) -> Pricing {
        match self.model.as_str() {
            m if m.contains("flash") => Pricing::new(0.000075, 0.0003),
            _ => Pricing::new(0.00125, 0.005),
        }
    }

    fn max_tokens(&self) -> u32 {
        match self.model.as_str() {
            m if m.contains("gemini-1.5-pro") => 2097152,
            m if m.contains("gemini-1.5-flash") || m.contains("gemini-2") => 1048576,
            m if m.contains("gemini-pro") => 32768,
            _ => 32768,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsage>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_config_uses_camel_case() {
        let provider = GeminiProvider::new(SecretString::from("key".to_string()), "gemini-1.5-pro");
        let config = GenerationConfig::default().with_max_tokens(256);
        let body = provider.build_request_body("hello", &config);
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 256);
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(provider.max_tokens(), 2097152);
    }
}
