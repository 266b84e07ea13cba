//! OpenAI chat-completions provider

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{Generation, GenerationConfig, ModelProvider, Pricing, TokenUsage};
use crate::agents::config::LlmProviderType;
use crate::agents::error::{LlmError, LlmResult};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI LLM Provider
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
}

impl OpenAiProvider {
    pub fn new(api_key: SecretString, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: model.into(),
        }
    }

    /// Point at a proxy or a test server
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn build_request_body(&self, prompt: &str, config: &GenerationConfig) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
        });

        if let Some(temp) = config.temperature {
            body["temperature"] = json!(temp);
        }
        if let Some(max_tokens) = config.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        if let Some(top_p) = config.top_p {
            body["top_p"] = json!(top_p);
        }
        if let Some(penalty) = config.frequency_penalty {
            body["frequency_penalty"] = json!(penalty);
        }
        if let Some(penalty) = config.presence_penalty {
            body["presence_penalty"] = json!(penalty);
        }

        body
    }

    fn parse_response(&self, prompt: &str, response: OpenAiResponse) -> LlmResult<Generation> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::Parse("No choices in response".to_string()))?;
        let text = choice.message.content.unwrap_or_default();

        let usage = match response.usage {
            Some(u) => TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            },
            None => TokenUsage::estimated(prompt, &text),
        };

        Ok(Generation { text, usage })
    }
}

#[async_trait]
impl ModelProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn kind(&self) -> LlmProviderType {
        LlmProviderType::OpenAI
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
            .post(format!("{}/chat/completions", self.base_url))
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 401 {
            return Err(LlmError::Authentication("OpenAI rejected the API key".to_string()));
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let openai_response: OpenAiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(format!("Failed to parse response: {}", e)))?;

        self.parse_response(prompt, openai_response)
    }

    fn pricing(&self) -> Pricing {
        match self.model.as_str() {
            m if m.contains("gpt-4o-mini") => Pricing::new(0.00015, 0.0006),
            m if m.contains("gpt-4o") => Pricing::new(0.0025, 0.01),
            m if m.contains("gpt-4-turbo") => Pricing::new(0.01, 0.03),
            m if m.contains("gpt-3.5") => Pricing::new(0.0005, 0.0015),
            _ => Pricing::new(0.03, 0.06),
        }
    }

    fn max_tokens(&self) -> u32 {
        match self.model.as_str() {
            m if m.contains("gpt-4-turbo") || m.contains("gpt-4o") => 128000,
            m if m.contains("gpt-4-32k") => 32768,
            m if m.contains("gpt-4") => 8192,
            m if m.contains("gpt-3.5-turbo-16k") => 16384,
            m if m.contains("gpt-3.5-turbo") => 4096,
            _ => 8192,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}
