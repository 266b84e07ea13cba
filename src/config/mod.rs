use config::{Config, Environment, File};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};

pub mod validator;

use crate::agents::config::{AgentConfig, CrewDefinition, LlmProviderType, MemoryLimits, ToolSettings};
use crate::cli::Cli;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub providers: ProviderSettings,
    #[serde(default)]
    pub memory: MemoryLimits,
    #[serde(default)]
    pub tools: ToolSettings,
    /// Agents added to (or replacing) the built-in presets
    #[serde(default)]
    pub agents: Vec<AgentConfig>,
    /// Crews added to (or replacing) the built-in presets
    #[serde(default)]
    pub crews: Vec<CrewDefinition>,
}

/// Whether the router talks to real model APIs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderMode {
    /// Offline canned answers
    Mock,
    /// At least one provider has a usable API key
    Live,
}

/// Credentials and model choices for the model providers
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSettings {
    /// Use the mock provider even when keys are present
    #[serde(default)]
    pub mock_mode: bool,
    #[serde(default, deserialize_with = "deserialize_secret")]
    pub openai_api_key: Option<SecretString>,
    #[serde(default, deserialize_with = "deserialize_secret")]
    pub anthropic_api_key: Option<SecretString>,
    #[serde(default, deserialize_with = "deserialize_secret")]
    pub gemini_api_key: Option<SecretString>,
    #[serde(default = "default_openai_model")]
    pub openai_model: String,
    #[serde(default = "default_anthropic_model")]
    pub anthropic_model: String,
    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,
    #[serde(default)]
    pub openai_base_url: Option<String>,
    #[serde(default)]
    pub anthropic_base_url: Option<String>,
    #[serde(default)]
    pub gemini_base_url: Option<String>,
}

fn default_openai_model() -> String {
    "gpt-4o".to_string()
}

fn default_anthropic_model() -> String {
    "claude-3-5-sonnet-latest".to_string()
}

fn default_gemini_model() -> String {
    "gemini-1.5-pro".to_string()
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(SecretString::from))
}

/// Placeholder keys shipped in sample configs
const PLACEHOLDER_KEY: &str = "demo";

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            mock_mode: false,
            openai_api_key: None,
            anthropic_api_key: None,
            gemini_api_key: None,
            openai_model: default_openai_model(),
            anthropic_model: default_anthropic_model(),
            gemini_model: default_gemini_model(),
            openai_base_url: None,
            anthropic_base_url: None,
            gemini_base_url: None,
        }
    }
}

impl ProviderSettings {
    /// Usable API key for `kind`; empty and placeholder keys do not count
    pub fn credential(&self, kind: LlmProviderType) -> Option<&SecretString> {
        let key = match kind {
            LlmProviderType::OpenAI => self.openai_api_key.as_ref(),
            LlmProviderType::Anthropic => self.anthropic_api_key.as_ref(),
            LlmProviderType::Gemini => self.gemini_api_key.as_ref(),
            LlmProviderType::Mock => None,
        }?;
        let exposed = key.expose_secret().trim();
        if exposed.is_empty() || exposed.eq_ignore_ascii_case(PLACEHOLDER_KEY) {
            None
        } else {
            Some(key)
        }
    }

    /// Providers with a usable key, in routing order
    pub fn live_providers(&self) -> Vec<LlmProviderType> {
        [
            LlmProviderType::OpenAI,
            LlmProviderType::Anthropic,
            LlmProviderType::Gemini,
        ]
        .into_iter()
        .filter(|kind| self.credential(*kind).is_some())
        .collect()
    }

    pub fn mode(&self) -> ProviderMode {
        if self.mock_mode || self.live_providers().is_empty() {
            ProviderMode::Mock
        } else {
            ProviderMode::Live
        }
    }

    /// Apply the conventional provider environment variables through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .map(SecretString::from)
        };

        if let Some(key) = secret("OPENAI_API_KEY") {
            self.openai_api_key = Some(key);
        }
        if let Some(key) = secret("ANTHROPIC_API_KEY") {
            self.anthropic_api_key = Some(key);
        }
        if let Some(key) = secret("GEMINI_API_KEY").or_else(|| secret("GOOGLE_API_KEY")) {
            self.gemini_api_key = Some(key);
        }
        if let Some(flag) = lookup("SITECREW_MOCK_MODE").and_then(|v| parse_flag(&v)) {
            self.mock_mode = flag;
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Settings {
    pub fn new() -> Result<Self, anyhow::Error> {
        Self::from_root(".")
    }

    /// Create settings from CLI arguments (config file, environment, CLI overrides)
    pub fn new_with_cli(cli: &Cli) -> Result<Self, anyhow::Error> {
        let root = cli
            .config
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let mut settings = Self::load(&cli.config, &root, |name| std::env::var(name).ok())?;

        // CLI > env vars > config file
        if let Some(mock) = cli.mock {
            settings.providers.mock_mode = mock;
        }

        Ok(settings)
    }

    /// Load `<root>/sitecrew.{toml,yaml,json}` plus `<root>/config/{agents,crews}`
    pub fn from_root(root: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
        let root = root.as_ref();
        Self::load(&root.join("sitecrew"), root, |name| std::env::var(name).ok())
    }

    fn load<F>(config_path: &Path, root: &Path, env: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let s = Config::builder()
            .add_source(File::from(config_path.to_path_buf()).required(false))
            .add_source(
                Environment::with_prefix("SITECREW")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut settings: Settings = s.try_deserialize()?;
        settings.providers.apply_env(env);
        settings.load_external_configs(root)?;

        validator::ConfigValidator::validate(&settings).map_err(|errors| {
            let error_messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            anyhow::anyhow!(
                "Configuration validation failed:\n{}",
                error_messages.join("\n")
            )
        })?;

        tracing::debug!(
            mode = ?settings.providers.mode(),
            agents = settings.agents.len(),
            crews = settings.crews.len(),
            "Settings loaded"
        );
        Ok(settings)
    }

    fn load_external_configs(&mut self, root: &Path) -> Result<(), anyhow::Error> {
        let agents: Vec<AgentConfig> = load_dir(&root.join("config").join("agents"))?;
        Self::merge_vec_by_key(&mut self.agents, agents, |a| a.id.clone());

        let crews: Vec<CrewDefinition> = load_dir(&root.join("config").join("crews"))?;
        Self::merge_vec_by_key(&mut self.crews, crews, |c| c.id.clone());
        Ok(())
    }

    /// Merge two vectors by a key function.
    /// Items from `other` override items in `base` with the same key.
    fn merge_vec_by_key<T, K, F>(base: &mut Vec<T>, other: Vec<T>, key_fn: F)
    where
        K: Eq + std::hash::Hash,
        F: Fn(&T) -> K,
    {
        use std::collections::HashMap;

        let mut key_to_index: HashMap<K, usize> = HashMap::new();
        for (i, item) in base.iter().enumerate() {
            key_to_index.insert(key_fn(item), i);
        }

        for item in other {
            let key = key_fn(&item);
            if let Some(&idx) = key_to_index.get(&key) {
                base[idx] = item;
            } else {
                key_to_index.insert(key, base.len());
                base.push(item);
            }
        }
    }
}

/// Every json/yaml/toml file in `dir`, one item per file, in path order
fn load_dir<T: DeserializeOwned>(dir: &Path) -> Result<Vec<T>, anyhow::Error> {
    let pattern = format!("{}/*", dir.display());
    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in glob::glob(&pattern)? {
        match entry {
            Ok(path) => paths.push(path),
            Err(e) => tracing::warn!("Failed to read glob entry: {}", e),
        }
    }
    paths.sort();

    let mut items = Vec::new();
    for path in paths {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        if !matches!(ext, "json" | "yaml" | "yml" | "toml") {
            continue;
        }

        let content = std::fs::read_to_string(&path)?;
        let item: T = match ext {
            "json" => serde_json::from_str(&content)
                .map_err(|e| anyhow::anyhow!("JSON parse error in {}: {}", path.display(), e))?,
            "toml" => toml::from_str(&content)
                .map_err(|e| anyhow::anyhow!("TOML parse error in {}: {}", path.display(), e))?,
            _ => serde_yaml::from_str(&content)
                .map_err(|e| anyhow::anyhow!("YAML parse error in {}: {}", path.display(), e))?,
        };
        tracing::debug!("Loaded {}", path.display());
        items.push(item);
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_default_is_mock_mode() {
        let settings = ProviderSettings::default();
        assert_eq!(settings.mode(), ProviderMode::Mock);
        assert!(settings.live_providers().is_empty());
        assert_eq!(settings.openai_model, "gpt-4o");
    }

    #[test]
    fn test_placeholder_keys_do_not_count() {
        let mut settings = ProviderSettings::default();
        settings.apply_env(env(&[("OPENAI_API_KEY", "demo"), ("ANTHROPIC_API_KEY", "sk-ant-123")]));

        assert!(settings.credential(LlmProviderType::OpenAI).is_none());
        assert!(settings.credential(LlmProviderType::Anthropic).is_some());
        assert_eq!(settings.live_providers(), vec![LlmProviderType::Anthropic]);
        assert_eq!(settings.mode(), ProviderMode::Live);
    }

    #[test]
    fn test_google_key_is_gemini_alias() {
        let mut settings = ProviderSettings::default();
        settings.apply_env(env(&[("GOOGLE_API_KEY", "g-123")]));
        assert_eq!(
            settings.credential(LlmProviderType::Gemini).map(|k| k.expose_secret().to_string()),
            Some("g-123".to_string())
        );
    }

    #[test]
    fn test_mock_flag_wins_over_keys() {
        let mut settings = ProviderSettings::default();
        settings.apply_env(env(&[("OPENAI_API_KEY", "sk-1"), ("SITECREW_MOCK_MODE", "true")]));
        assert_eq!(settings.mode(), ProviderMode::Mock);

        settings.apply_env(env(&[("SITECREW_MOCK_MODE", "maybe")]));
        assert!(settings.mock_mode);
    }

    #[test]
    fn test_secret_fields_deserialize() {
        let settings: ProviderSettings =
            serde_json::from_str(r#"{"openai_api_key": "sk-1", "anthropic_api_key": "  "}"#).unwrap();
        assert!(settings.openai_api_key.is_some());
        assert!(settings.anthropic_api_key.is_none());
        assert_eq!(settings.gemini_model, "gemini-1.5-pro");
        // keys never leak through Debug
        assert!(!format!("{:?}", settings).contains("sk-1"));
    }

    #[test]
    fn test_merge_vec_by_key() {
        let mut base = vec![("a", 1), ("b", 2)];
        Settings::merge_vec_by_key(&mut base, vec![("b", 20), ("c", 3), ("c", 30)], |i| i.0);
        assert_eq!(base, vec![("a", 1), ("b", 20), ("c", 30)]);
    }
}
