//! Configuration types for agents and crews

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::error::{AgentError, AgentResult};

/// Configuration for a single agent
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct AgentConfig {
    /// Unique agent id
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Role the agent plays inside a crew
    pub role: AgentRole,
    /// Background story injected into every prompt
    #[serde(default)]
    pub backstory: String,
    /// What the agent is trying to achieve
    #[serde(default)]
    pub goal: String,
    /// Tool names from the shared tool registry
    #[serde(default)]
    pub tools: Vec<String>,
    /// Preferred model provider
    #[serde(default)]
    pub model_provider: LlmProviderType,
    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Completion token limit
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Whether the agent keeps long-term memory between tasks
    #[serde(default = "default_true")]
    pub memory_enabled: bool,
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    2048
}

fn default_true() -> bool {
    true
}

impl AgentConfig {
    pub fn new(id: impl Into<String>, name: impl Into<String>, role: AgentRole) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role,
            backstory: String::new(),
            goal: String::new(),
            tools: Vec::new(),
            model_provider: LlmProviderType::default(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            memory_enabled: true,
        }
    }

    pub fn with_goal(mut self, goal: impl Into<String>) -> Self {
        self.goal = goal.into();
        self
    }

    pub fn with_backstory(mut self, backstory: impl Into<String>) -> Self {
        self.backstory = backstory.into();
        self
    }

    pub fn with_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tools = tools.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_provider(mut self, provider: LlmProviderType) -> Self {
        self.model_provider = provider;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_memory(mut self, enabled: bool) -> Self {
        self.memory_enabled = enabled;
        self
    }

    /// Check the values a provider would reject
    pub fn validate(&self) -> AgentResult<()> {
        if self.id.trim().is_empty() {
            return Err(AgentError::Validation("agent id cannot be empty".into()));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(AgentError::Validation(format!(
                "agent '{}' temperature {} is outside 0.0..=2.0",
                self.id, self.temperature
            )));
        }
        if self.max_tokens == 0 {
            return Err(AgentError::Validation(format!(
                "agent '{}' max_tokens must be greater than zero",
                self.id
            )));
        }
        Ok(())
    }
}

/// Roles an agent can play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Researcher,
    Designer,
    Developer,
    QaTester,
    ContentWriter,
    Optimizer,
    Debugger,
    Planner,
}

impl AgentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::Researcher => "researcher",
            AgentRole::Designer => "designer",
            AgentRole::Developer => "developer",
            AgentRole::QaTester => "qa_tester",
            AgentRole::ContentWriter => "content_writer",
            AgentRole::Optimizer => "optimizer",
            AgentRole::Debugger => "debugger",
            AgentRole::Planner => "planner",
        }
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Supported model providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProviderType {
    /// OpenAI (GPT-4o etc.)
    #[default]
    OpenAI,
    /// Anthropic (Claude)
    Anthropic,
    /// Google Gemini
    #[serde(alias = "google")]
    Gemini,
    /// Canned offline provider
    Mock,
}

impl std::fmt::Display for LlmProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmProviderType::OpenAI => write!(f, "openai"),
            LlmProviderType::Anthropic => write!(f, "anthropic"),
            LlmProviderType::Gemini => write!(f, "gemini"),
            LlmProviderType::Mock => write!(f, "mock"),
        }
    }
}

/// How a crew runs the tasks of a workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProcessType {
    /// Dependency order, one task at a time
    #[default]
    Sequential,
    /// A manager agent plans, then tasks run in dependency order
    Hierarchical,
    /// Several agents attempt each task, first success wins
    Consensus,
}

impl std::fmt::Display for ProcessType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessType::Sequential => write!(f, "sequential"),
            ProcessType::Hierarchical => write!(f, "hierarchical"),
            ProcessType::Consensus => write!(f, "consensus"),
        }
    }
}

/// A fully resolved crew
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CrewConfig {
    pub id: String,
    pub name: String,
    pub agents: Vec<AgentConfig>,
    #[serde(default)]
    pub process: ProcessType,
    /// Raise lifecycle logging to info
    #[serde(default)]
    pub verbose: bool,
    #[serde(default = "default_true")]
    pub memory_enabled: bool,
    /// Maximum number of tasks a single workflow run may contain
    #[serde(default = "default_max_execution")]
    pub max_execution: u32,
}

fn default_max_execution() -> u32 {
    50
}

impl CrewConfig {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        agents: Vec<AgentConfig>,
        process: ProcessType,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            agents,
            process,
            verbose: false,
            memory_enabled: true,
            max_execution: default_max_execution(),
        }
    }
}

/// Crew as written in a config file: agents are referenced by id
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CrewDefinition {
    pub id: String,
    pub name: String,
    pub agents: Vec<String>,
    #[serde(default)]
    pub process: ProcessType,
    #[serde(default)]
    pub verbose: bool,
    #[serde(default = "default_true")]
    pub memory_enabled: bool,
    #[serde(default = "default_max_execution")]
    pub max_execution: u32,
}

/// Bounds applied to every agent's long-term memory
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub struct MemoryLimits {
    /// Trim is triggered once the log grows past this many entries
    #[serde(default = "default_long_term_capacity")]
    pub long_term_capacity: usize,
    /// Number of most recent entries kept after a trim
    #[serde(default = "default_trim_to")]
    pub trim_to: usize,
    /// Memories surfaced per recall
    #[serde(default = "default_recall_limit")]
    pub recall_limit: usize,
}

impl Default for MemoryLimits {
    fn default() -> Self {
        Self {
            long_term_capacity: default_long_term_capacity(),
            trim_to: default_trim_to(),
            recall_limit: default_recall_limit(),
        }
    }
}

fn default_long_term_capacity() -> usize {
    100
}

fn default_trim_to() -> usize {
    50
}

fn default_recall_limit() -> usize {
    5
}

/// Settings for the built-in tools
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolSettings {
    /// Directory the file_system tool is confined to
    #[serde(default = "default_sandbox_root")]
    pub sandbox_root: PathBuf,
    /// Search API queried by web_research; offline when absent
    #[serde(default)]
    pub search_endpoint: Option<String>,
    /// HTTP timeout for tools that hit the network
    #[serde(default = "default_http_timeout")]
    pub http_timeout_seconds: u64,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            sandbox_root: default_sandbox_root(),
            search_endpoint: None,
            http_timeout_seconds: default_http_timeout(),
        }
    }
}

fn default_sandbox_root() -> PathBuf {
    PathBuf::from("./workspace")
}

fn default_http_timeout() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_config_defaults_from_yaml() {
        let yaml = r#"
id: dev
name: Developer
role: developer
"#;
        let config: AgentConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.role, AgentRole::Developer);
        assert_eq!(config.model_provider, LlmProviderType::OpenAI);
        assert_eq!(config.max_tokens, 2048);
        assert!(config.memory_enabled);
        assert!(config.tools.is_empty());
    }

    #[test]
    fn test_google_alias_maps_to_gemini() {
        let provider: LlmProviderType = serde_json::from_str("\"google\"").unwrap();
        assert_eq!(provider, LlmProviderType::Gemini);
        assert_eq!(provider.to_string(), "gemini");
    }

    #[test]
    fn test_role_round_trips_snake_case() {
        let role: AgentRole = serde_json::from_str("\"qa_tester\"").unwrap();
        assert_eq!(role, AgentRole::QaTester);
        assert_eq!(role.to_string(), "qa_tester");
    }

    #[test]
    fn test_validate_rejects_bad_temperature() {
        let config = AgentConfig::new("a", "A", AgentRole::Planner).with_temperature(3.5);
        assert!(matches!(config.validate(), Err(AgentError::Validation(_))));
    }

    #[test]
    fn test_crew_config_defaults() {
        let json = r#"{"id": "c", "name": "Crew", "agents": []}"#;
        let crew: CrewConfig = serde_json::from_str(json).unwrap();
        assert_eq!(crew.process, ProcessType::Sequential);
        assert_eq!(crew.max_execution, 50);
        assert!(crew.memory_enabled);
        assert!(!crew.verbose);
    }
}
