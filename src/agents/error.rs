//! Error types for the agent orchestration system

use thiserror::Error;

/// Errors that can occur during agent, crew and orchestrator operations
#[derive(Debug, Error)]
pub enum AgentError {
    /// Agent not found
    #[error("Agent not found: {0}")]
    NotFound(String),

    /// Crew not found
    #[error("Crew not found: {0}")]
    CrewNotFound(String),

    /// LLM provider error
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// Tool invocation error
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    /// The task graph contains a cycle
    #[error("Circular dependency detected involving task '{0}'")]
    CircularDependency(String),

    /// A task depends on a task that is not part of the workflow
    #[error("Task '{task}' depends on unknown task '{dependency}'")]
    DependencyNotFound { task: String, dependency: String },

    /// A critical task failed and the workflow was aborted
    #[error("Critical task '{task}' failed: {reason}")]
    CriticalTaskFailed { task: String, reason: String },

    /// The manager agent could not produce a plan
    #[error("Planning failed: {0}")]
    PlanningFailed(String),

    /// The workflow has more tasks than the crew may execute
    #[error("Workflow has {tasks} tasks but the crew allows at most {limit}")]
    ExecutionLimit { tasks: usize, limit: u32 },

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Errors specific to model provider operations
#[derive(Debug, Error)]
pub enum LlmError {
    /// The router has nothing registered
    #[error("No LLM providers are registered")]
    NoProviders,

    /// No provider has a large enough context window
    #[error("No provider supports {required} tokens (largest context window is {largest})")]
    ContextLengthExceeded { required: u32, largest: u32 },

    /// Every eligible provider is above the cost ceiling
    #[error("No provider within cost ceiling {max_cost:.6} (cheapest is {cheapest:.6})")]
    CostCeilingExceeded { max_cost: f64, cheapest: f64 },

    /// API error
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Authentication error
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Network error
    #[error("Network error: {0}")]
    Network(String),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Timeout
    #[error("Request timed out")]
    Timeout,
}

/// Errors raised by the tool registry
#[derive(Debug, Error)]
pub enum ToolError {
    /// Tool is not registered
    #[error("Tool not found: {0}")]
    NotFound(String),

    /// Parameters did not match the tool's schema
    #[error("Invalid parameters for tool '{tool}': {reason}")]
    InvalidParameters { tool: String, reason: String },

    /// The tool itself failed
    #[error("Tool '{tool}' failed: {message}")]
    Execution { tool: String, message: String },
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else if err.is_connect() {
            LlmError::Network(format!("Connection error: {}", err))
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

/// Result type alias for agent operations
pub type AgentResult<T> = Result<T, AgentError>;

/// Result type alias for LLM operations
pub type LlmResult<T> = Result<T, LlmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_and_tool_errors_wrap_into_agent_error() {
        let err: AgentError = LlmError::ContextLengthExceeded {
            required: 200_000,
            largest: 128_000,
        }
        .into();
        assert!(matches!(err, AgentError::Llm(LlmError::ContextLengthExceeded { .. })));
        assert_eq!(
            err.to_string(),
            "LLM error: No provider supports 200000 tokens (largest context window is 128000)"
        );

        let err: AgentError = ToolError::NotFound("deploy".to_string()).into();
        assert_eq!(err.to_string(), "Tool error: Tool not found: deploy");
    }

    #[test]
    fn test_workflow_level_messages() {
        let err = AgentError::DependencyNotFound {
            task: "qa".to_string(),
            dependency: "build".to_string(),
        };
        assert_eq!(err.to_string(), "Task 'qa' depends on unknown task 'build'");
        assert_eq!(
            AgentError::ExecutionLimit { tasks: 3, limit: 2 }.to_string(),
            "Workflow has 3 tasks but the crew allows at most 2"
        );
    }
}
