//! Execution results and artifacts

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Outcome of one task execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Success,
    Failure,
    Partial,
}

/// Kind of artifact produced by a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Code,
    Document,
    Design,
    Report,
    Data,
}

/// A named deliverable attached to an execution result
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Artifact {
    #[serde(rename = "type", alias = "kind")]
    pub kind: ArtifactKind,
    pub name: String,
    pub content: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Artifact {
    pub fn new(kind: ArtifactKind, name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            content: content.into(),
            metadata: Map::new(),
        }
    }
}

/// Result of running one task on one agent
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExecutionResult {
    pub task_id: String,
    /// Agent that actually produced this result
    pub agent_id: String,
    pub status: ExecutionStatus,
    pub output: Value,
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
    #[serde(default)]
    pub errors: Vec<String>,
    pub execution_time_ms: u64,
    pub tokens_used: u32,
    pub cost: f64,
}

impl ExecutionResult {
    pub fn success(task_id: impl Into<String>, agent_id: impl Into<String>, output: Value) -> Self {
        Self {
            task_id: task_id.into(),
            agent_id: agent_id.into(),
            status: ExecutionStatus::Success,
            output,
            artifacts: Vec::new(),
            errors: Vec::new(),
            execution_time_ms: 0,
            tokens_used: 0,
            cost: 0.0,
        }
    }

    pub fn failure(
        task_id: impl Into<String>,
        agent_id: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            agent_id: agent_id.into(),
            status: ExecutionStatus::Failure,
            output: Value::Null,
            artifacts: Vec::new(),
            errors: vec![error.into()],
            execution_time_ms: 0,
            tokens_used: 0,
            cost: 0.0,
        }
    }

    pub fn with_execution_time(mut self, ms: u64) -> Self {
        self.execution_time_ms = ms;
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == ExecutionStatus::Success
    }

    pub fn is_failure(&self) -> bool {
        self.status == ExecutionStatus::Failure
    }
}
