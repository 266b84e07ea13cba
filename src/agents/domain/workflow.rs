//! Workflows and their aggregated results

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::{ExecutionResult, Task};
use crate::agents::config::{AgentConfig, AgentRole};

/// Lifecycle status of a workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
    /// Some tasks failed, some did not
    Partial,
}

impl std::fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            WorkflowStatus::Pending => "pending",
            WorkflowStatus::Running => "running",
            WorkflowStatus::Completed => "completed",
            WorkflowStatus::Failed => "failed",
            WorkflowStatus::Partial => "partial",
        };
        f.write_str(s)
    }
}

/// A named set of tasks plus the agents expected to take part
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Workflow {
    pub id: String,
    pub name: String,
    pub description: String,
    pub tasks: Vec<Task>,
    /// Participating agents; their roles drive crew selection
    #[serde(default)]
    pub agents: Vec<AgentConfig>,
    #[serde(default)]
    pub status: WorkflowStatus,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Workflow {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        tasks: Vec<Task>,
        agents: Vec<AgentConfig>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            description: description.into(),
            tasks,
            agents,
            status: WorkflowStatus::Pending,
            metadata: Map::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn set_status(&mut self, status: WorkflowStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Roles of the participating agents
    pub fn roles(&self) -> HashSet<AgentRole> {
        self.agents.iter().map(|a| a.role).collect()
    }
}

/// Aggregated outcome of a workflow run
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkflowResult {
    pub workflow_id: String,
    pub status: WorkflowStatus,
    pub results: Vec<ExecutionResult>,
    pub total_cost: f64,
    pub total_tokens: u32,
    pub execution_time_ms: u64,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl WorkflowResult {
    pub fn result_for(&self, task_id: &str) -> Option<&ExecutionResult> {
        self.results.iter().find(|r| r.task_id == task_id)
    }

    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_failure()).count()
    }
}

/// Completed when nothing failed, failed when everything failed, partial otherwise
pub fn aggregate_status(results: &[ExecutionResult]) -> WorkflowStatus {
    let failures = results.iter().filter(|r| r.is_failure()).count();
    if failures == 0 {
        WorkflowStatus::Completed
    } else if failures == results.len() {
        WorkflowStatus::Failed
    } else {
        WorkflowStatus::Partial
    }
}
