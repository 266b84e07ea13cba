//! Units of work assigned to agents

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    /// Failure aborts a sequential workflow
    Critical,
}

/// A single unit of work owned by one agent
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Task {
    pub id: String,
    pub description: String,
    pub expected_output: String,
    /// Id of the agent that owns this task
    pub agent_id: String,
    /// Opaque bag; dependency outputs are injected here as `task_<id>_output`
    #[serde(default)]
    pub context: Map<String, Value>,
    /// Ids of tasks that must run first
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub priority: TaskPriority,
    /// Carried for callers; not enforced by the crews
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(
        id: impl Into<String>,
        description: impl Into<String>,
        expected_output: impl Into<String>,
        agent_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            expected_output: expected_output.into(),
            agent_id: agent_id.into(),
            context: Map::new(),
            dependencies: Vec::new(),
            priority: TaskPriority::default(),
            deadline: None,
        }
    }

    pub fn depends_on<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: Value) -> Self {
        self.context.insert(key.into(), value);
        self
    }

    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn is_critical(&self) -> bool {
        self.priority == TaskPriority::Critical
    }

    /// Copy of this task with `extra` merged over its context
    pub fn enriched(&self, extra: Map<String, Value>) -> Task {
        let mut task = self.clone();
        task.context.extend(extra);
        task
    }

    /// Context key under which this task's output is handed to dependents
    pub fn output_key(task_id: &str) -> String {
        format!("task_{}_output", task_id)
    }
}
