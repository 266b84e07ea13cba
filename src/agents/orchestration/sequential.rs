//! Sequential process: one task at a time, outputs flow to dependents

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use super::lifecycle;
use crate::agents::core::Agent;
use crate::agents::domain::{ExecutionResult, Task};
use crate::agents::error::{AgentError, AgentResult};

/// Sequential process: tasks run in dependency order
pub struct SequentialProcess;

impl SequentialProcess {
    /// Run already ordered `tasks`, appending each result to `results`.
    ///
    /// A failed critical task stops the run with `CriticalTaskFailed`;
    /// everything collected up to that point stays in `results`.
    pub async fn execute(
        agents: &HashMap<String, Arc<Agent>>,
        tasks: &[Task],
        results: &mut Vec<ExecutionResult>,
        verbose: bool,
    ) -> AgentResult<()> {
        for task in tasks {
            let task = task.enriched(dependency_context(task, results));
            let result = run_task(agents, &task, verbose).await;
            let failed = result.is_failure();
            let reason = result.errors.join("; ");
            results.push(result);

            if failed && task.is_critical() {
                return Err(AgentError::CriticalTaskFailed {
                    task: task.id.clone(),
                    reason,
                });
            }
        }

        Ok(())
    }
}

/// Outputs of earlier successful tasks, keyed `task_<id>_output`.
///
/// A task that lists dependencies sees only those; a task without any sees
/// every earlier success.
pub fn dependency_context(task: &Task, prior: &[ExecutionResult]) -> Map<String, Value> {
    prior
        .iter()
        .filter(|r| r.is_success())
        .filter(|r| task.dependencies.is_empty() || task.dependencies.contains(&r.task_id))
        .map(|r| (Task::output_key(&r.task_id), r.output.clone()))
        .collect()
}

/// Hand `task` to its owner; a missing owner yields a failure result
pub(crate) async fn run_task(
    agents: &HashMap<String, Arc<Agent>>,
    task: &Task,
    verbose: bool,
) -> ExecutionResult {
    let Some(agent) = agents.get(&task.agent_id) else {
        let error = AgentError::NotFound(task.agent_id.clone());
        tracing::warn!(task = %task.id, "{}", error);
        return ExecutionResult::failure(&task.id, &task.agent_id, error.to_string());
    };

    lifecycle(verbose, &task.id, agent.id(), "Task started");
    let result = agent.execute_task(task).await;
    lifecycle(
        verbose,
        &task.id,
        agent.id(),
        if result.is_success() { "Task succeeded" } else { "Task failed" },
    );
    result
}
