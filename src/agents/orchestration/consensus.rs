//! Consensus process: several agents attempt each task, first success wins

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use tracing::debug;

use super::lifecycle;
use super::sequential::{dependency_context, run_task};
use crate::agents::config::AgentRole;
use crate::agents::core::Agent;
use crate::agents::domain::{ExecutionResult, Task};
use crate::agents::error::AgentResult;

/// Most agents that attempt a single task
pub const MAX_CANDIDATES: usize = 3;

/// Consensus orchestrator: researchers and developers race on every task
pub struct ConsensusProcess;

impl ConsensusProcess {
    /// Researcher and developer agents in crew order, at most `MAX_CANDIDATES`
    pub fn candidates(agents: &[Arc<Agent>]) -> Vec<Arc<Agent>> {
        agents
            .iter()
            .filter(|a| matches!(a.config().role, AgentRole::Researcher | AgentRole::Developer))
            .take(MAX_CANDIDATES)
            .cloned()
            .collect()
    }

    /// First success in candidate order, else the first attempt
    pub fn pick(mut attempts: Vec<ExecutionResult>) -> Option<ExecutionResult> {
        match attempts.iter().position(ExecutionResult::is_success) {
            Some(i) => Some(attempts.swap_remove(i)),
            None if attempts.is_empty() => None,
            None => Some(attempts.swap_remove(0)),
        }
    }

    /// Run every task through the candidates. Failures never abort the run.
    pub async fn execute(
        ordered_agents: &[Arc<Agent>],
        agents: &HashMap<String, Arc<Agent>>,
        tasks: &[Task],
        results: &mut Vec<ExecutionResult>,
        verbose: bool,
    ) -> AgentResult<()> {
        let candidates = Self::candidates(ordered_agents);

        for task in tasks {
            let task = task.enriched(dependency_context(task, results));

            if candidates.len() < 2 {
                results.push(run_task(agents, &task, verbose).await);
                continue;
            }

            lifecycle(verbose, &task.id, &task.agent_id, "Task opened to consensus");
            let attempts = join_all(candidates.iter().map(|agent| agent.execute_task(&task))).await;
            let successes = attempts.iter().filter(|r| r.is_success()).count();

            if let Some(result) = Self::pick(attempts) {
                debug!(
                    task = %task.id,
                    winner = %result.agent_id,
                    successes,
                    attempts = candidates.len(),
                    "Consensus reached"
                );
                results.push(result);
            }
        }

        Ok(())
    }
}
