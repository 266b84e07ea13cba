//! Hierarchical process: a manager plans, then the crew runs sequentially

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Map, Value};
use tracing::info;

use super::sequential::SequentialProcess;
use crate::agents::config::AgentRole;
use crate::agents::core::Agent;
use crate::agents::domain::{ExecutionResult, Task, TaskPriority};
use crate::agents::error::{AgentError, AgentResult};

/// Workflow metadata key holding the manager's plan
pub const PLAN_METADATA_KEY: &str = "hierarchical_plan";

/// Hierarchical orchestrator: manager plans, workers execute
pub struct HierarchicalProcess;

impl HierarchicalProcess {
    /// First planner in crew order, else the first agent
    pub fn manager(agents: &[Arc<Agent>]) -> Option<&Arc<Agent>> {
        agents
            .iter()
            .find(|a| a.config().role == AgentRole::Planner)
            .or_else(|| agents.first())
    }

    /// Synthetic task asking the manager to plan the whole workflow
    pub fn planning_task(workflow_id: &str, manager_id: &str, tasks: &[Task]) -> Task {
        let listing = tasks
            .iter()
            .map(|t| format!("- {} ({}): {}", t.id, t.agent_id, t.description))
            .collect::<Vec<_>>()
            .join("\n");

        Task::new(
            format!("{}_plan", workflow_id),
            format!("Plan and coordinate the execution of these tasks:\n{}", listing),
            "An execution plan covering every task, its owner and its order",
            manager_id,
        )
        .with_priority(TaskPriority::High)
    }

    /// Plan with the manager, record the plan in `metadata`, then run the
    /// tasks sequentially. A failed plan aborts before any task runs.
    pub async fn execute(
        ordered_agents: &[Arc<Agent>],
        agents: &HashMap<String, Arc<Agent>>,
        workflow_id: &str,
        metadata: &mut Map<String, Value>,
        tasks: &[Task],
        results: &mut Vec<ExecutionResult>,
        verbose: bool,
    ) -> AgentResult<()> {
        let manager = Self::manager(ordered_agents)
            .ok_or_else(|| AgentError::PlanningFailed("crew has no agents".to_string()))?;

        let planning = Self::planning_task(workflow_id, manager.id(), tasks);
        let plan = manager.execute_task(&planning).await;
        if plan.is_failure() {
            return Err(AgentError::PlanningFailed(plan.errors.join("; ")));
        }

        info!(manager = %manager.id(), workflow = %workflow_id, "Manager produced a plan");
        metadata.insert(
            PLAN_METADATA_KEY.to_string(),
            json!({"manager": manager.id(), "plan": plan.output}),
        );

        SequentialProcess::execute(agents, tasks, results, verbose).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::config::{AgentConfig, MemoryLimits};
    use crate::agents::llm::{MockProvider, ModelRouter};
    use crate::agents::tools::ToolRegistry;

    fn crew(provider: MockProvider, roles: &[(&str, AgentRole)]) -> Vec<Arc<Agent>> {
        let router = Arc::new(ModelRouter::with_mock(provider));
        roles
            .iter()
            .map(|(id, role)| {
                Arc::new(Agent::new(
                    AgentConfig::new(*id, *id, *role),
                    router.clone(),
                    ToolRegistry::new(),
                    MemoryLimits::default(),
                ))
            })
            .collect()
    }

    fn by_id(agents: &[Arc<Agent>]) -> HashMap<String, Arc<Agent>> {
        agents.iter().map(|a| (a.id().to_string(), a.clone())).collect()
    }

    #[test]
    fn test_manager_selection() {
        let agents = crew(
            MockProvider::new(),
            &[("dev", AgentRole::Developer), ("boss", AgentRole::Planner)],
        );
        assert_eq!(HierarchicalProcess::manager(&agents).unwrap().id(), "boss");

        let agents = crew(MockProvider::new(), &[("dev", AgentRole::Developer)]);
        assert_eq!(HierarchicalProcess::manager(&agents).unwrap().id(), "dev");
        assert!(HierarchicalProcess::manager(&[]).is_none());
    }

    #[test]
    fn test_planning_task_lists_every_task() {
        let tasks = vec![
            Task::new("a", "Audit performance", "report", "opt"),
            Task::new("b", "Fix regressions", "patch", "dbg"),
        ];
        let planning = HierarchicalProcess::planning_task("wf", "boss", &tasks);
        assert_eq!(planning.id, "wf_plan");
        assert_eq!(planning.agent_id, "boss");
        assert!(planning.description.contains("- a (opt): Audit performance"));
        assert!(planning.description.contains("- b (dbg): Fix regressions"));
    }

    #[tokio::test]
    async fn test_plan_is_recorded_and_tasks_run() {
        let agents = crew(
            MockProvider::new(),
            &[("boss", AgentRole::Planner), ("dev", AgentRole::Developer)],
        );
        let tasks = vec![Task::new("a", "Refactor the header", "code", "dev")];
        let mut metadata = Map::new();
        let mut results = Vec::new();

        HierarchicalProcess::execute(&agents, &by_id(&agents), "wf", &mut metadata, &tasks, &mut results, false)
            .await
            .unwrap();

        assert_eq!(metadata[PLAN_METADATA_KEY]["manager"], "boss");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].task_id, "a");
    }

    #[tokio::test]
    async fn test_failed_plan_runs_nothing() {
        let agents = crew(
            MockProvider::new().with_failure("coordinate"),
            &[("boss", AgentRole::Planner), ("dev", AgentRole::Developer)],
        );
        let tasks = vec![Task::new("a", "Refactor the header", "code", "dev")];
        let mut metadata = Map::new();
        let mut results = Vec::new();

        let err = HierarchicalProcess::execute(&agents, &by_id(&agents), "wf", &mut metadata, &tasks, &mut results, false)
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::PlanningFailed(_)));
        assert!(results.is_empty());
        assert!(metadata.is_empty());
    }
}
