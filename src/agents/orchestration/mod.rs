//! Crews: agents plus a process for running workflows
//!
//! Provides three ways to coordinate the agents of a crew:
//! - Sequential: tasks run one at a time in dependency order
//! - Hierarchical: a manager plans first, then tasks run sequentially
//! - Consensus: several agents attempt each task, first success wins

mod consensus;
mod graph;
mod hierarchical;
mod sequential;

pub use consensus::{ConsensusProcess, MAX_CANDIDATES};
pub use graph::resolve_order;
pub use hierarchical::{HierarchicalProcess, PLAN_METADATA_KEY};
pub use sequential::{dependency_context, SequentialProcess};

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::agents::config::{AgentConfig, CrewConfig, MemoryLimits, ProcessType};
use crate::agents::core::Agent;
use crate::agents::domain::{aggregate_status, ExecutionResult, Workflow, WorkflowResult, WorkflowStatus};
use crate::agents::error::{AgentError, AgentResult};
use crate::agents::llm::ModelRouter;
use crate::agents::tools::ToolRegistry;

/// Task lifecycle logging; `verbose` crews log at info
pub(crate) fn lifecycle(verbose: bool, task: &str, agent: &str, message: &str) {
    if verbose {
        info!(task, agent, "{}", message);
    } else {
        debug!(task, agent, "{}", message);
    }
}

/// Aggregate statistics for a crew
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrewStats {
    pub agent_count: usize,
    pub average_memory_entries: f64,
    pub workflows_by_status: BTreeMap<String, usize>,
    pub total_workflows: usize,
}

/// A set of agents that executes workflows with one process
pub struct Crew {
    id: String,
    config: RwLock<CrewConfig>,
    agents: RwLock<HashMap<String, Arc<Agent>>>,
    router: Arc<ModelRouter>,
    tools: ToolRegistry,
    limits: MemoryLimits,
    workflows: RwLock<HashMap<String, Workflow>>,
}

impl Crew {
    /// Build one agent per configured agent; each gets the subset of
    /// `tools` its config names
    pub fn new(
        config: CrewConfig,
        router: Arc<ModelRouter>,
        tools: &ToolRegistry,
        limits: MemoryLimits,
    ) -> Self {
        let agents = config
            .agents
            .iter()
            .map(|cfg| {
                let agent = build_agent(cfg, config.memory_enabled, &router, tools, limits);
                (cfg.id.clone(), Arc::new(agent))
            })
            .collect();

        Self {
            id: config.id.clone(),
            config: RwLock::new(config),
            agents: RwLock::new(agents),
            router,
            tools: tools.clone(),
            limits,
            workflows: RwLock::new(HashMap::new()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub async fn config(&self) -> CrewConfig {
        self.config.read().await.clone()
    }

    pub async fn process(&self) -> ProcessType {
        self.config.read().await.process
    }

    pub async fn agent(&self, id: &str) -> Option<Arc<Agent>> {
        self.agents.read().await.get(id).cloned()
    }

    /// Agent ids in crew order
    pub async fn agent_ids(&self) -> Vec<String> {
        self.config.read().await.agents.iter().map(|a| a.id.clone()).collect()
    }

    /// Agents in crew order
    pub async fn ordered_agents(&self) -> Vec<Arc<Agent>> {
        let config = self.config.read().await;
        let agents = self.agents.read().await;
        config
            .agents
            .iter()
            .filter_map(|cfg| agents.get(&cfg.id).cloned())
            .collect()
    }

    /// Add an agent, replacing any agent with the same id
    pub async fn add_agent(&self, agent_config: AgentConfig) -> AgentResult<()> {
        agent_config.validate()?;

        let mut config = self.config.write().await;
        let agent = build_agent(
            &agent_config,
            config.memory_enabled,
            &self.router,
            &self.tools,
            self.limits,
        );
        self.agents
            .write()
            .await
            .insert(agent_config.id.clone(), Arc::new(agent));

        match config.agents.iter_mut().find(|a| a.id == agent_config.id) {
            Some(existing) => *existing = agent_config,
            None => config.agents.push(agent_config),
        }
        Ok(())
    }

    pub async fn remove_agent(&self, id: &str) -> bool {
        let mut config = self.config.write().await;
        config.agents.retain(|a| a.id != id);
        self.agents.write().await.remove(id).is_some()
    }

    /// A workflow this crew has executed
    pub async fn workflow(&self, id: &str) -> Option<Workflow> {
        self.workflows.read().await.get(id).cloned()
    }

    pub async fn stats(&self) -> CrewStats {
        let agents: Vec<Arc<Agent>> = self.agents.read().await.values().cloned().collect();
        let mut memory_entries = 0usize;
        for agent in &agents {
            memory_entries += agent.memory_entry_count().await;
        }
        let average_memory_entries = if agents.is_empty() {
            0.0
        } else {
            memory_entries as f64 / agents.len() as f64
        };

        let workflows = self.workflows.read().await;
        let mut workflows_by_status = BTreeMap::new();
        for workflow in workflows.values() {
            *workflows_by_status.entry(workflow.status.to_string()).or_insert(0) += 1;
        }

        CrewStats {
            agent_count: agents.len(),
            average_memory_entries,
            workflows_by_status,
            total_workflows: workflows.len(),
        }
    }

    /// Run `workflow` to completion.
    ///
    /// Never fails: workflow-level errors (cycles, a failed critical task, a
    /// failed plan, too many tasks) mark the workflow failed and are reported
    /// in `errors` next to whatever results were collected.
    pub async fn execute_workflow(&self, mut workflow: Workflow) -> WorkflowResult {
        let start = Instant::now();
        let config = self.config().await;

        workflow.set_status(WorkflowStatus::Running);
        if config.verbose {
            info!(crew = %self.id, workflow = %workflow.id, process = %config.process, tasks = workflow.tasks.len(), "Workflow started");
        } else {
            debug!(crew = %self.id, workflow = %workflow.id, process = %config.process, "Workflow started");
        }

        let mut results = Vec::new();
        let (status, errors) = match self.dispatch(&config, &mut workflow, &mut results).await {
            Ok(()) => (aggregate_status(&results), Vec::new()),
            Err(e) => {
                warn!(crew = %self.id, workflow = %workflow.id, "Workflow failed: {}", e);
                (WorkflowStatus::Failed, vec![e.to_string()])
            }
        };
        workflow.set_status(status);

        let result = WorkflowResult {
            workflow_id: workflow.id.clone(),
            status,
            total_cost: results.iter().map(|r| r.cost).sum(),
            total_tokens: results.iter().map(|r| r.tokens_used).sum(),
            execution_time_ms: start.elapsed().as_millis() as u64,
            errors,
            results,
        };

        info!(
            crew = %self.id,
            workflow = %workflow.id,
            status = %status,
            succeeded = result.success_count(),
            failed = result.failure_count(),
            "Workflow finished"
        );

        self.workflows
            .write()
            .await
            .insert(workflow.id.clone(), workflow);
        result
    }

    async fn dispatch(
        &self,
        config: &CrewConfig,
        workflow: &mut Workflow,
        results: &mut Vec<ExecutionResult>,
    ) -> AgentResult<()> {
        if workflow.tasks.len() > config.max_execution as usize {
            return Err(AgentError::ExecutionLimit {
                tasks: workflow.tasks.len(),
                limit: config.max_execution,
            });
        }

        let tasks = resolve_order(&workflow.tasks)?;
        let ordered_agents = self.ordered_agents().await;
        let agents = self.agents.read().await.clone();

        match config.process {
            ProcessType::Sequential => {
                SequentialProcess::execute(&agents, &tasks, results, config.verbose).await
            }
            ProcessType::Hierarchical => {
                HierarchicalProcess::execute(
                    &ordered_agents,
                    &agents,
                    &workflow.id,
                    &mut workflow.metadata,
                    &tasks,
                    results,
                    config.verbose,
                )
                .await
            }
            ProcessType::Consensus => {
                ConsensusProcess::execute(&ordered_agents, &agents, &tasks, results, config.verbose)
                    .await
            }
        }
    }
}

impl std::fmt::Debug for Crew {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Crew").field("id", &self.id).finish()
    }
}

fn build_agent(
    config: &AgentConfig,
    crew_memory: bool,
    router: &Arc<ModelRouter>,
    tools: &ToolRegistry,
    limits: MemoryLimits,
) -> Agent {
    let mut config = config.clone();
    config.memory_enabled &= crew_memory;
    let tools = tools.subset(&config.tools);
    Agent::new(config, router.clone(), tools, limits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::config::AgentRole;
    use crate::agents::domain::{Task, TaskPriority};
    use crate::agents::llm::MockProvider;

    fn agents() -> Vec<AgentConfig> {
        vec![
            AgentConfig::new("planner", "Pat Planner", AgentRole::Planner),
            AgentConfig::new("dev", "Dana Developer", AgentRole::Developer).with_tools(["qa_testing"]),
        ]
    }

    fn crew(process: ProcessType, provider: MockProvider) -> Crew {
        let router = Arc::new(ModelRouter::with_mock(provider));
        let tools = ToolRegistry::with_builtins(router.clone(), &Default::default());
        Crew::new(
            CrewConfig::new("crew", "Crew", agents(), process),
            router,
            &tools,
            MemoryLimits::default(),
        )
    }

    fn workflow(tasks: Vec<Task>) -> Workflow {
        Workflow::new("wf", "test workflow", tasks, agents())
    }

    #[tokio::test]
    async fn test_agents_get_their_tool_subset() {
        let crew = crew(ProcessType::Sequential, MockProvider::new());
        assert_eq!(crew.agent("dev").await.unwrap().tool_names().await, vec!["qa_testing"]);
        assert!(crew.agent("planner").await.unwrap().tool_names().await.is_empty());
        assert_eq!(crew.agent_ids().await, vec!["planner", "dev"]);
    }

    #[tokio::test]
    async fn test_all_success_completes() {
        let crew = crew(ProcessType::Sequential, MockProvider::new());
        let wf = workflow(vec![
            Task::new("a", "Outline the page", "outline", "planner"),
            Task::new("b", "Build the page", "code", "dev").depends_on(["a"]),
        ]);
        let id = wf.id.clone();

        let result = crew.execute_workflow(wf).await;

        assert_eq!(result.status, WorkflowStatus::Completed);
        assert_eq!(result.results.len(), 2);
        assert!(result.total_tokens > 0);
        let expected_cost: f64 = result.results.iter().map(|r| r.cost).sum();
        assert!((result.total_cost - expected_cost).abs() < 1e-12);
        assert_eq!(crew.workflow(&id).await.unwrap().status, WorkflowStatus::Completed);
    }

    #[tokio::test]
    async fn test_partial_and_failed_status() {
        let crew = crew(ProcessType::Sequential, MockProvider::new().with_failure("Build"));
        let partial = crew
            .execute_workflow(workflow(vec![
                Task::new("a", "Outline the page", "outline", "planner"),
                Task::new("b", "Build the page", "code", "dev"),
            ]))
            .await;
        assert_eq!(partial.status, WorkflowStatus::Partial);

        let failed = crew
            .execute_workflow(workflow(vec![Task::new("b", "Build the page", "code", "dev")]))
            .await;
        assert_eq!(failed.status, WorkflowStatus::Failed);
        assert!(failed.errors.is_empty());
    }

    #[tokio::test]
    async fn test_cycle_runs_nothing() {
        let provider = Arc::new(MockProvider::new());
        let mut router = ModelRouter::new(crate::config::ProviderMode::Mock);
        router.register(provider.clone());
        let crew = Crew::new(
            CrewConfig::new("crew", "Crew", agents(), ProcessType::Sequential),
            Arc::new(router),
            &ToolRegistry::new(),
            MemoryLimits::default(),
        );

        let result = crew
            .execute_workflow(workflow(vec![
                Task::new("a", "A", "x", "dev").depends_on(["b"]),
                Task::new("b", "B", "x", "dev").depends_on(["a"]),
            ]))
            .await;

        assert_eq!(result.status, WorkflowStatus::Failed);
        assert!(result.results.is_empty());
        assert!(result.errors[0].contains("Circular dependency"));
        assert!(provider.recorded_prompts().is_empty());
    }

    #[tokio::test]
    async fn test_critical_failure_keeps_partial_results() {
        let crew = crew(ProcessType::Sequential, MockProvider::new().with_failure("Build"));
        let result = crew
            .execute_workflow(workflow(vec![
                Task::new("a", "Outline the page", "outline", "planner"),
                Task::new("b", "Build the page", "code", "dev").with_priority(TaskPriority::Critical),
                Task::new("c", "Review the page", "notes", "planner"),
            ]))
            .await;

        assert_eq!(result.status, WorkflowStatus::Failed);
        assert_eq!(result.results.len(), 2);
        assert!(result.errors[0].contains("Critical task 'b'"));
    }

    #[tokio::test]
    async fn test_execution_limit() {
        let router = Arc::new(ModelRouter::mock());
        let mut config = CrewConfig::new("crew", "Crew", agents(), ProcessType::Sequential);
        config.max_execution = 1;
        let crew = Crew::new(config, router, &ToolRegistry::new(), MemoryLimits::default());

        let result = crew
            .execute_workflow(workflow(vec![
                Task::new("a", "A", "x", "dev"),
                Task::new("b", "B", "x", "dev"),
            ]))
            .await;

        assert_eq!(result.status, WorkflowStatus::Failed);
        assert!(result.results.is_empty());
        assert!(result.errors[0].contains("at most 1"));
    }

    #[tokio::test]
    async fn test_hierarchical_records_plan() {
        let crew = crew(ProcessType::Hierarchical, MockProvider::new());
        let wf = workflow(vec![Task::new("a", "Build the page", "code", "dev")]);
        let id = wf.id.clone();

        let result = crew.execute_workflow(wf).await;

        assert_eq!(result.status, WorkflowStatus::Completed);
        assert_eq!(result.results.len(), 1);
        let stored = crew.workflow(&id).await.unwrap();
        assert_eq!(stored.metadata[PLAN_METADATA_KEY]["manager"], "planner");
    }

    #[tokio::test]
    async fn test_add_remove_agent_and_stats() {
        let crew = crew(ProcessType::Sequential, MockProvider::new());
        crew.add_agent(AgentConfig::new("qa", "Quinn", AgentRole::QaTester))
            .await
            .unwrap();
        assert!(crew
            .add_agent(AgentConfig::new("bad", "Bad", AgentRole::QaTester).with_temperature(3.0))
            .await
            .is_err());
        assert_eq!(crew.agent_ids().await, vec!["planner", "dev", "qa"]);

        crew.execute_workflow(workflow(vec![Task::new("a", "Check the page", "report", "qa")]))
            .await;

        let stats = crew.stats().await;
        assert_eq!(stats.agent_count, 3);
        assert!((stats.average_memory_entries - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(stats.workflows_by_status.get("completed"), Some(&1));
        assert_eq!(stats.total_workflows, 1);

        assert!(crew.remove_agent("qa").await);
        assert!(!crew.remove_agent("qa").await);
        assert_eq!(crew.agent_ids().await, vec!["planner", "dev"]);
    }

    #[tokio::test]
    async fn test_crew_memory_switch_disables_agent_memory() {
        let router = Arc::new(ModelRouter::mock());
        let mut config = CrewConfig::new("crew", "Crew", agents(), ProcessType::Sequential);
        config.memory_enabled = false;
        let crew = Crew::new(config, router, &ToolRegistry::new(), MemoryLimits::default());

        crew.execute_workflow(workflow(vec![Task::new("a", "A", "x", "dev")]))
            .await;

        assert_eq!(crew.stats().await.average_memory_entries, 0.0);
    }
}
