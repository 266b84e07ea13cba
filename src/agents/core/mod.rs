//! The task-executing agent
//!
//! Each task runs through a fixed pipeline: build context, plan, execute
//! the plan's steps, synthesize a final answer, update memory. Failures
//! inside a single step are recorded and execution continues; only a
//! failed synthesis fails the task, and even then `execute_task` returns a
//! failure result instead of an error.

pub mod prompts;

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::agents::config::{AgentConfig, MemoryLimits};
use crate::agents::domain::{Artifact, ExecutionResult, Plan, PlanStep, Task};
use crate::agents::error::{AgentError, AgentResult};
use crate::agents::llm::{Complexity, GenerationConfig, ModelRouter, RoutingRequirements};
use crate::agents::memory::{AgentMemory, CapitalizedPhraseExtractor, EntityExtractor};
use crate::agents::tools::{Tool, ToolRegistry};

/// Synthesis runs cooler than the agent's own temperature
const SYNTHESIS_TEMPERATURE_FACTOR: f32 = 0.8;

/// Where an agent is in its pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentState {
    Idle,
    BuildingContext,
    Planning,
    ExecutingSteps,
    Synthesizing,
    UpdatingMemory,
    Done,
    Failed,
}

/// Step outputs plus what they cost
#[derive(Debug, Default)]
struct StepOutcome {
    outputs: Vec<Value>,
    artifacts: Vec<Artifact>,
    tokens_used: u32,
    cost: f64,
}

/// Successful pipeline result before it becomes an `ExecutionResult`
struct TaskOutcome {
    output: Value,
    artifacts: Vec<Artifact>,
    tokens_used: u32,
    cost: f64,
}

/// A configured worker that executes tasks with a model router and tools
pub struct Agent {
    config: AgentConfig,
    router: Arc<ModelRouter>,
    tools: RwLock<ToolRegistry>,
    memory: RwLock<AgentMemory>,
    extractor: Arc<dyn EntityExtractor>,
    state: RwLock<AgentState>,
}

impl Agent {
    pub fn new(
        config: AgentConfig,
        router: Arc<ModelRouter>,
        tools: ToolRegistry,
        limits: MemoryLimits,
    ) -> Self {
        Self {
            config,
            router,
            tools: RwLock::new(tools),
            memory: RwLock::new(AgentMemory::new(limits)),
            extractor: Arc::new(CapitalizedPhraseExtractor),
            state: RwLock::new(AgentState::Idle),
        }
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn EntityExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn id(&self) -> &str {
        &self.config.id
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub async fn state(&self) -> AgentState {
        *self.state.read().await
    }

    async fn set_state(&self, state: AgentState) {
        *self.state.write().await = state;
    }

    pub async fn add_tool(&self, tool: Arc<dyn Tool>) {
        self.tools.write().await.register(tool);
    }

    pub async fn remove_tool(&self, name: &str) -> bool {
        self.tools.write().await.remove(name).is_some()
    }

    pub async fn tool_names(&self) -> Vec<String> {
        self.tools.read().await.names()
    }

    /// Copy of the agent's memory
    pub async fn memory_snapshot(&self) -> AgentMemory {
        self.memory.read().await.clone()
    }

    pub async fn memory_entry_count(&self) -> usize {
        self.memory.read().await.entry_count()
    }

    pub async fn clear_memory(&self) {
        self.memory.write().await.clear();
    }

    fn requirements(&self) -> RoutingRequirements {
        RoutingRequirements::default()
            .with_complexity(Complexity::Medium)
            .with_preferred_provider(self.config.model_provider.to_string())
    }

    fn generation_config(&self) -> GenerationConfig {
        GenerationConfig::default()
            .with_temperature(self.config.temperature)
            .with_max_tokens(self.config.max_tokens)
    }

    /// Run `task` to completion; errors become a failure result
    pub async fn execute_task(&self, task: &Task) -> ExecutionResult {
        let start = Instant::now();
        debug!(agent = %self.config.id, task = %task.id, "Executing task");

        let result = match self.run_pipeline(task).await {
            Ok(outcome) => {
                self.set_state(AgentState::Done).await;
                let mut result = ExecutionResult::success(&task.id, &self.config.id, outcome.output);
                result.artifacts = outcome.artifacts;
                result.tokens_used = outcome.tokens_used;
                result.cost = outcome.cost;
                result
            }
            Err(e) => {
                warn!(agent = %self.config.id, task = %task.id, "Task failed: {}", e);
                if self.config.memory_enabled {
                    self.update_memory(task, &Value::Null, false).await;
                }
                self.set_state(AgentState::Failed).await;
                ExecutionResult::failure(&task.id, &self.config.id, e.to_string())
            }
        };

        result.with_execution_time(start.elapsed().as_millis() as u64)
    }

    async fn run_pipeline(&self, task: &Task) -> AgentResult<TaskOutcome> {
        self.set_state(AgentState::BuildingContext).await;
        let context = self.build_context(task).await;

        self.set_state(AgentState::Planning).await;
        let (plan, plan_tokens, plan_cost) = self.plan(&context).await;
        let plan = plan.unwrap_or_else(|| Plan::fallback(task));
        debug!(agent = %self.config.id, steps = plan.len(), "Plan ready");

        self.set_state(AgentState::ExecutingSteps).await;
        let steps = self.execute_steps(task, &plan).await;

        self.set_state(AgentState::Synthesizing).await;
        let synthesis = self.synthesize(task, &steps.outputs).await?;

        let output = Value::String(synthesis.0);
        if self.config.memory_enabled {
            self.set_state(AgentState::UpdatingMemory).await;
            self.update_memory(task, &output, true).await;
        }

        Ok(TaskOutcome {
            output,
            artifacts: steps.artifacts,
            tokens_used: plan_tokens + steps.tokens_used + synthesis.1,
            cost: plan_cost + steps.cost + synthesis.2,
        })
    }

    /// Role, goal, task, recalled memories and tool list as one prompt block
    pub async fn build_context(&self, task: &Task) -> String {
        let memories: Vec<String> = {
            let memory = self.memory.read().await;
            memory
                .recall_relevant(&task.description)
                .into_iter()
                .map(|m| format!("{}: {}", m.context, m.data))
                .collect()
        };
        let tools = self.tools.read().await.definitions();

        prompts::context_prompt(&self.config, task, &memories, &tools)
    }

    /// Ask the model for a plan; `None` when the call fails or the answer
    /// does not parse
    async fn plan(&self, context: &str) -> (Option<Plan>, u32, f64) {
        let prompt = prompts::plan_prompt(context);
        match self
            .router
            .generate(&prompt, &self.requirements(), &self.generation_config())
            .await
        {
            Ok(routed) => {
                let plan = Plan::parse(&routed.text);
                if plan.is_none() {
                    debug!(agent = %self.config.id, "Plan answer did not parse; using fallback");
                }
                (plan, routed.tokens_used, routed.cost)
            }
            Err(e) => {
                warn!(agent = %self.config.id, "Planning failed, using fallback plan: {}", e);
                (None, 0, 0.0)
            }
        }
    }

    async fn execute_steps(&self, task: &Task, plan: &Plan) -> StepOutcome {
        let tools = self.tools.read().await.clone();
        let mut outcome = StepOutcome::default();

        for step in &plan.steps {
            match self.execute_step(task, step, &tools, &outcome.outputs).await {
                Ok((output, tokens, cost)) => {
                    if let Some(artifact) = output
                        .get("artifact")
                        .and_then(|a| serde_json::from_value::<Artifact>(a.clone()).ok())
                    {
                        outcome.artifacts.push(artifact);
                    }
                    if self.config.memory_enabled {
                        self.memory.write().await.record_step(&step.action, output.clone());
                    }
                    outcome.tokens_used += tokens;
                    outcome.cost += cost;
                    outcome.outputs.push(json!({"step": step.action, "output": output}));
                }
                Err(e) => {
                    warn!(agent = %self.config.id, step = %step.action, "Step failed: {}", e);
                    outcome
                        .outputs
                        .push(json!({"step": step.action, "error": e.to_string()}));
                }
            }
        }

        outcome
    }

    /// Tool steps cost nothing here; model steps report their usage
    async fn execute_step(
        &self,
        task: &Task,
        step: &PlanStep,
        tools: &ToolRegistry,
        previous: &[Value],
    ) -> AgentResult<(Value, u32, f64)> {
        if let Some(tool) = step.tool.as_deref().filter(|name| tools.contains(name)) {
            let output = tools
                .invoke(tool, Value::Object(step.parameters.clone()))
                .await?;
            return Ok((output, 0, 0.0));
        }

        let prompt = prompts::step_prompt(&self.config, task, step, previous);
        let routed = self
            .router
            .generate(&prompt, &self.requirements(), &self.generation_config())
            .await?;
        Ok((Value::String(routed.text), routed.tokens_used, routed.cost))
    }

    async fn synthesize(&self, task: &Task, outputs: &[Value]) -> AgentResult<(String, u32, f64)> {
        let prompt = prompts::synthesis_prompt(&self.config, task, outputs);
        let config = self
            .generation_config()
            .with_temperature(self.config.temperature * SYNTHESIS_TEMPERATURE_FACTOR);

        let routed = self
            .router
            .generate(&prompt, &self.requirements(), &config)
            .await
            .map_err(AgentError::from)?;
        Ok((routed.text, routed.tokens_used, routed.cost))
    }

    async fn update_memory(&self, task: &Task, output: &Value, success: bool) {
        let mut memory = self.memory.write().await;
        memory.remember(
            format!("Task: {}", task.description),
            json!({"task_id": task.id, "output": output, "success": success}),
        );

        let output_text = match output {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        };
        let text = format!("{} {}", task.description, output_text);
        memory.observe_entities(&text, self.extractor.as_ref());
        info!(agent = %self.config.id, entries = memory.entry_count(), "Memory updated");
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("id", &self.config.id)
            .field("role", &self.config.role)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::config::AgentRole;
    use crate::agents::domain::ExecutionStatus;
    use crate::agents::llm::MockProvider;
    use async_trait::async_trait;

    struct FlakyTool;

    #[async_trait]
    impl Tool for FlakyTool {
        fn name(&self) -> &str {
            "flaky"
        }

        fn description(&self) -> &str {
            "Fails every time"
        }

        fn parameters(&self) -> Value {
            json!({"type": "object"})
        }

        async fn execute(&self, _params: Value) -> anyhow::Result<Value> {
            anyhow::bail!("upstream timeout")
        }
    }

    struct ArtifactTool;

    #[async_trait]
    impl Tool for ArtifactTool {
        fn name(&self) -> &str {
            "make_artifact"
        }

        fn description(&self) -> &str {
            "Returns a code artifact"
        }

        fn parameters(&self) -> Value {
            json!({"type": "object"})
        }

        async fn execute(&self, _params: Value) -> anyhow::Result<Value> {
            Ok(json!({"artifact": {"type": "code", "name": "App.tsx", "content": "x"}}))
        }
    }

    fn agent_with(provider: MockProvider) -> Agent {
        let config = AgentConfig::new("dev", "Dana Developer", AgentRole::Developer);
        let mut tools = ToolRegistry::new();
        tools.register(Arc::new(FlakyTool));
        tools.register(Arc::new(ArtifactTool));
        Agent::new(
            config,
            Arc::new(ModelRouter::with_mock(provider)),
            tools,
            MemoryLimits::default(),
        )
    }

    fn task() -> Task {
        Task::new("t1", "Build the Acme Store homepage", "Working page", "dev")
    }

    #[tokio::test]
    async fn test_step_failure_is_isolated() {
        let plan = json!({"steps": [
            {"action": "fetch", "tool": "flaky", "parameters": {}},
            {"action": "write_code", "tool": null}
        ]})
        .to_string();
        let agent = agent_with(MockProvider::scripted([plan.as_str(), "step two done", "final answer"]));

        let result = agent.execute_task(&task()).await;

        assert_eq!(result.status, ExecutionStatus::Success);
        assert_eq!(result.output, json!("final answer"));
        assert!(result.errors.is_empty());

        let memory = agent.memory_snapshot().await;
        assert_eq!(memory.step_output("write_code"), Some(&json!("step two done")));
        assert!(memory.step_output("fetch").is_none());
        assert_eq!(agent.state().await, AgentState::Done);
    }

    #[tokio::test]
    async fn test_synthesis_failure_becomes_failure_result() {
        let agent = agent_with(MockProvider::new().with_failure("Synthesize"));
        let result = agent.execute_task(&task()).await;

        assert_eq!(result.status, ExecutionStatus::Failure);
        assert_eq!(result.output, Value::Null);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(agent.state().await, AgentState::Failed);

        let memory = agent.memory_snapshot().await;
        assert_eq!(memory.long_term()[0].data["success"], json!(false));
    }

    #[tokio::test]
    async fn test_unparseable_plan_uses_fallback() {
        let provider = MockProvider::scripted(["no json here", "did the work", "final"]);
        let agent = agent_with(provider);
        let result = agent.execute_task(&task()).await;

        assert!(result.is_success());
        let memory = agent.memory_snapshot().await;
        assert_eq!(memory.step_output("execute_task"), Some(&json!("did the work")));
    }

    #[tokio::test]
    async fn test_tool_steps_cost_nothing_and_collect_artifacts() {
        let plan = json!({"steps": [{"action": "emit", "tool": "make_artifact"}]}).to_string();
        let provider = Arc::new(MockProvider::scripted([plan.as_str(), "final"]));
        let mut router = ModelRouter::new(crate::config::ProviderMode::Mock);
        router.register(provider.clone());
        let mut tools = ToolRegistry::new();
        tools.register(Arc::new(ArtifactTool));
        let agent = Agent::new(
            AgentConfig::new("dev", "Dana Developer", AgentRole::Developer),
            Arc::new(router),
            tools,
            MemoryLimits::default(),
        );

        let result = agent.execute_task(&task()).await;

        assert_eq!(result.artifacts.len(), 1);
        assert_eq!(result.artifacts[0].name, "App.tsx");
        // planning and synthesis are the only model calls
        assert_eq!(provider.recorded_prompts().len(), 2);
        assert!(result.tokens_used > 0);
    }

    #[tokio::test]
    async fn test_unknown_tool_falls_back_to_model_call() {
        let plan = json!({"steps": [{"action": "lookup", "tool": "not_registered"}]}).to_string();
        let agent = agent_with(MockProvider::scripted([plan.as_str(), "model answered", "final"]));

        agent.execute_task(&task()).await;

        let memory = agent.memory_snapshot().await;
        assert_eq!(memory.step_output("lookup"), Some(&json!("model answered")));
    }

    #[tokio::test]
    async fn test_memory_feeds_next_context() {
        let agent = agent_with(MockProvider::new());
        agent.execute_task(&task()).await;

        let memory = agent.memory_snapshot().await;
        assert_eq!(memory.entry_count(), 1);
        assert_eq!(memory.long_term()[0].context, "Task: Build the Acme Store homepage");
        assert!(memory.entity("Final").is_some());

        let context = agent.build_context(&task()).await;
        assert!(context.contains("Relevant memories"));
        assert!(context.contains("Task: Build the Acme Store homepage"));
    }

    #[tokio::test]
    async fn test_entities_come_from_description_and_output() {
        let agent = agent_with(MockProvider::new());
        agent.execute_task(&task()).await;

        let memory = agent.memory_snapshot().await;
        // named only in the task description
        assert_eq!(memory.entity("Acme Store").map(|e| e.mentions), Some(1));
        // named only in the synthesized output
        assert!(memory.entity("Final").is_some());
    }

    #[tokio::test]
    async fn test_failed_task_still_records_description_entities() {
        let agent = agent_with(MockProvider::new().with_failure("Synthesize"));
        let result = agent.execute_task(&task()).await;
        assert!(result.is_failure());

        let memory = agent.memory_snapshot().await;
        assert!(memory.entity("Acme Store").is_some());
    }

    #[tokio::test]
    async fn test_memory_disabled_records_nothing() {
        let config = AgentConfig::new("w", "Writer", AgentRole::ContentWriter).with_memory(false);
        let agent = Agent::new(
            config,
            Arc::new(ModelRouter::mock()),
            ToolRegistry::new(),
            MemoryLimits::default(),
        );
        let result = agent.execute_task(&task()).await;
        assert!(result.is_success());
        assert_eq!(agent.memory_entry_count().await, 0);
        assert!(agent.memory_snapshot().await.short_term().is_empty());
    }

    #[tokio::test]
    async fn test_add_and_remove_tools() {
        let agent = agent_with(MockProvider::new());
        assert!(agent.remove_tool("flaky").await);
        assert!(!agent.remove_tool("flaky").await);
        agent.add_tool(Arc::new(FlakyTool)).await;
        assert_eq!(agent.tool_names().await, vec!["flaky", "make_artifact"]);
    }
}
