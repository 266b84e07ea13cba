//! The orchestrator: entry point that owns the router, tools, agents and crews
//!
//! An `Orchestrator` is an ordinary value built from `Settings`; callers
//! create one and share it (e.g. behind an `Arc`) instead of reaching for a
//! process-wide instance.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;

use crate::agents::config::{AgentConfig, AgentRole, CrewConfig, CrewDefinition, MemoryLimits};
use crate::agents::domain::{Task, Workflow, WorkflowResult};
use crate::agents::error::{AgentError, AgentResult};
use crate::agents::llm::ModelRouter;
use crate::agents::orchestration::Crew;
use crate::agents::presets::{
    self, CloneOptions, OPTIMIZATION_CREW, RESEARCH_CREW, WEB_DEV_CREW,
};
use crate::agents::tools::ToolRegistry;
use crate::config::{ProviderMode, Settings};

/// Research-only workflows up to this size go to the research crew
const RESEARCH_CREW_MAX_TASKS: usize = 3;

/// A finished workflow and its result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowRecord {
    pub crew_id: String,
    pub workflow: Workflow,
    pub result: WorkflowResult,
}

/// Finished workflows keyed by id, remembering completion order
#[derive(Debug, Default)]
struct WorkflowHistory {
    records: HashMap<String, WorkflowRecord>,
    order: Vec<String>,
}

impl WorkflowHistory {
    /// Re-running a workflow id replaces its record in place
    fn insert(&mut self, record: WorkflowRecord) {
        let id = record.workflow.id.clone();
        if self.records.insert(id.clone(), record).is_none() {
            self.order.push(id);
        }
    }

    fn get(&self, id: &str) -> Option<&WorkflowRecord> {
        self.records.get(id)
    }

    fn ordered(&self) -> Vec<WorkflowRecord> {
        self.order
            .iter()
            .filter_map(|id| self.records.get(id))
            .cloned()
            .collect()
    }
}

/// Summary of a registered crew
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrewSummary {
    pub id: String,
    pub name: String,
    pub process: String,
    pub agents: Vec<String>,
}

pub struct Orchestrator {
    router: Arc<ModelRouter>,
    tools: ToolRegistry,
    limits: MemoryLimits,
    agents: RwLock<Vec<AgentConfig>>,
    crews: RwLock<HashMap<String, Arc<Crew>>>,
    history: RwLock<WorkflowHistory>,
}

impl Orchestrator {
    /// Build the router from `settings.providers`, then register presets and
    /// whatever agents and crews the settings add
    pub fn new(settings: &Settings) -> AgentResult<Self> {
        let router = Arc::new(ModelRouter::from_settings(&settings.providers));
        Self::with_router(router, settings)
    }

    pub fn with_router(router: Arc<ModelRouter>, settings: &Settings) -> AgentResult<Self> {
        let tools = ToolRegistry::with_builtins(router.clone(), &settings.tools);

        let mut agents = presets::preset_agents();
        for agent in &settings.agents {
            agent.validate()?;
            upsert_agent(&mut agents, agent.clone());
        }

        let mut crews = HashMap::new();
        let definitions = presets::preset_crews().into_iter().chain(settings.crews.iter().cloned());
        for definition in definitions {
            let config = resolve_crew(&definition, &agents)?;
            let crew = Crew::new(config, router.clone(), &tools, settings.memory);
            crews.insert(definition.id.clone(), Arc::new(crew));
        }

        info!(
            mode = ?router.mode(),
            providers = ?router.provider_names(),
            agents = agents.len(),
            crews = crews.len(),
            "Orchestrator ready"
        );

        Ok(Self {
            router,
            tools,
            limits: settings.memory,
            agents: RwLock::new(agents),
            crews: RwLock::new(crews),
            history: RwLock::new(WorkflowHistory::default()),
        })
    }

    pub fn mode(&self) -> ProviderMode {
        self.router.mode()
    }

    pub fn router(&self) -> &Arc<ModelRouter> {
        &self.router
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Registered agent configs in registration order
    pub async fn agents(&self) -> Vec<AgentConfig> {
        self.agents.read().await.clone()
    }

    pub async fn agent(&self, id: &str) -> Option<AgentConfig> {
        self.agents.read().await.iter().find(|a| a.id == id).cloned()
    }

    /// Register or replace an agent; crews that include it pick up the change
    pub async fn register_agent(&self, config: AgentConfig) -> AgentResult<()> {
        config.validate()?;

        for crew in self.crews.read().await.values() {
            if crew.agent(&config.id).await.is_some() {
                crew.add_agent(config.clone()).await?;
            }
        }

        info!(agent = %config.id, role = %config.role, "Agent registered");
        upsert_agent(&mut *self.agents.write().await, config);
        Ok(())
    }

    /// Register or replace a crew
    pub async fn register_crew(&self, config: CrewConfig) -> AgentResult<Arc<Crew>> {
        for agent in &config.agents {
            agent.validate()?;
        }
        if config.max_execution == 0 {
            return Err(AgentError::Validation(format!(
                "Crew '{}' must allow at least one task",
                config.id
            )));
        }

        let id = config.id.clone();
        let crew = Arc::new(Crew::new(config, self.router.clone(), &self.tools, self.limits));
        self.crews.write().await.insert(id.clone(), crew.clone());
        info!(crew = %id, "Crew registered");
        Ok(crew)
    }

    /// Register a crew whose agents are referenced by id
    pub async fn register_crew_definition(&self, definition: CrewDefinition) -> AgentResult<Arc<Crew>> {
        let config = {
            let agents = self.agents.read().await;
            resolve_crew(&definition, &agents)?
        };
        self.register_crew(config).await
    }

    pub async fn crew(&self, id: &str) -> Option<Arc<Crew>> {
        self.crews.read().await.get(id).cloned()
    }

    /// Registered crews sorted by id
    pub async fn crews(&self) -> Vec<CrewSummary> {
        let crews: Vec<Arc<Crew>> = self.crews.read().await.values().cloned().collect();
        let mut summaries = Vec::with_capacity(crews.len());
        for crew in crews {
            let config = crew.config().await;
            summaries.push(CrewSummary {
                id: config.id,
                name: config.name,
                process: config.process.to_string(),
                agents: config.agents.into_iter().map(|a| a.id).collect(),
            });
        }
        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        summaries
    }

    /// Build a workflow whose participants are the owners of `tasks`
    pub async fn build_workflow(
        &self,
        name: impl Into<String>,
        description: impl Into<String>,
        tasks: Vec<Task>,
    ) -> Workflow {
        let agents = {
            let registered = self.agents.read().await;
            let mut seen = HashSet::new();
            tasks
                .iter()
                .filter(|t| seen.insert(t.agent_id.clone()))
                .filter_map(|t| registered.iter().find(|a| a.id == t.agent_id).cloned())
                .collect()
        };
        Workflow::new(name, description, tasks, agents)
    }

    pub async fn clone_website_workflow(&self, url: &str, options: &CloneOptions) -> AgentResult<Workflow> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|e| AgentError::Validation(format!("invalid URL '{}': {}", url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AgentError::Validation(format!(
                "unsupported URL scheme '{}'",
                parsed.scheme()
            )));
        }

        let workflow = self
            .build_workflow(
                format!("Clone {}", url),
                format!("Clone {} with {} and {}", url, options.framework, options.styling),
                presets::clone_website_tasks(url, options),
            )
            .await;
        Ok(workflow.with_metadata("url", serde_json::json!(url)))
    }

    pub async fn component_workflow(&self, description: &str, framework: &str) -> Workflow {
        self.build_workflow(
            format!("Component: {}", description),
            format!("Design, build and test a {} component", framework),
            presets::component_tasks(description, framework),
        )
        .await
    }

    pub async fn market_research_workflow(&self, topic: &str) -> Workflow {
        self.build_workflow(
            format!("Market research: {}", topic),
            format!("Research, analyze and report on {}", topic),
            presets::market_research_tasks(topic),
        )
        .await
    }

    /// Roles involved in `workflow`: declared participants plus task owners
    async fn workflow_roles(&self, workflow: &Workflow) -> HashSet<AgentRole> {
        let mut roles = workflow.roles();
        let agents = self.agents.read().await;
        for task in &workflow.tasks {
            if let Some(agent) = agents.iter().find(|a| a.id == task.agent_id) {
                roles.insert(agent.role);
            }
        }
        roles
    }

    /// Pick the crew for `workflow`:
    /// developer and designer → web-dev; researchers only with a short task
    /// list → research; optimizer or debugger → optimization; else web-dev
    pub async fn select_crew(&self, workflow: &Workflow) -> AgentResult<Arc<Crew>> {
        let roles = self.workflow_roles(workflow).await;

        let crew_id = if roles.contains(&AgentRole::Developer) && roles.contains(&AgentRole::Designer) {
            WEB_DEV_CREW
        } else if !roles.is_empty()
            && roles.iter().all(|r| *r == AgentRole::Researcher)
            && workflow.tasks.len() <= RESEARCH_CREW_MAX_TASKS
        {
            RESEARCH_CREW
        } else if roles.contains(&AgentRole::Optimizer) || roles.contains(&AgentRole::Debugger) {
            OPTIMIZATION_CREW
        } else {
            WEB_DEV_CREW
        };

        self.crew(crew_id)
            .await
            .ok_or_else(|| AgentError::CrewNotFound(crew_id.to_string()))
    }

    /// Run `workflow` on the selected crew and record it in the history
    pub async fn execute_workflow(&self, workflow: Workflow) -> AgentResult<WorkflowResult> {
        let crew = self.select_crew(&workflow).await?;
        self.execute_on(&crew, workflow).await
    }

    /// Run `workflow` on a specific crew
    pub async fn execute_with_crew(&self, crew_id: &str, workflow: Workflow) -> AgentResult<WorkflowResult> {
        let crew = self
            .crew(crew_id)
            .await
            .ok_or_else(|| AgentError::CrewNotFound(crew_id.to_string()))?;
        self.execute_on(&crew, workflow).await
    }

    async fn execute_on(&self, crew: &Crew, workflow: Workflow) -> AgentResult<WorkflowResult> {
        let workflow_id = workflow.id.clone();
        info!(crew = %crew.id(), workflow = %workflow_id, name = %workflow.name, "Dispatching workflow");

        let fallback = workflow.clone();
        let result = crew.execute_workflow(workflow).await;
        let mut workflow = crew.workflow(&workflow_id).await.unwrap_or(fallback);
        workflow.set_status(result.status);

        self.history.write().await.insert(WorkflowRecord {
            crew_id: crew.id().to_string(),
            workflow,
            result: result.clone(),
        });
        Ok(result)
    }

    pub async fn clone_website(&self, url: &str, options: &CloneOptions) -> AgentResult<WorkflowResult> {
        let workflow = self.clone_website_workflow(url, options).await?;
        self.execute_workflow(workflow).await
    }

    pub async fn generate_component(&self, description: &str, framework: &str) -> AgentResult<WorkflowResult> {
        let workflow = self.component_workflow(description, framework).await;
        self.execute_workflow(workflow).await
    }

    pub async fn market_research(&self, topic: &str) -> AgentResult<WorkflowResult> {
        let workflow = self.market_research_workflow(topic).await;
        self.execute_workflow(workflow).await
    }

    /// Every finished workflow, oldest first
    pub async fn workflow_history(&self) -> Vec<WorkflowRecord> {
        self.history.read().await.ordered()
    }

    pub async fn workflow(&self, id: &str) -> Option<WorkflowRecord> {
        self.history.read().await.get(id).cloned()
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("mode", &self.router.mode())
            .field("tools", &self.tools)
            .finish()
    }
}

fn upsert_agent(agents: &mut Vec<AgentConfig>, config: AgentConfig) {
    match agents.iter_mut().find(|a| a.id == config.id) {
        Some(existing) => *existing = config,
        None => agents.push(config),
    }
}

fn resolve_crew(definition: &CrewDefinition, agents: &[AgentConfig]) -> AgentResult<CrewConfig> {
    let members = definition
        .agents
        .iter()
        .map(|id| {
            agents
                .iter()
                .find(|a| &a.id == id)
                .cloned()
                .ok_or_else(|| AgentError::NotFound(id.clone()))
        })
        .collect::<AgentResult<Vec<_>>>()?;

    Ok(CrewConfig {
        id: definition.id.clone(),
        name: definition.name.clone(),
        agents: members,
        process: definition.process,
        verbose: definition.verbose,
        memory_enabled: definition.memory_enabled,
        max_execution: definition.max_execution,
    })
}
