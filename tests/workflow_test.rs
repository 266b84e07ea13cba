use std::sync::Arc;

use sitecrew::agents::llm::{MockProvider, ModelRouter};
use sitecrew::agents::orchestration::dependency_context;
use sitecrew::agents::{
    AgentConfig, AgentRole, CloneOptions, CrewConfig, ExecutionStatus, Orchestrator, ProcessType,
    Task, Workflow, WorkflowStatus,
};
use sitecrew::config::{ProviderMode, Settings};

fn orchestrator_with(provider: MockProvider) -> (Orchestrator, Arc<MockProvider>) {
    let provider = Arc::new(provider);
    let mut router = ModelRouter::new(ProviderMode::Mock);
    router.register(provider.clone());
    let orchestrator = Orchestrator::with_router(Arc::new(router), &Settings::default()).unwrap();
    (orchestrator, provider)
}

fn prompts_containing(provider: &MockProvider, needle: &str) -> Vec<String> {
    provider
        .recorded_prompts()
        .into_iter()
        .filter(|p| p.contains(needle))
        .collect()
}

#[tokio::test]
async fn test_clone_website_end_to_end() {
    let (orchestrator, _) = orchestrator_with(MockProvider::new());

    let result = orchestrator
        .clone_website("https://acme.test", &CloneOptions::default())
        .await
        .unwrap();

    assert_eq!(result.status, WorkflowStatus::Completed);
    let order: Vec<&str> = result.results.iter().map(|r| r.task_id.as_str()).collect();
    assert_eq!(order, vec!["research", "plan", "design", "develop", "qa", "optimize"]);
    assert!(result.results.iter().all(|r| r.status == ExecutionStatus::Success));

    let summed: f64 = result.results.iter().map(|r| r.cost).sum();
    assert!((result.total_cost - summed).abs() < 1e-12);
    assert_eq!(
        result.total_tokens,
        result.results.iter().map(|r| r.tokens_used).sum::<u32>()
    );

    let history = orchestrator.workflow_history().await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].crew_id, "web-dev");
    assert_eq!(history[0].workflow.status, WorkflowStatus::Completed);
    assert_eq!(history[0].workflow.metadata["url"], "https://acme.test");
}

#[tokio::test]
async fn test_dependency_outputs_reach_dependents() {
    let (orchestrator, provider) = orchestrator_with(MockProvider::new());
    let agents = vec![
        AgentConfig::new("alice", "Alice", AgentRole::Researcher),
        AgentConfig::new("bob", "Bob", AgentRole::Developer),
        AgentConfig::new("carol", "Carol", AgentRole::Designer),
    ];
    orchestrator
        .register_crew(CrewConfig::new("abc", "ABC", agents.clone(), ProcessType::Sequential))
        .await
        .unwrap();

    let workflow_tasks = vec![
        Task::new("B", "Build task B", "b", "bob").depends_on(["A"]),
        Task::new("C", "Build task C", "c", "carol").depends_on(["A"]),
        Task::new("A", "Gather task A", "a", "alice"),
    ];
    let workflow = Workflow::new("fan-out", "A feeds B and C", workflow_tasks.clone(), agents);

    let result = orchestrator.execute_with_crew("abc", workflow).await.unwrap();

    assert_eq!(result.status, WorkflowStatus::Completed);
    let order: Vec<&str> = result.results.iter().map(|r| r.task_id.as_str()).collect();
    assert_eq!(order, vec!["A", "B", "C"]);

    let a_output = &result.result_for("A").unwrap().output;
    assert!(a_output.is_string());

    // B and C each see exactly A's output under its key
    let (before_b, _) = result.results.split_at(1);
    for dependent in [&workflow_tasks[0], &workflow_tasks[1]] {
        let context = dependency_context(dependent, before_b);
        assert_eq!(context.len(), 1);
        assert_eq!(&context["task_A_output"], a_output);
    }

    let injected = format!("\"task_A_output\": {}", a_output);
    for task in ["Task: Build task B", "Task: Build task C"] {
        let prompts = prompts_containing(&provider, task);
        assert!(!prompts.is_empty());
        assert!(prompts.iter().any(|p| p.contains(&injected)), "{} saw no output of A", task);
    }
    assert!(prompts_containing(&provider, "Task: Gather task A")
        .iter()
        .all(|p| !p.contains("task_A_output")));
}

#[tokio::test]
async fn test_consensus_first_success_wins() {
    // the researcher's prompts all carry its name; the developer's never do
    let (orchestrator, _) = orchestrator_with(MockProvider::new().with_failure("Web Researcher"));

    let result = orchestrator.market_research("headless cms").await.unwrap();

    assert_eq!(result.status, WorkflowStatus::Completed);
    assert_eq!(result.results.len(), 3);
    for r in &result.results {
        assert!(r.is_success());
        assert_eq!(r.agent_id, "developer");
    }
    assert_eq!(orchestrator.workflow_history().await[0].crew_id, "research");
}

#[tokio::test]
async fn test_consensus_all_failed() {
    let (orchestrator, _) = orchestrator_with(MockProvider::new().with_failure("You are"));

    let result = orchestrator.market_research("headless cms").await.unwrap();

    assert_eq!(result.status, WorkflowStatus::Failed);
    assert_eq!(result.results.len(), 3);
    // the first candidate's attempt is kept when nobody succeeds
    assert!(result.results.iter().all(|r| r.agent_id == "researcher"));
    assert!(result.errors.is_empty());
}

#[tokio::test]
async fn test_critical_failure_aborts_clone() {
    let (orchestrator, _) = orchestrator_with(MockProvider::new().with_failure("Implement the"));

    let result = orchestrator
        .clone_website("https://acme.test", &CloneOptions::default())
        .await
        .unwrap();

    assert_eq!(result.status, WorkflowStatus::Failed);
    let order: Vec<&str> = result.results.iter().map(|r| r.task_id.as_str()).collect();
    assert_eq!(order, vec!["research", "plan", "design", "develop"]);
    assert!(result.results[3].is_failure());
    assert!(result.errors[0].contains("Critical task 'develop'"));
}

#[tokio::test]
async fn test_cycle_executes_nothing() {
    let (orchestrator, provider) = orchestrator_with(MockProvider::new());
    let workflow = Workflow::new(
        "cyclic",
        "never runs",
        vec![
            Task::new("a", "A", "x", "developer").depends_on(["b"]),
            Task::new("b", "B", "x", "designer").depends_on(["a"]),
        ],
        Vec::new(),
    );

    let result = orchestrator.execute_workflow(workflow).await.unwrap();

    assert_eq!(result.status, WorkflowStatus::Failed);
    assert!(result.results.is_empty());
    assert!(result.errors[0].contains("Circular dependency"));
    assert!(provider.recorded_prompts().is_empty());
}

#[tokio::test]
async fn test_missing_agent_is_isolated() {
    let (orchestrator, _) = orchestrator_with(MockProvider::new());
    let workflow = Workflow::new(
        "orphan",
        "one task has no owner",
        vec![
            Task::new("a", "Design the hero", "x", "designer"),
            Task::new("b", "Build the hero", "x", "developer"),
            Task::new("c", "Translate the hero", "x", "translator"),
        ],
        Vec::new(),
    );

    let result = orchestrator.execute_workflow(workflow).await.unwrap();

    assert_eq!(result.status, WorkflowStatus::Partial);
    let orphan = result.result_for("c").unwrap();
    assert!(orphan.is_failure());
    assert_eq!(orphan.agent_id, "translator");
}

#[tokio::test]
async fn test_hierarchical_optimization_crew() {
    let (orchestrator, provider) = orchestrator_with(MockProvider::new());
    let workflow = orchestrator
        .build_workflow(
            "speed-up",
            "Make the site faster",
            vec![
                Task::new("audit", "Audit page weight", "report", "optimizer"),
                Task::new("fix", "Fix the slowest script", "patch", "debugger").depends_on(["audit"]),
            ],
        )
        .await;
    let id = workflow.id.clone();

    let result = orchestrator.execute_workflow(workflow).await.unwrap();

    assert_eq!(result.status, WorkflowStatus::Completed);
    assert_eq!(result.results.len(), 2);
    let record = orchestrator.workflow(&id).await.unwrap();
    assert_eq!(record.crew_id, "optimization");
    assert_eq!(record.workflow.metadata["hierarchical_plan"]["manager"], "planner");
    assert!(!prompts_containing(&provider, "Plan and coordinate").is_empty());
}

#[tokio::test]
async fn test_memory_carries_over_between_workflows() {
    let (orchestrator, provider) = orchestrator_with(MockProvider::new());

    orchestrator.generate_component("pricing table", "react").await.unwrap();
    assert!(prompts_containing(&provider, "Relevant memories").is_empty());

    orchestrator.generate_component("pricing table", "react").await.unwrap();
    assert!(!prompts_containing(&provider, "Relevant memories").is_empty());

    let stats = orchestrator.crew("web-dev").await.unwrap().stats().await;
    assert_eq!(stats.total_workflows, 2);
    assert_eq!(stats.workflows_by_status.get("completed"), Some(&2));
    assert!(stats.average_memory_entries > 0.0);
}
