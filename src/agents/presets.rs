//! Built-in agents, crews and workflow templates

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::agents::config::{AgentConfig, AgentRole, CrewDefinition, LlmProviderType, ProcessType};
use crate::agents::domain::{Task, TaskPriority};

pub const WEB_DEV_CREW: &str = "web-dev";
pub const RESEARCH_CREW: &str = "research";
pub const OPTIMIZATION_CREW: &str = "optimization";

/// The eight built-in agents, one per role
pub fn preset_agents() -> Vec<AgentConfig> {
    vec![
        AgentConfig::new("planner", "Project Planner", AgentRole::Planner)
            .with_goal("Turn requirements into an ordered, realistic build plan")
            .with_backstory("A delivery lead who has scoped hundreds of site builds")
            .with_provider(LlmProviderType::Anthropic)
            .with_temperature(0.4)
            .with_tools(["vector_search"]),
        AgentConfig::new("researcher", "Web Researcher", AgentRole::Researcher)
            .with_goal("Collect accurate facts about sites, markets and technologies")
            .with_backstory("An analyst who reverse-engineers how websites are built")
            .with_provider(LlmProviderType::Gemini)
            .with_temperature(0.5)
            .with_tools(["web_research", "website_analysis", "vector_search"]),
        AgentConfig::new("developer", "Frontend Developer", AgentRole::Developer)
            .with_goal("Write clean, working, idiomatic frontend code")
            .with_backstory("A senior engineer fluent in React, Vue and modern CSS")
            .with_provider(LlmProviderType::OpenAI)
            .with_temperature(0.2)
            .with_tools(["code_generation", "component_search", "file_system"]),
        AgentConfig::new("designer", "UI Designer", AgentRole::Designer)
            .with_goal("Produce a coherent visual system and component hierarchy")
            .with_backstory("A product designer with a background in design systems")
            .with_provider(LlmProviderType::Anthropic)
            .with_temperature(0.8)
            .with_tools(["component_search", "website_analysis"]),
        AgentConfig::new("qa_tester", "QA Engineer", AgentRole::QaTester)
            .with_goal("Find defects before users do")
            .with_backstory("A tester focused on accessibility and cross-browser issues")
            .with_provider(LlmProviderType::OpenAI)
            .with_temperature(0.3)
            .with_tools(["qa_testing", "file_system"]),
        AgentConfig::new("content_writer", "Content Writer", AgentRole::ContentWriter)
            .with_goal("Write clear, persuasive copy and reports")
            .with_backstory("A technical writer who has shipped marketing sites and whitepapers")
            .with_provider(LlmProviderType::Anthropic)
            .with_temperature(0.9)
            .with_tools(["web_research"]),
        AgentConfig::new("optimizer", "Performance Optimizer", AgentRole::Optimizer)
            .with_goal("Make sites fast, accessible and search friendly")
            .with_backstory("A web performance specialist obsessed with Core Web Vitals")
            .with_provider(LlmProviderType::OpenAI)
            .with_temperature(0.3)
            .with_tools(["qa_testing", "deployment", "website_analysis"]),
        AgentConfig::new("debugger", "Debugger", AgentRole::Debugger)
            .with_goal("Find root causes and fix them with minimal changes")
            .with_backstory("An engineer who enjoys reading stack traces")
            .with_provider(LlmProviderType::OpenAI)
            .with_temperature(0.1)
            .with_tools(["qa_testing", "file_system", "code_generation"]),
    ]
}

/// The three built-in crews
pub fn preset_crews() -> Vec<CrewDefinition> {
    let crew = |id: &str, name: &str, process: ProcessType, agents: &[&str]| CrewDefinition {
        id: id.to_string(),
        name: name.to_string(),
        agents: agents.iter().map(|a| a.to_string()).collect(),
        process,
        verbose: false,
        memory_enabled: true,
        max_execution: 50,
    };

    vec![
        crew(
            WEB_DEV_CREW,
            "Web Development",
            ProcessType::Sequential,
            &["planner", "researcher", "designer", "developer", "qa_tester", "optimizer"],
        ),
        crew(
            RESEARCH_CREW,
            "Research",
            ProcessType::Consensus,
            &["researcher", "developer", "content_writer"],
        ),
        crew(
            OPTIMIZATION_CREW,
            "Optimization",
            ProcessType::Hierarchical,
            &["planner", "optimizer", "debugger", "qa_tester"],
        ),
    ]
}

/// Knobs for the clone workflow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloneOptions {
    pub framework: String,
    pub styling: String,
    /// Append an optimization pass after QA
    pub optimize: bool,
}

impl Default for CloneOptions {
    fn default() -> Self {
        Self {
            framework: "react".to_string(),
            styling: "tailwind".to_string(),
            optimize: true,
        }
    }
}

/// research → plan → design → develop → QA → optimize
pub fn clone_website_tasks(url: &str, options: &CloneOptions) -> Vec<Task> {
    let with_site = |task: Task| {
        task.with_context("url", json!(url))
            .with_context("framework", json!(options.framework))
            .with_context("styling", json!(options.styling))
    };

    let mut tasks = vec![
        with_site(Task::new(
            "research",
            format!("Analyze the website at {url}: page structure, content, technology stack and design language"),
            "A report of sections, components, assets and technologies",
            "researcher",
        ))
        .with_priority(TaskPriority::High),
        with_site(Task::new(
            "plan",
            format!("Plan the clone of {url} using {} and {}", options.framework, options.styling),
            "An ordered implementation plan with a file layout",
            "planner",
        ))
        .depends_on(["research"]),
        with_site(Task::new(
            "design",
            format!("Design the component hierarchy and visual system for the {url} clone"),
            "Component tree, color palette, typography and spacing scale",
            "designer",
        ))
        .depends_on(["research", "plan"]),
        with_site(Task::new(
            "develop",
            format!("Implement the {url} clone as {} components styled with {}", options.framework, options.styling),
            "Source files for every page section",
            "developer",
        ))
        .depends_on(["plan", "design"])
        .with_priority(TaskPriority::Critical),
        with_site(Task::new(
            "qa",
            format!("Test the {url} clone for accessibility, console errors and layout issues"),
            "A QA report listing issues and a quality score",
            "qa_tester",
        ))
        .depends_on(["develop"]),
    ];

    if options.optimize {
        tasks.push(
            with_site(Task::new(
                "optimize",
                format!("Optimize the {url} clone for load time, accessibility and SEO"),
                "A list of applied optimizations and a deployment preview",
                "optimizer",
            ))
            .depends_on(["develop", "qa"]),
        );
    }

    tasks
}

/// design → develop → QA
pub fn component_tasks(description: &str, framework: &str) -> Vec<Task> {
    vec![
        Task::new(
            "design",
            format!("Design a UI component: {description}"),
            "Props, states, layout and styling decisions",
            "designer",
        )
        .with_context("framework", json!(framework)),
        Task::new(
            "develop",
            format!("Implement the component in {framework}: {description}"),
            "A single, self-contained component file",
            "developer",
        )
        .with_context("framework", json!(framework))
        .depends_on(["design"])
        .with_priority(TaskPriority::High),
        Task::new(
            "qa",
            format!("Review the {framework} component for accessibility and correctness"),
            "A QA report with a quality score",
            "qa_tester",
        )
        .depends_on(["develop"]),
    ]
}

/// research → analysis → report, all owned by the researcher
pub fn market_research_tasks(topic: &str) -> Vec<Task> {
    vec![
        Task::new(
            "research",
            format!("Research the market for {topic}: main players, offerings and pricing"),
            "Notes on competitors and their positioning",
            "researcher",
        )
        .with_context("topic", json!(topic)),
        Task::new(
            "analysis",
            format!("Analyze the research on {topic} for gaps and opportunities"),
            "Ranked opportunities with supporting evidence",
            "researcher",
        )
        .depends_on(["research"]),
        Task::new(
            "report",
            format!("Write a market research report on {topic}"),
            "An executive summary followed by findings and recommendations",
            "researcher",
        )
        .depends_on(["analysis"]),
    ]
}
