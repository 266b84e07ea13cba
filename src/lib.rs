//! # Sitecrew - multi-agent orchestration for website builds
//!
//! Sitecrew coordinates role-based AI agents (planner, researcher, designer,
//! developer, QA, optimizer, ...) to clone websites, generate components and
//! run market research.
//!
//! ## Features
//!
//! - **Model routing**: picks a provider per call by context window, cost and preference
//! - **Tools**: web research, site analysis, code generation, QA checks, sandboxed files
//! - **Crews**: sequential, hierarchical and consensus processes over a task graph
//! - **Memory**: bounded per-agent memory that feeds later tasks
//! - **Offline mode**: a mock provider stands in when no API keys are configured
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sitecrew::agents::{CloneOptions, Orchestrator};
//! use sitecrew::config::Settings;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::new()?;
//!     let orchestrator = Orchestrator::new(&settings)?;
//!
//!     let result = orchestrator
//!         .clone_website("https://example.com", &CloneOptions::default())
//!         .await?;
//!     println!("{}", result.status);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **Agents**: domain types, providers, tools, agents, crews, orchestrator
//! - **Config**: settings from file, environment and CLI
//! - **CLI**: the `sitecrew` binary

pub mod agents;
pub mod cli;
pub mod config;
