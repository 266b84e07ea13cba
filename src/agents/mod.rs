//! Multi-agent task orchestration
//!
//! Agents with distinct roles execute the tasks of a workflow, grouped into
//! crews that decide how the tasks are scheduled:
//! - Sequential: one task at a time in dependency order
//! - Hierarchical: a manager agent plans, then the crew runs sequentially
//! - Consensus: several agents attempt each task, first success wins
//!
//! ## Architecture
//!
//! - `domain/` - Core types (Task, Workflow, ExecutionResult, Plan)
//! - `llm/` - Model providers and the cost/context-aware router
//! - `tools/` - Tool trait, registry and built-in tools
//! - `core/` - The agent pipeline (context, plan, steps, synthesis, memory)
//! - `memory/` - Per-agent long-term, short-term and entity memory
//! - `orchestration/` - Crews and their processes
//! - `orchestrator` - Entry point owning agents, crews and history

pub mod config;
pub mod core;
pub mod domain;
pub mod error;
pub mod llm;
pub mod memory;
pub mod orchestration;
pub mod orchestrator;
pub mod presets;
pub mod token;
pub mod tools;

// Re-export commonly used types
pub use config::*;
pub use domain::*;
pub use error::*;
pub use orchestration::{Crew, CrewStats};
pub use orchestrator::{CrewSummary, Orchestrator, WorkflowRecord};
pub use presets::CloneOptions;
