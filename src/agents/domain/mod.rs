//! Domain types for the orchestration core
//!
//! Tasks, workflows, execution results and agent plans. These are plain
//! serializable values; behaviour lives in `core/` and `orchestration/`.

mod plan;
mod result;
mod task;
mod workflow;

pub use plan::*;
pub use result::*;
pub use task::*;
pub use workflow::*;
