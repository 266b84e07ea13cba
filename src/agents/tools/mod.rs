//! Tools agents can invoke from a plan step
//!
//! A [`ToolRegistry`] maps names to [`Tool`] implementations. Parameters are
//! checked against the tool's JSON schema before execution.

mod codegen;
mod deployment;
mod filesystem;
mod qa;
mod research;
mod schema;
mod vector;

pub use codegen::{CodeGenerationTool, ComponentSearchTool};
pub use deployment::DeploymentTool;
pub use filesystem::FileSystemTool;
pub use qa::QaTestingTool;
pub use research::{WebResearchTool, WebsiteAnalysisTool};
pub use schema::validate_parameters;
pub use vector::VectorSearchTool;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::agents::config::ToolSettings;
use crate::agents::error::ToolError;
use crate::agents::llm::ModelRouter;

/// A named capability with a JSON-schema parameter contract
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema for the parameter object
    fn parameters(&self) -> Value;

    async fn execute(&self, params: Value) -> anyhow::Result<Value>;
}

/// Serializable description of a registered tool
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Name-keyed set of tools
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in tool
    pub fn with_builtins(router: Arc<ModelRouter>, settings: &ToolSettings) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.http_timeout_seconds))
            .build()
            .unwrap_or_else(|e| {
                warn!("Falling back to default HTTP client: {}", e);
                reqwest::Client::new()
            });

        let mut registry = Self::new();
        registry.register(Arc::new(WebResearchTool::new(
            client.clone(),
            settings.search_endpoint.clone(),
        )));
        registry.register(Arc::new(WebsiteAnalysisTool::new(client)));
        registry.register(Arc::new(CodeGenerationTool::new(router)));
        registry.register(Arc::new(ComponentSearchTool::new()));
        registry.register(Arc::new(FileSystemTool::new(settings.sandbox_root.clone())));
        registry.register(Arc::new(DeploymentTool::new()));
        registry.register(Arc::new(QaTestingTool::new()));
        registry.register(Arc::new(VectorSearchTool::new()));
        registry
    }

    /// Register a tool, returning the one it replaced
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Option<Arc<dyn Tool>> {
        self.tools.insert(tool.name().to_string(), tool)
    }

    pub fn remove(&mut self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Sorted tool names
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Definitions sorted by name
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut definitions: Vec<ToolDefinition> = self
            .tools
            .values()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description().to_string(),
                parameters: t.parameters(),
            })
            .collect();
        definitions.sort_by(|a, b| a.name.cmp(&b.name));
        definitions
    }

    /// Registry restricted to `names`; unknown names are skipped
    pub fn subset(&self, names: &[String]) -> ToolRegistry {
        let mut subset = ToolRegistry::new();
        for name in names {
            match self.tools.get(name) {
                Some(tool) => {
                    subset.register(Arc::clone(tool));
                }
                None => warn!(tool = %name, "Unknown tool requested; skipping"),
            }
        }
        subset
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Validate `params` against the tool's schema, then execute it
    pub async fn invoke(&self, name: &str, params: Value) -> Result<Value, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;

        validate_parameters(&tool.parameters(), &params).map_err(|reason| {
            ToolError::InvalidParameters {
                tool: name.to_string(),
                reason,
            }
        })?;

        debug!(tool = name, "Invoking tool");
        tool.execute(params).await.map_err(|e| ToolError::Execution {
            tool: name.to_string(),
            message: e.to_string(),
        })
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

/// Schema generated from a parameter struct
pub(crate) fn schema_of<T: schemars::JsonSchema>() -> Value {
    serde_json::to_value(schemars::schema_for!(T)).unwrap_or_else(|_| {
        serde_json::json!({"type": "object"})
    })
}
