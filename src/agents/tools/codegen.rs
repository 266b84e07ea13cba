//! Code generation and component catalog search

use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{schema_of, Tool};
use crate::agents::domain::{Artifact, ArtifactKind};
use crate::agents::llm::{Complexity, GenerationConfig, ModelRouter, RoutingRequirements};

const CODE_TEMPERATURE: f32 = 0.2;

#[derive(Debug, Deserialize, JsonSchema)]
struct CodeGenerationParams {
    /// What the code should do
    description: String,
    /// Target UI framework
    #[serde(default = "default_framework")]
    framework: String,
    /// Source language
    #[serde(default = "default_language")]
    language: String,
}

fn default_framework() -> String {
    "react".to_string()
}

fn default_language() -> String {
    "typescript".to_string()
}

/// Generates source code through the model router
pub struct CodeGenerationTool {
    router: Arc<ModelRouter>,
}

impl CodeGenerationTool {
    pub fn new(router: Arc<ModelRouter>) -> Self {
        Self { router }
    }
}

/// Strip a surrounding markdown code fence, if any
fn strip_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    body.trim_end().strip_suffix("```").unwrap_or(body).trim_end()
}

#[async_trait]
impl Tool for CodeGenerationTool {
    fn name(&self) -> &str {
        "code_generation"
    }

    fn description(&self) -> &str {
        "Generate production-ready source code for a described component or module"
    }

    fn parameters(&self) -> Value {
        schema_of::<CodeGenerationParams>()
    }

    async fn execute(&self, params: Value) -> anyhow::Result<Value> {
        let params: CodeGenerationParams = serde_json::from_value(params)?;

        let prompt = format!(
            "Write a {framework} component in {language}.\n\
             Requirements: {description}\n\
             Return only the code in a single fenced block.",
            framework = params.framework,
            language = params.language,
            description = params.description,
        );
        let requirements = RoutingRequirements::default().with_complexity(Complexity::High);
        let config = GenerationConfig::default().with_temperature(CODE_TEMPERATURE);

        let routed = self.router.generate(&prompt, &requirements, &config).await?;
        let code = strip_fence(&routed.text).to_string();
        let artifact = Artifact::new(
            ArtifactKind::Code,
            format!("{}-component.{}", params.framework, extension(&params.language)),
            code.clone(),
        );

        Ok(json!({
            "code": code,
            "framework": params.framework,
            "language": params.language,
            "provider": routed.provider,
            "tokens_used": routed.tokens_used,
            "cost": routed.cost,
            "artifact": artifact,
        }))
    }
}

fn extension(language: &str) -> &'static str {
    match language.to_lowercase().as_str() {
        "typescript" | "ts" | "tsx" => "tsx",
        "javascript" | "js" | "jsx" => "jsx",
        "vue" => "vue",
        "svelte" => "svelte",
        "html" => "html",
        "css" => "css",
        _ => "txt",
    }
}

/// Entry of the built-in component catalog
#[derive(Debug, Clone, Serialize)]
pub struct ComponentEntry {
    pub name: &'static str,
    pub library: &'static str,
    pub category: &'static str,
    pub description: &'static str,
    pub tags: &'static [&'static str],
}

const CATALOG: &[ComponentEntry] = &[
    ComponentEntry { name: "Navbar", library: "shadcn", category: "navigation", description: "Responsive top navigation bar with mobile menu", tags: &["header", "menu", "nav", "responsive"] },
    ComponentEntry { name: "Hero", library: "tailwindui", category: "marketing", description: "Landing page hero with headline, copy and call to action", tags: &["landing", "banner", "cta"] },
    ComponentEntry { name: "FeatureGrid", library: "tailwindui", category: "marketing", description: "Three column grid of features with icons", tags: &["features", "grid", "icons"] },
    ComponentEntry { name: "PricingTable", library: "tailwindui", category: "marketing", description: "Tiered pricing cards with monthly and yearly toggle", tags: &["pricing", "plans", "cards"] },
    ComponentEntry { name: "Footer", library: "shadcn", category: "navigation", description: "Site footer with link columns and newsletter signup", tags: &["footer", "links", "newsletter"] },
    ComponentEntry { name: "Card", library: "shadcn", category: "layout", description: "Content container with header, body and footer slots", tags: &["container", "panel"] },
    ComponentEntry { name: "Dialog", library: "radix", category: "overlay", description: "Accessible modal dialog with focus trapping", tags: &["modal", "popup", "accessible"] },
    ComponentEntry { name: "DataTable", library: "tanstack", category: "data", description: "Sortable, filterable table with pagination", tags: &["table", "grid", "sort", "pagination"] },
    ComponentEntry { name: "Form", library: "react-hook-form", category: "input", description: "Validated form with field-level errors", tags: &["form", "validation", "input"] },
    ComponentEntry { name: "Carousel", library: "embla", category: "media", description: "Swipeable image carousel with autoplay", tags: &["slider", "gallery", "images"] },
    ComponentEntry { name: "Tabs", library: "radix", category: "navigation", description: "Keyboard-accessible tab list and panels", tags: &["tabs", "accessible"] },
    ComponentEntry { name: "Testimonials", library: "tailwindui", category: "marketing", description: "Customer quotes with avatars", tags: &["reviews", "quotes", "social proof"] },
];

#[derive(Debug, Deserialize, JsonSchema)]
struct ComponentSearchParams {
    /// Free-text description of the component
    query: String,
    /// Restrict results to one library
    #[serde(default)]
    library: Option<String>,
    /// Maximum results to return
    #[serde(default = "default_limit")]
    limit: u32,
}

fn default_limit() -> u32 {
    5
}

/// Searches a catalog of reusable UI components
pub struct ComponentSearchTool {
    catalog: &'static [ComponentEntry],
}

impl ComponentSearchTool {
    pub fn new() -> Self {
        Self { catalog: CATALOG }
    }

    fn score(entry: &ComponentEntry, terms: &[String]) -> usize {
        let haystack = format!(
            "{} {} {} {}",
            entry.name,
            entry.category,
            entry.description,
            entry.tags.join(" ")
        )
        .to_lowercase();
        terms.iter().filter(|t| haystack.contains(t.as_str())).count()
    }

    fn search(&self, query: &str, library: Option<&str>, limit: usize) -> Vec<&ComponentEntry> {
        let terms: Vec<String> = query
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| t.len() > 1)
            .map(str::to_string)
            .collect();

        let mut scored: Vec<(usize, &ComponentEntry)> = self
            .catalog
            .iter()
            .filter(|e| library.map_or(true, |l| e.library.eq_ignore_ascii_case(l)))
            .map(|e| (Self::score(e, &terms), e))
            .filter(|(score, _)| *score > 0)
            .collect();
        // stable sort keeps catalog order among equal scores
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.into_iter().take(limit).map(|(_, e)| e).collect()
    }
}

impl Default for ComponentSearchTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for ComponentSearchTool {
    fn name(&self) -> &str {
        "component_search"
    }

    fn description(&self) -> &str {
        "Find reusable UI components matching a description"
    }

    fn parameters(&self) -> Value {
        schema_of::<ComponentSearchParams>()
    }

    async fn execute(&self, params: Value) -> anyhow::Result<Value> {
        let params: ComponentSearchParams = serde_json::from_value(params)?;
        let matches = self.search(&params.query, params.library.as_deref(), params.limit as usize);
        Ok(json!({
            "query": params.query,
            "count": matches.len(),
            "components": matches,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::llm::MockProvider;

    #[test]
    fn test_strip_fence() {
        assert_eq!(strip_fence("```tsx\nconst a = 1;\n```"), "const a = 1;");
        assert_eq!(strip_fence("plain code"), "plain code");
        assert_eq!(strip_fence("```\nx\n```\n"), "x");
    }

    #[tokio::test]
    async fn test_code_generation_returns_code_artifact() {
        let router = Arc::new(ModelRouter::with_mock(MockProvider::scripted([
            "```tsx\nexport const Hero = () => <h1>Hi</h1>;\n```",
        ])));
        let tool = CodeGenerationTool::new(router);
        let result = tool
            .execute(json!({"description": "hero section"}))
            .await
            .unwrap();

        assert_eq!(result["code"], "export const Hero = () => <h1>Hi</h1>;");
        assert_eq!(result["artifact"]["type"], "code");
        assert_eq!(result["artifact"]["name"], "react-component.tsx");
        assert_eq!(result["provider"], "mock");
    }

    #[tokio::test]
    async fn test_component_search_ranks_matches() {
        let tool = ComponentSearchTool::new();
        let result = tool
            .execute(json!({"query": "pricing plans cards", "limit": 2}))
            .await
            .unwrap();
        assert_eq!(result["components"][0]["name"], "PricingTable");
        assert!(result["count"].as_u64().unwrap() <= 2);
    }

    #[test]
    fn test_component_search_filters_library() {
        let tool = ComponentSearchTool::new();
        let found = tool.search("accessible", Some("radix"), 10);
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|e| e.library == "radix"));
        assert!(tool.search("quantum", None, 10).is_empty());
    }
}
