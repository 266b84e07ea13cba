//! Web research and website analysis tools

use std::sync::LazyLock;

use anyhow::Context;
use async_trait::async_trait;
use regex::Regex;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{schema_of, Tool};

const DEFAULT_MAX_RESULTS: u32 = 5;
const MAX_RESULTS: u32 = 20;

static TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("valid title regex"));

/// Markers that reveal the stack a page was built with
const TECHNOLOGY_MARKERS: &[(&str, &str)] = &[
    ("__NEXT_DATA__", "next.js"),
    ("data-reactroot", "react"),
    ("data-v-", "vue"),
    ("ng-version", "angular"),
    ("__sveltekit", "svelte"),
    ("wp-content", "wordpress"),
    ("cdn.shopify.com", "shopify"),
    ("tailwind", "tailwind"),
    ("bootstrap", "bootstrap"),
];

#[derive(Debug, Deserialize, JsonSchema)]
struct WebResearchParams {
    /// Search query
    query: String,
    /// Maximum results to return
    #[serde(default = "default_max_results")]
    max_results: u32,
}

fn default_max_results() -> u32 {
    DEFAULT_MAX_RESULTS
}

/// Queries a configured search endpoint; reports offline results otherwise
pub struct WebResearchTool {
    client: reqwest::Client,
    endpoint: Option<String>,
}

impl WebResearchTool {
    pub fn new(client: reqwest::Client, endpoint: Option<String>) -> Self {
        Self { client, endpoint }
    }
}

#[async_trait]
impl Tool for WebResearchTool {
    fn name(&self) -> &str {
        "web_research"
    }

    fn description(&self) -> &str {
        "Search the web for information about a topic, company or technology"
    }

    fn parameters(&self) -> Value {
        schema_of::<WebResearchParams>()
    }

    async fn execute(&self, params: Value) -> anyhow::Result<Value> {
        let params: WebResearchParams = serde_json::from_value(params)?;
        let limit = params.max_results.clamp(1, MAX_RESULTS);

        let Some(endpoint) = &self.endpoint else {
            return Ok(json!({
                "query": params.query,
                "source": "offline",
                "results": [],
                "summary": format!(
                    "No search endpoint configured; research on '{}' relies on model knowledge",
                    params.query
                ),
            }));
        };

        let limit_param = limit.to_string();
        let response = self
            .client
            .get(endpoint)
            .query(&[("q", params.query.as_str()), ("limit", limit_param.as_str())])
            .send()
            .await
            .with_context(|| format!("search request to {} failed", endpoint))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("search endpoint returned {}", status);
        }

        let body: Value = response.json().await.context("search response was not JSON")?;
        let results = match body.get("results").cloned().unwrap_or(body) {
            Value::Array(items) => Value::Array(items.into_iter().take(limit as usize).collect()),
            other => other,
        };

        Ok(json!({
            "query": params.query,
            "source": endpoint,
            "results": results,
        }))
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
struct WebsiteAnalysisParams {
    /// Absolute http(s) URL of the page to analyze
    url: String,
}

/// Fetches a page and reports its title, size and technology markers
pub struct WebsiteAnalysisTool {
    client: reqwest::Client,
}

impl WebsiteAnalysisTool {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

/// Summarize a fetched page without parsing its markup
pub(crate) fn summarize_page(url: &str, status: u16, content_type: &str, body: &str) -> Value {
    let title = TITLE
        .captures(body)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().split_whitespace().collect::<Vec<_>>().join(" "));

    let lower = body.to_lowercase();
    let mut technologies: Vec<&str> = TECHNOLOGY_MARKERS
        .iter()
        .filter(|(marker, _)| lower.contains(&marker.to_lowercase()))
        .map(|(_, name)| *name)
        .collect();
    technologies.dedup();

    json!({
        "url": url,
        "status": status,
        "content_type": content_type,
        "bytes": body.len(),
        "title": title,
        "technologies": technologies,
    })
}

#[async_trait]
impl Tool for WebsiteAnalysisTool {
    fn name(&self) -> &str {
        "website_analysis"
    }

    fn description(&self) -> &str {
        "Fetch a website and report its title, size and detected technologies"
    }

    fn parameters(&self) -> Value {
        schema_of::<WebsiteAnalysisParams>()
    }

    async fn execute(&self, params: Value) -> anyhow::Result<Value> {
        let params: WebsiteAnalysisParams = serde_json::from_value(params)?;
        let url = reqwest::Url::parse(&params.url).with_context(|| format!("invalid URL '{}'", params.url))?;
        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!("unsupported URL scheme '{}'", url.scheme());
        }

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("failed to fetch {}", url))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string();
        let body = response.text().await.context("failed to read response body")?;

        Ok(summarize_page(url.as_str(), status, &content_type, &body))
    }
}
