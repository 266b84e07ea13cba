//! Simulated deployments

use async_trait::async_trait;
use chrono::Utc;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use super::{schema_of, Tool};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
enum DeploymentPlatform {
    #[default]
    Vercel,
    Netlify,
    StaticHost,
}

impl DeploymentPlatform {
    fn domain(&self) -> &'static str {
        match self {
            DeploymentPlatform::Vercel => "vercel.app",
            DeploymentPlatform::Netlify => "netlify.app",
            DeploymentPlatform::StaticHost => "static.sitecrew.dev",
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
struct DeploymentParams {
    /// Project to deploy
    project_name: String,
    #[serde(default)]
    platform: DeploymentPlatform,
    /// Files included in the deployment
    #[serde(default)]
    files: Vec<String>,
}

/// Records a deployment and returns its preview URL; nothing is uploaded
pub struct DeploymentTool;

impl DeploymentTool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DeploymentTool {
    fn default() -> Self {
        Self::new()
    }
}

fn slugify(name: &str) -> String {
    let slug = name
        .to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    if slug.is_empty() {
        "site".to_string()
    } else {
        slug
    }
}

#[async_trait]
impl Tool for DeploymentTool {
    fn name(&self) -> &str {
        "deployment"
    }

    fn description(&self) -> &str {
        "Deploy a generated site to a hosting platform and return its preview URL"
    }

    fn parameters(&self) -> Value {
        schema_of::<DeploymentParams>()
    }

    async fn execute(&self, params: Value) -> anyhow::Result<Value> {
        let params: DeploymentParams = serde_json::from_value(params)?;
        let id = Uuid::new_v4().simple().to_string();
        let url = format!(
            "https://{}-{}.{}",
            slugify(&params.project_name),
            &id[..8],
            params.platform.domain()
        );

        Ok(json!({
            "deployment_id": id,
            "url": url,
            "platform": params.platform,
            "status": "ready",
            "files": params.files.len(),
            "created_at": Utc::now(),
        }))
    }
}
