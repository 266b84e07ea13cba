//! Sandboxed file access

use std::path::{Component, Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::fs;

use super::{schema_of, Tool};

#[derive(Debug, Clone, Copy, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
enum FileOperation {
    Read,
    Write,
    List,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct FileSystemParams {
    operation: FileOperation,
    /// Path relative to the sandbox root
    path: String,
    /// Content for write operations
    #[serde(default)]
    content: Option<String>,
}

/// Reads, writes and lists files below a fixed root directory
pub struct FileSystemTool {
    root: PathBuf,
}

impl FileSystemTool {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Join `relative` onto the root, refusing anything that could leave it
    fn resolve(&self, relative: &str) -> anyhow::Result<PathBuf> {
        let path = Path::new(relative);
        let mut resolved = self.root.clone();
        for component in path.components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    anyhow::bail!("path '{}' escapes the sandbox", relative)
                }
            }
        }
        Ok(resolved)
    }

    /// Refuse `path` if its deepest existing ancestor really lives outside
    /// the root, e.g. behind a symlink
    async fn confine(&self, path: &Path, relative: &str) -> anyhow::Result<()> {
        let Ok(root) = fs::canonicalize(&self.root).await else {
            // nothing below a missing root can be a link
            return Ok(());
        };

        let mut existing = path;
        while fs::symlink_metadata(existing).await.is_err() {
            match existing.parent() {
                Some(parent) => existing = parent,
                None => return Ok(()),
            }
        }

        let real = fs::canonicalize(existing)
            .await
            .with_context(|| format!("failed to resolve '{}'", relative))?;
        if !real.starts_with(&root) {
            anyhow::bail!("path '{}' escapes the sandbox", relative);
        }
        Ok(())
    }
}

#[async_trait]
impl Tool for FileSystemTool {
    fn name(&self) -> &str {
        "file_system"
    }

    fn description(&self) -> &str {
        "Read, write or list project files inside the workspace sandbox"
    }

    fn parameters(&self) -> Value {
        schema_of::<FileSystemParams>()
    }

    async fn execute(&self, params: Value) -> anyhow::Result<Value> {
        let params: FileSystemParams = serde_json::from_value(params)?;
        let path = self.resolve(&params.path)?;
        self.confine(&path, &params.path).await?;

        match params.operation {
            FileOperation::Read => {
                let content = fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("failed to read '{}'", params.path))?;
                Ok(json!({"path": params.path, "content": content}))
            }
            FileOperation::Write => {
                let content = params
                    .content
                    .context("write operation requires 'content'")?;
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent).await?;
                }
                fs::write(&path, &content)
                    .await
                    .with_context(|| format!("failed to write '{}'", params.path))?;
                Ok(json!({"path": params.path, "bytes_written": content.len()}))
            }
            FileOperation::List => {
                let mut entries = fs::read_dir(&path)
                    .await
                    .with_context(|| format!("failed to list '{}'", params.path))?;
                let mut names = Vec::new();
                while let Some(entry) = entries.next_entry().await? {
                    let mut name = entry.file_name().to_string_lossy().into_owned();
                    if entry.file_type().await?.is_dir() {
                        name.push('/');
                    }
                    names.push(name);
                }
                names.sort();
                Ok(json!({"path": params.path, "entries": names}))
            }
        }
    }
}
