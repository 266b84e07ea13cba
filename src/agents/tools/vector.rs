//! In-memory similarity search over indexed text

use std::collections::HashMap;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{schema_of, Tool};

#[derive(Debug, Clone, Copy, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
enum VectorOperation {
    Index,
    Query,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct VectorSearchParams {
    operation: VectorOperation,
    /// Text to index or query with
    text: String,
    /// Document id for index operations; generated when absent
    #[serde(default)]
    id: Option<String>,
    /// Number of matches to return
    #[serde(default = "default_top_k")]
    top_k: u32,
}

fn default_top_k() -> u32 {
    3
}

struct Document {
    id: String,
    text: String,
    terms: HashMap<String, f32>,
}

/// Term-frequency vectors compared by cosine similarity
pub struct VectorSearchTool {
    documents: RwLock<Vec<Document>>,
}

impl VectorSearchTool {
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(Vec::new()),
        }
    }
}

impl Default for VectorSearchTool {
    fn default() -> Self {
        Self::new()
    }
}

fn term_frequencies(text: &str) -> HashMap<String, f32> {
    let mut terms = HashMap::new();
    for token in text
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
    {
        *terms.entry(token.to_string()).or_insert(0.0) += 1.0;
    }
    terms
}

fn cosine(a: &HashMap<String, f32>, b: &HashMap<String, f32>) -> f32 {
    let dot: f32 = a
        .iter()
        .filter_map(|(term, x)| b.get(term).map(|y| x * y))
        .sum();
    let norm = |v: &HashMap<String, f32>| v.values().map(|x| x * x).sum::<f32>().sqrt();
    let denominator = norm(a) * norm(b);
    if denominator == 0.0 {
        0.0
    } else {
        dot / denominator
    }
}

#[async_trait]
impl Tool for VectorSearchTool {
    fn name(&self) -> &str {
        "vector_search"
    }

    fn description(&self) -> &str {
        "Index text snippets and retrieve the most similar ones for a query"
    }

    fn parameters(&self) -> Value {
        schema_of::<VectorSearchParams>()
    }

    async fn execute(&self, params: Value) -> anyhow::Result<Value> {
        let params: VectorSearchParams = serde_json::from_value(params)?;

        match params.operation {
            VectorOperation::Index => {
                let id = params.id.unwrap_or_else(|| Uuid::new_v4().to_string());
                let document = Document {
                    id: id.clone(),
                    terms: term_frequencies(&params.text),
                    text: params.text,
                };
                let mut documents = self.documents.write().await;
                documents.retain(|d| d.id != id);
                documents.push(document);
                Ok(json!({"id": id, "indexed": documents.len()}))
            }
            VectorOperation::Query => {
                let query = term_frequencies(&params.text);
                let documents = self.documents.read().await;
                let mut scored: Vec<(f32, &Document)> = documents
                    .iter()
                    .map(|d| (cosine(&query, &d.terms), d))
                    .filter(|(score, _)| *score > 0.0)
                    .collect();
                scored.sort_by(|a, b| b.0.total_cmp(&a.0));

                let matches: Vec<Value> = scored
                    .into_iter()
                    .take(params.top_k as usize)
                    .map(|(score, d)| json!({"id": d.id, "text": d.text, "score": score}))
                    .collect();
                Ok(json!({"query": params.text, "matches": matches}))
            }
        }
    }
}
