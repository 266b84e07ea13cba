//! Agent plans: the typed form of a model's "steps" answer

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Task;

/// One step of an agent plan
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct PlanStep {
    pub action: String,
    /// Registered tool to invoke; model call when absent
    #[serde(default)]
    pub tool: Option<String>,
    #[serde(default)]
    pub parameters: Map<String, Value>,
    #[serde(default, alias = "expectedOutcome")]
    pub expected_outcome: String,
}

impl PlanStep {
    pub fn model(action: impl Into<String>, expected_outcome: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            tool: None,
            parameters: Map::new(),
            expected_outcome: expected_outcome.into(),
        }
    }

    pub fn tool(
        action: impl Into<String>,
        tool: impl Into<String>,
        parameters: Map<String, Value>,
        expected_outcome: impl Into<String>,
    ) -> Self {
        Self {
            action: action.into(),
            tool: Some(tool.into()),
            parameters,
            expected_outcome: expected_outcome.into(),
        }
    }
}

/// Ordered list of steps an agent executes for a task
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Plan {
    pub steps: Vec<PlanStep>,
}

impl Plan {
    /// Parse a model answer into a plan.
    ///
    /// The answer may wrap the JSON object in prose or a code fence; the
    /// outermost `{ ... }` span is used. Returns `None` when nothing
    /// parses, when there are no steps, or when a step has no action.
    pub fn parse(text: &str) -> Option<Plan> {
        let start = text.find('{')?;
        let end = text.rfind('}')?;
        if end < start {
            return None;
        }

        let mut plan: Plan = serde_json::from_str(&text[start..=end]).ok()?;
        if plan.steps.is_empty() || plan.steps.iter().any(|s| s.action.trim().is_empty()) {
            return None;
        }
        for step in &mut plan.steps {
            if step.tool.as_deref().is_some_and(|t| t.trim().is_empty()) {
                step.tool = None;
            }
        }
        Some(plan)
    }

    /// Single model step that executes the task directly
    pub fn fallback(task: &Task) -> Plan {
        Plan {
            steps: vec![PlanStep::model("execute_task", task.expected_output.clone())],
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_json() {
        let text = r#"{"steps": [
            {"action": "analyze_site", "tool": "website_analysis", "parameters": {"url": "https://example.com"}, "expected_outcome": "Site structure"},
            {"action": "write_summary", "expected_outcome": "Summary"}
        ]}"#;
        let plan = Plan::parse(text).unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.steps[0].tool.as_deref(), Some("website_analysis"));
        assert_eq!(plan.steps[1].tool, None);
        assert!(plan.steps[1].parameters.is_empty());
    }

    #[test]
    fn test_parse_fenced_json_with_prose() {
        let text = "Here is my plan:\n```json\n{\"steps\": [{\"action\": \"draft\", \"tool\": \"\"}]}\n```\nDone.";
        let plan = Plan::parse(text).unwrap();
        assert_eq!(plan.steps[0].action, "draft");
        assert_eq!(plan.steps[0].tool, None);
    }

    #[test]
    fn test_parse_rejects_invalid_answers() {
        assert!(Plan::parse("I will just do it").is_none());
        assert!(Plan::parse(r#"{"steps": []}"#).is_none());
        assert!(Plan::parse(r#"{"steps": [{"action": "  "}]}"#).is_none());
        assert!(Plan::parse(r#"{"plan": "none"}"#).is_none());
        assert!(Plan::parse("} backwards {").is_none());
    }

    #[test]
    fn test_fallback_is_single_model_step() {
        let task = Task::new("t1", "Write copy", "Landing page copy", "writer");
        let plan = Plan::fallback(&task);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.steps[0].action, "execute_task");
        assert_eq!(plan.steps[0].tool, None);
        assert_eq!(plan.steps[0].expected_outcome, "Landing page copy");
    }
}
