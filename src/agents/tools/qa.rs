//! Static quality checks for generated code

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{schema_of, Tool};

const PENALTY_PER_ISSUE: u32 = 10;

static IMG_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<img\b[^>]*>").expect("valid img regex"));
static CONSOLE_CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bconsole\.(log|debug|warn)\s*\(").expect("valid console regex"));
static TODO_MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(TODO|FIXME|XXX)\b").expect("valid todo regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
enum QaCheck {
    Accessibility,
    Console,
    Todo,
    Syntax,
}

const ALL_CHECKS: [QaCheck; 4] = [QaCheck::Accessibility, QaCheck::Console, QaCheck::Todo, QaCheck::Syntax];

#[derive(Debug, Deserialize, JsonSchema)]
struct QaParams {
    /// Source code to check
    code: String,
    /// Checks to run; all when empty
    #[serde(default)]
    checks: Vec<QaCheck>,
}

#[derive(Debug, Serialize)]
struct Issue {
    check: QaCheck,
    line: usize,
    message: String,
}

/// Runs lightweight static checks and scores the result out of 100
pub struct QaTestingTool;

impl QaTestingTool {
    pub fn new() -> Self {
        Self
    }

    fn run(code: &str, checks: &[QaCheck]) -> Vec<Issue> {
        let mut issues = Vec::new();
        for check in checks {
            match check {
                QaCheck::Accessibility => {
                    for (index, line) in code.lines().enumerate() {
                        for tag in IMG_TAG.find_iter(line) {
                            if !tag.as_str().contains("alt=") {
                                issues.push(Issue {
                                    check: *check,
                                    line: index + 1,
                                    message: "image is missing alt text".to_string(),
                                });
                            }
                        }
                    }
                }
                QaCheck::Console => Self::line_matches(code, &CONSOLE_CALL, *check, "leftover console call", &mut issues),
                QaCheck::Todo => Self::line_matches(code, &TODO_MARKER, *check, "unresolved TODO marker", &mut issues),
                QaCheck::Syntax => {
                    if let Some(message) = unbalanced_delimiters(code) {
                        issues.push(Issue { check: *check, line: 0, message });
                    }
                }
            }
        }
        issues
    }

    fn line_matches(code: &str, pattern: &Regex, check: QaCheck, message: &str, issues: &mut Vec<Issue>) {
        for (index, line) in code.lines().enumerate() {
            if pattern.is_match(line) {
                issues.push(Issue {
                    check,
                    line: index + 1,
                    message: message.to_string(),
                });
            }
        }
    }
}

impl Default for QaTestingTool {
    fn default() -> Self {
        Self::new()
    }
}

/// First delimiter mismatch, ignoring string literals
fn unbalanced_delimiters(code: &str) -> Option<String> {
    let mut stack = Vec::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in code.chars() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' | '`' => quote = Some(c),
            '(' | '[' | '{' => stack.push(c),
            ')' | ']' | '}' => {
                let expected = match c {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                if stack.pop() != Some(expected) {
                    return Some(format!("unexpected '{}'", c));
                }
            }
            _ => {}
        }
    }

    stack.last().map(|open| format!("unclosed '{}'", open))
}

#[async_trait]
impl Tool for QaTestingTool {
    fn name(&self) -> &str {
        "qa_testing"
    }

    fn description(&self) -> &str {
        "Run static quality checks (accessibility, leftovers, syntax) on generated code"
    }

    fn parameters(&self) -> Value {
        schema_of::<QaParams>()
    }

    async fn execute(&self, params: Value) -> anyhow::Result<Value> {
        let params: QaParams = serde_json::from_value(params)?;
        let checks: &[QaCheck] = if params.checks.is_empty() { &ALL_CHECKS } else { &params.checks };

        let issues = Self::run(&params.code, checks);
        let penalty = (issues.len() as u32).saturating_mul(PENALTY_PER_ISSUE);
        let score = 100u32.saturating_sub(penalty);

        Ok(json!({
            "passed": issues.is_empty(),
            "score": score,
            "checks": checks,
            "issues": issues,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_clean_code_scores_full_marks() {
        let code = "export const Logo = () => <img src=\"/logo.svg\" alt=\"Acme\" />;";
        let result = QaTestingTool::new().execute(json!({"code": code})).await.unwrap();
        assert_eq!(result["passed"], true);
        assert_eq!(result["score"], 100);
    }

    #[tokio::test]
    async fn test_reports_each_issue_with_line() {
        let code = "function App() {\n  console.log('x');\n  // TODO wire up\n  return <img src=\"a.png\">;\n";
        let result = QaTestingTool::new().execute(json!({"code": code})).await.unwrap();
        let issues = result["issues"].as_array().unwrap();
        assert_eq!(issues.len(), 4);
        assert_eq!(result["score"], 60);
        assert!(issues.iter().any(|i| i["check"] == "console" && i["line"] == 2));
        assert!(issues.iter().any(|i| i["check"] == "syntax" && i["message"] == "unclosed '{'"));
    }

    #[tokio::test]
    async fn test_selected_checks_only() {
        let code = "console.log(1)";
        let result = QaTestingTool::new()
            .execute(json!({"code": code, "checks": ["todo"]}))
            .await
            .unwrap();
        assert_eq!(result["passed"], true);
    }

    #[test]
    fn test_delimiters_inside_strings_ignored() {
        assert_eq!(unbalanced_delimiters("let s = \"(\";"), None);
        assert_eq!(unbalanced_delimiters("a)"), Some("unexpected ')'".to_string()));
    }
}
