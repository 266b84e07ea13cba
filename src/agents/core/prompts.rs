//! Prompt templates for the agent pipeline
//!
//! Templates are rendered with Tera; a plain `format!` rendering is used
//! if Tera rejects a template.

use serde_json::Value;
use tera::{Context, Tera};

use crate::agents::config::AgentConfig;
use crate::agents::domain::{PlanStep, Task};
use crate::agents::tools::ToolDefinition;

const CONTEXT_TEMPLATE: &str = "\
You are {{ name }}, a {{ role }}.
Goal: {{ goal }}
Backstory: {{ backstory }}

Task: {{ description }}
Expected output: {{ expected_output }}
{% if task_context %}
Context:
{{ task_context }}
{% endif %}{% if memories %}
Relevant memories:
{% for memory in memories %}- {{ memory }}
{% endfor %}{% endif %}
Available tools:
{% if tools %}{% for tool in tools %}- {{ tool.name }}: {{ tool.description }}
{% endfor %}{% else %}- none
{% endif %}";

const PLAN_TEMPLATE: &str = "\
{{ context }}
Break the task into concrete steps. Only use a tool if it is listed above.
Respond with JSON only, in this shape:
{% raw %}{\"steps\": [{\"action\": \"short_name\", \"tool\": \"tool_name or null\", \"parameters\": {}, \"expected_outcome\": \"what this step produces\"}]}{% endraw %}
";

const STEP_TEMPLATE: &str = "\
You are {{ name }}, a {{ role }}.
Task: {{ description }}
{% if task_context %}Context:
{{ task_context }}
{% endif %}
Current step: {{ action }}
Expected outcome: {{ expected_outcome }}
{% if previous %}
Previous step outputs:
{{ previous }}
{% endif %}";

const SYNTHESIS_TEMPLATE: &str = "\
You are {{ name }}, a {{ role }}.
Synthesize the step results below into the final deliverable for this task.
Task: {{ description }}
Expected output: {{ expected_output }}

Step results:
{{ results }}
";

fn render(name: &str, template: &str, context: &Context, fallback: impl FnOnce() -> String) -> String {
    match Tera::one_off(template, context, false) {
        Ok(rendered) => rendered,
        Err(e) => {
            tracing::warn!(template = name, "Failed to render prompt template: {}", e);
            fallback()
        }
    }
}

fn task_context(task: &Task) -> String {
    if task.context.is_empty() {
        String::new()
    } else {
        serde_json::to_string_pretty(&task.context).unwrap_or_default()
    }
}

fn json_lines(values: &[Value]) -> String {
    values
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

fn base_context(config: &AgentConfig, task: &Task) -> Context {
    let mut context = Context::new();
    context.insert("name", &config.name);
    context.insert("role", config.role.as_str());
    context.insert("description", &task.description);
    context.insert("expected_output", &task.expected_output);
    context.insert("task_context", &task_context(task));
    context
}

/// Role, goal, task, memories and tools as one block
pub fn context_prompt(
    config: &AgentConfig,
    task: &Task,
    memories: &[String],
    tools: &[ToolDefinition],
) -> String {
    let mut context = base_context(config, task);
    context.insert("goal", &config.goal);
    context.insert("backstory", &config.backstory);
    context.insert("memories", memories);
    context.insert("tools", tools);

    render("context", CONTEXT_TEMPLATE, &context, || {
        let tool_names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
        format!(
            "You are {}, a {}.\nGoal: {}\nBackstory: {}\n\nTask: {}\nExpected output: {}\n{}\nMemories:\n{}\nTools: {}\n",
            config.name,
            config.role,
            config.goal,
            config.backstory,
            task.description,
            task.expected_output,
            task_context(task),
            memories.join("\n"),
            tool_names.join(", ")
        )
    })
}

/// Ask for a JSON plan
pub fn plan_prompt(agent_context: &str) -> String {
    let mut context = Context::new();
    context.insert("context", agent_context);

    render("plan", PLAN_TEMPLATE, &context, || {
        format!(
            "{}\nRespond with JSON only: {{\"steps\": [{{\"action\": \"...\", \"tool\": null, \"parameters\": {{}}, \"expected_outcome\": \"...\"}}]}}\n",
            agent_context
        )
    })
}

/// Prompt for a plan step served by the model
pub fn step_prompt(config: &AgentConfig, task: &Task, step: &PlanStep, previous: &[Value]) -> String {
    let mut context = base_context(config, task);
    context.insert("action", &step.action);
    context.insert("expected_outcome", &step.expected_outcome);
    context.insert("previous", &json_lines(previous));

    render("step", STEP_TEMPLATE, &context, || {
        format!(
            "You are {}, a {}.\nTask: {}\nCurrent step: {}\nExpected outcome: {}\nPrevious step outputs:\n{}\n",
            config.name,
            config.role,
            task.description,
            step.action,
            step.expected_outcome,
            json_lines(previous)
        )
    })
}

/// Prompt that folds step results into the final answer
pub fn synthesis_prompt(config: &AgentConfig, task: &Task, results: &[Value]) -> String {
    let mut context = base_context(config, task);
    context.insert("results", &json_lines(results));

    render("synthesis", SYNTHESIS_TEMPLATE, &context, || {
        format!(
            "You are {}, a {}.\nSynthesize the step results below into the final deliverable.\nTask: {}\nExpected output: {}\n\nStep results:\n{}\n",
            config.name,
            config.role,
            task.description,
            task.expected_output,
            json_lines(results)
        )
    })
}
