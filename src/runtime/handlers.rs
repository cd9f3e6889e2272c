use anyhow::anyhow;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::warn;

use crate::error::Result;
use crate::graph::{
    GoalData, HumanApprovalData, MemoryData, MemoryOperation, NodeData, OutputData, PlannerData,
    PolicyAction, PolicyCondition, PolicyData, PromptData, ToolData, ToolType,
};
use crate::sandbox::{
    sim_crm_query, sim_ticket_query, sim_web_search, CrmFilters, CustomerRecord, SearchResult,
    TicketFilters, TicketRecord,
};
use crate::utils::truncate;

use super::context::{keys, ExecutionContext};
use super::report;
use super::trace::ExecutionMode;

/// Result envelope produced by every node handler. Ordinary domain failures
/// travel in `error`; the walk itself never unwinds.
#[derive(Debug, Clone)]
pub struct NodeExecutionResult {
    pub output: Value,
    pub summary: String,
    pub error: Option<String>,
}

impl NodeExecutionResult {
    fn ok(output: Value, summary: impl Into<String>) -> Self {
        Self {
            output,
            summary: summary.into(),
            error: None,
        }
    }
}

/// Dispatches a node to the handler for its kind. Any internal failure is
/// converted into an error envelope here so callers see data, not panics.
pub fn execute_node(
    data: &NodeData,
    ctx: &mut ExecutionContext,
    mode: ExecutionMode,
) -> NodeExecutionResult {
    let outcome = match data {
        NodeData::Goal(data) => goal(data, ctx),
        NodeData::Prompt(data) => prompt(data, ctx, mode),
        NodeData::Planner(data) => planner(data, ctx),
        NodeData::Memory(data) => memory(data, ctx),
        NodeData::Tool(data) => tool(data, ctx),
        NodeData::Policy(data) => policy(data, ctx),
        NodeData::HumanApproval(data) => human_approval(data, ctx),
        NodeData::Output(data) => output(data, ctx),
    };

    outcome.unwrap_or_else(|err| NodeExecutionResult {
        output: Value::Null,
        summary: "Error".to_string(),
        error: Some(err.to_string()),
    })
}

fn goal(data: &GoalData, ctx: &mut ExecutionContext) -> Result<NodeExecutionResult> {
    let goal = if data.goal.is_empty() {
        "No goal specified".to_string()
    } else {
        data.goal.clone()
    };
    ctx.set_variable(keys::GOAL, Value::String(goal.clone()));
    let summary = format!("Goal set: {}", truncate(&goal, 60));
    Ok(NodeExecutionResult::ok(Value::String(goal), summary))
}

fn prompt(
    data: &PromptData,
    ctx: &mut ExecutionContext,
    mode: ExecutionMode,
) -> Result<NodeExecutionResult> {
    let mut rendered = data.template.clone();
    for name in &data.variables {
        let value = ctx.variable(name).map(value_to_string).unwrap_or_default();
        rendered = rendered.replace(&format!("{{{}}}", name), &value);
    }

    match mode {
        ExecutionMode::Sandbox => {
            let response = format!("[Simulated response to: {}]", truncate(&rendered, 50));
            ctx.set_variable(keys::LAST_PROMPT_RESPONSE, Value::String(response.clone()));
            Ok(NodeExecutionResult::ok(
                Value::String(response),
                "Prompt executed (sandbox)",
            ))
        }
        // The rendered prompt is forwarded to the LLM by the calling layer,
        // never from inside the run.
        ExecutionMode::Byok => {
            ctx.set_variable(keys::LAST_PROMPT, Value::String(rendered.clone()));
            Ok(NodeExecutionResult::ok(
                Value::String(rendered),
                "Prompt prepared for LLM",
            ))
        }
    }
}

/// One entry of a planner-produced step list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanStep {
    pub step: u32,
    pub action: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

fn planner(data: &PlannerData, ctx: &mut ExecutionContext) -> Result<NodeExecutionResult> {
    let goal = ctx
        .variable(keys::GOAL)
        .map(value_to_string)
        .unwrap_or_else(|| "No goal set".to_string());
    let crm: Vec<CustomerRecord> = typed_variable(ctx, keys::CRM_RESULTS);
    let tickets: Vec<TicketRecord> = typed_variable(ctx, keys::TICKET_RESULTS);
    let search: Vec<SearchResult> = typed_variable(ctx, keys::SEARCH_RESULTS);

    // Fixed decision table keyed on which upstream result sets are present.
    let steps = if !crm.is_empty() && !tickets.is_empty() {
        support_plan(&crm, &tickets)
    } else if !search.is_empty() {
        research_plan(&search)
    } else {
        generic_plan()
    };

    let clipped: Vec<PlanStep> = steps.into_iter().take(data.max_steps as usize).collect();
    let step_count = clipped.len();
    let data_points = crm.len() + tickets.len() + search.len();

    let plan = json!({
        "goal": goal,
        "steps": clipped,
        "strategy": data.strategy,
        "dataContext": {
            "crmRecords": crm.len(),
            "tickets": tickets.len(),
            "searchResults": search.len(),
        },
    });
    ctx.set_variable(keys::PLAN, plan.clone());

    Ok(NodeExecutionResult::ok(
        plan,
        format!(
            "Context-aware plan: {} steps with {} data points",
            step_count, data_points
        ),
    ))
}

fn support_plan(crm: &[CustomerRecord], tickets: &[TicketRecord]) -> Vec<PlanStep> {
    let at_risk = crm.iter().filter(|c| c.status == "at-risk").count();
    let high_priority = tickets.iter().filter(|t| t.priority == "high").count();

    vec![
        PlanStep {
            step: 1,
            action: format!("Identify at-risk customers ({} found)", at_risk),
            details: crm
                .iter()
                .take(2)
                .map(|c| format!("{}: Health {}", c.name, c.health_score))
                .collect(),
        },
        PlanStep {
            step: 2,
            action: format!("Review critical tickets ({} high priority)", high_priority),
            details: tickets
                .iter()
                .take(2)
                .map(|t| format!("{}: {}", t.id, t.subject))
                .collect(),
        },
        PlanStep {
            step: 3,
            action: "Correlate customer health with ticket patterns".to_string(),
            details: vec!["Cross-reference ticket volume with health scores".to_string()],
        },
        PlanStep {
            step: 4,
            action: "Generate personalized outreach plan".to_string(),
            details: vec!["Prioritize customers with multiple high-priority tickets".to_string()],
        },
        PlanStep {
            step: 5,
            action: "Deliver actionable recommendations".to_string(),
            details: vec!["Include specific actions and timelines".to_string()],
        },
    ]
}

fn research_plan(search: &[SearchResult]) -> Vec<PlanStep> {
    vec![
        PlanStep {
            step: 1,
            action: "Gather research data".to_string(),
            details: vec![format!("Found {} sources", search.len())],
        },
        PlanStep {
            step: 2,
            action: "Analyze key findings".to_string(),
            details: vec!["Extract main insights".to_string()],
        },
        PlanStep {
            step: 3,
            action: "Synthesize information".to_string(),
            details: vec!["Combine multiple perspectives".to_string()],
        },
        PlanStep {
            step: 4,
            action: "Generate summary".to_string(),
            details: vec!["Create actionable report".to_string()],
        },
    ]
}

fn generic_plan() -> Vec<PlanStep> {
    [
        "Gather context and requirements",
        "Analyze available data",
        "Generate solution approach",
        "Execute and validate",
        "Deliver results",
    ]
    .iter()
    .enumerate()
    .map(|(index, action)| PlanStep {
        step: index as u32 + 1,
        action: action.to_string(),
        details: Vec::new(),
    })
    .collect()
}

/// Most recent value worth remembering: the last node output, else the
/// last prompt response.
fn latest_output(ctx: &ExecutionContext) -> Value {
    ctx.variable(keys::LAST_OUTPUT)
        .or_else(|| ctx.variable(keys::LAST_PROMPT_RESPONSE))
        .cloned()
        .unwrap_or(Value::Null)
}

fn memory(data: &MemoryData, ctx: &mut ExecutionContext) -> Result<NodeExecutionResult> {
    let key = if data.memory_key.is_empty() {
        "default"
    } else {
        data.memory_key.as_str()
    };

    match data.operation {
        MemoryOperation::Read => {
            let value = ctx.memory.get(key).cloned();
            let summary = format!(
                "Read memory[{}]: {}",
                key,
                if value.is_some() { "found" } else { "empty" }
            );
            Ok(NodeExecutionResult::ok(value.unwrap_or(Value::Null), summary))
        }
        MemoryOperation::Write => {
            let value = latest_output(ctx);
            ctx.memory.insert(key.to_string(), value.clone());
            Ok(NodeExecutionResult::ok(
                value,
                format!("Wrote to memory[{}]", key),
            ))
        }
        MemoryOperation::Append => {
            let value = latest_output(ctx);
            let entry = ctx
                .memory
                .entry(key.to_string())
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(items) = entry {
                items.push(value);
            }
            let stored = ctx.memory.get(key).cloned().unwrap_or(Value::Null);
            Ok(NodeExecutionResult::ok(
                stored,
                format!("Appended to memory[{}]", key),
            ))
        }
    }
}

fn tool(data: &ToolData, ctx: &mut ExecutionContext) -> Result<NodeExecutionResult> {
    match data.tool_type {
        ToolType::SimWebSearch => {
            let query = data
                .parameters
                .get("query")
                .map(value_to_string)
                .or_else(|| ctx.variable(keys::QUERY).map(value_to_string))
                .unwrap_or_else(|| "default search".to_string());
            let results = sim_web_search(&query);
            let summary = format!(
                "Web search: \"{}\" ({} results)",
                truncate(&query, 40),
                results.len()
            );
            let value = serde_json::to_value(results)?;
            ctx.set_variable(keys::SEARCH_RESULTS, value.clone());
            Ok(NodeExecutionResult::ok(value, summary))
        }
        ToolType::SimCrm => {
            let filters: Option<CrmFilters> = parse_filters(&data.parameters)?;
            let results = sim_crm_query(filters.as_ref());
            let summary = format!("CRM query: {} customers found", results.len());
            let value = serde_json::to_value(results)?;
            ctx.set_variable(keys::CRM_RESULTS, value.clone());
            Ok(NodeExecutionResult::ok(value, summary))
        }
        ToolType::SimTicket => {
            let filters: Option<TicketFilters> = parse_filters(&data.parameters)?;
            let results = sim_ticket_query(filters.as_ref());
            let summary = format!("Ticket query: {} tickets found", results.len());
            let value = serde_json::to_value(results)?;
            ctx.set_variable(keys::TICKET_RESULTS, value.clone());
            Ok(NodeExecutionResult::ok(value, summary))
        }
    }
}

fn parse_filters<T: serde::de::DeserializeOwned>(
    parameters: &Map<String, Value>,
) -> Result<Option<T>> {
    match parameters.get("filters") {
        Some(value) => {
            let filters = serde_json::from_value(value.clone())
                .map_err(|e| anyhow!("invalid tool filters: {}", e))?;
            Ok(Some(filters))
        }
        None => Ok(None),
    }
}

static SENSITIVE_DATA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)password|api[_-]?key|secret|token").expect("valid pattern"));

/// The only handler permitted to set the abort flag directly.
fn policy(data: &PolicyData, ctx: &mut ExecutionContext) -> Result<NodeExecutionResult> {
    let mut violations = Vec::new();

    for rule in &data.rules {
        let triggered = match rule.condition {
            PolicyCondition::MaxOutputLength => ctx
                .last_output()
                .and_then(Value::as_str)
                .map(|s| s.len() > 1000)
                .unwrap_or(false),
            PolicyCondition::NoSensitiveData => {
                let serialized = ctx
                    .last_output()
                    .cloned()
                    .unwrap_or_else(|| Value::String(String::new()))
                    .to_string();
                SENSITIVE_DATA.is_match(&serialized)
            }
        };

        if !triggered {
            continue;
        }
        match rule.action {
            PolicyAction::Deny => violations.push(
                rule.message
                    .clone()
                    .unwrap_or_else(|| default_violation_message(rule.condition).to_string()),
            ),
            PolicyAction::Warn => {
                warn!(rule = %rule.id, condition = ?rule.condition, "policy rule triggered");
            }
            PolicyAction::Allow => {}
        }
    }

    if !violations.is_empty() {
        ctx.aborted = true;
        return Ok(NodeExecutionResult {
            output: json!({ "violations": violations }),
            summary: "Policy violations detected".to_string(),
            error: Some(violations.join("; ")),
        });
    }

    Ok(NodeExecutionResult::ok(
        json!({ "passed": true }),
        format!("Policy check passed ({} rules)", data.rules.len()),
    ))
}

fn default_violation_message(condition: PolicyCondition) -> &'static str {
    match condition {
        PolicyCondition::MaxOutputLength => "Output too long",
        PolicyCondition::NoSensitiveData => "Sensitive data detected",
    }
}

/// Auto-approves: there is no suspend/resume path in the executor, so runs
/// never pause for a real human response.
fn human_approval(
    data: &HumanApprovalData,
    ctx: &mut ExecutionContext,
) -> Result<NodeExecutionResult> {
    let prompt = if data.prompt.is_empty() {
        "Approve to continue?".to_string()
    } else {
        data.prompt.clone()
    };
    ctx.set_variable(keys::HUMAN_APPROVED, Value::Bool(true));
    Ok(NodeExecutionResult::ok(
        json!({ "approved": true, "prompt": prompt }),
        "Human approval: Approved (auto)",
    ))
}

fn output(data: &OutputData, ctx: &mut ExecutionContext) -> Result<NodeExecutionResult> {
    let rendered = report::render(data.format, ctx)?;
    ctx.set_variable(keys::FINAL_OUTPUT, rendered.clone());
    Ok(NodeExecutionResult::ok(
        rendered,
        format!("Output generated ({})", data.format),
    ))
}

pub(crate) fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub(crate) fn typed_variable<T: serde::de::DeserializeOwned + Default>(
    ctx: &ExecutionContext,
    key: &str,
) -> T {
    ctx.variable(key)
        .cloned()
        .and_then(|value| serde_json::from_value(value).ok())
        .unwrap_or_default()
}
