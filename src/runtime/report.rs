//! Rendering for output nodes: plain text, JSON, and the markdown
//! support-analysis report.

use serde_json::{json, Value};

use crate::error::Result;
use crate::graph::OutputFormat;
use crate::sandbox::{CustomerRecord, TicketRecord};

use super::context::{keys, ExecutionContext};
use super::handlers::{typed_variable, PlanStep};

pub(crate) fn render(format: OutputFormat, ctx: &ExecutionContext) -> Result<Value> {
    match format {
        OutputFormat::Json => {
            let payload = json!({
                "goal": ctx.variable(keys::GOAL).cloned().unwrap_or(Value::Null),
                "plan": ctx.variable(keys::PLAN).cloned().unwrap_or(Value::Null),
                "data": {
                    "crmResults": array_variable(ctx, keys::CRM_RESULTS),
                    "ticketResults": array_variable(ctx, keys::TICKET_RESULTS),
                },
                "summary": "Complete execution data",
            });
            Ok(Value::String(serde_json::to_string_pretty(&payload)?))
        }
        OutputFormat::Markdown => {
            let plan = ctx.variable(keys::PLAN);
            let crm: Vec<CustomerRecord> = typed_variable(ctx, keys::CRM_RESULTS);
            let tickets: Vec<TicketRecord> = typed_variable(ctx, keys::TICKET_RESULTS);

            if let Some(plan) = plan.filter(|_| !crm.is_empty() && !tickets.is_empty()) {
                Ok(Value::String(support_analysis(ctx, plan, &crm, &tickets)))
            } else {
                let body = match fallback_data(ctx) {
                    Value::String(text) => text,
                    other => serde_json::to_string_pretty(&other)?,
                };
                Ok(Value::String(format!("# Output\n\n{}", body)))
            }
        }
        OutputFormat::Text => {
            let body = match fallback_data(ctx) {
                Value::String(text) => text,
                other => serde_json::to_string(&other)?,
            };
            Ok(Value::String(body))
        }
    }
}

/// Most recent output, falling back to the prompt response, then to a dump
/// of run memory.
fn fallback_data(ctx: &ExecutionContext) -> Value {
    ctx.variable(keys::LAST_OUTPUT)
        .or_else(|| ctx.variable(keys::LAST_PROMPT_RESPONSE))
        .cloned()
        .unwrap_or_else(|| Value::Object(ctx.memory.clone()))
}

fn array_variable(ctx: &ExecutionContext, key: &str) -> Value {
    ctx.variable(key)
        .cloned()
        .unwrap_or_else(|| Value::Array(Vec::new()))
}

/// Structured report cross-referencing at-risk customers with their open
/// tickets and the planner's step list.
fn support_analysis(
    ctx: &ExecutionContext,
    plan: &Value,
    crm: &[CustomerRecord],
    tickets: &[TicketRecord],
) -> String {
    let goal = ctx
        .variable(keys::GOAL)
        .and_then(Value::as_str)
        .unwrap_or("No goal set");
    let at_risk: Vec<&CustomerRecord> = crm.iter().filter(|c| c.status == "at-risk").collect();
    let high_priority = tickets.iter().filter(|t| t.priority == "high").count();
    let steps: Vec<PlanStep> = plan
        .get("steps")
        .cloned()
        .and_then(|value| serde_json::from_value(value).ok())
        .unwrap_or_default();

    let mut out = String::new();
    out.push_str("# Support Agent Analysis\n\n");
    out.push_str(&format!("**Goal:** {}\n\n", goal));

    out.push_str("## Executive Summary\n\n");
    out.push_str(&format!(
        "- **{}** at-risk customers identified\n",
        at_risk.len()
    ));
    out.push_str(&format!("- **{}** open/in-progress tickets\n", tickets.len()));
    out.push_str(&format!("- **{}** high-priority issues\n\n", high_priority));

    out.push_str("## Critical Customers\n\n");
    for customer in &at_risk {
        let customer_tickets: Vec<&TicketRecord> = tickets
            .iter()
            .filter(|t| t.customer_id == customer.id)
            .collect();
        out.push_str(&format!("### {} ({})\n", customer.name, customer.tier));
        out.push_str(&format!(
            "- Health Score: **{}/100**\n",
            customer.health_score
        ));
        out.push_str(&format!("- MRR: ${}\n", customer.mrr));
        out.push_str(&format!("- Renewal: {}\n", customer.renewal_date));
        out.push_str(&format!("- Active Tickets: {}\n\n", customer_tickets.len()));

        if !customer_tickets.is_empty() {
            out.push_str("**Recent Issues:**\n");
            for ticket in &customer_tickets {
                out.push_str(&format!(
                    "- [{}] {} ({})\n",
                    ticket.id, ticket.subject, ticket.status
                ));
            }
            out.push('\n');
        }
    }

    out.push_str("## Recommended Actions\n\n");
    for (index, step) in steps.iter().enumerate() {
        out.push_str(&format!("{}. **{}**\n", index + 1, step.action));
        for detail in &step.details {
            out.push_str(&format!("   - {}\n", detail));
        }
        out.push('\n');
    }

    out.push_str("## Next Steps\n\n");
    let first_at_risk = at_risk
        .first()
        .map(|c| c.name.as_str())
        .unwrap_or("at-risk customers");
    out.push_str(&format!(
        "1. Reach out to {} within 24 hours\n",
        first_at_risk
    ));
    out.push_str("2. Prioritize high-priority tickets for immediate resolution\n");
    out.push_str("3. Schedule health check calls with customers below 50 health score\n");
    out.push_str("4. Monitor ticket resolution progress daily\n");
    out
}
