use agentstudio::{
    execute_graph, execute_node, keys, ExecutionContext, ExecutionMode, GoalData, GraphBuilder,
    MemoryData, MemoryOperation, NodeData, OutputData, OutputFormat, PlannerData, PlannerStrategy,
    PolicyAction, PolicyCondition, PolicyData, PolicyRule, PromptData, RunStatus, ToolData,
    ToolType,
};
use serde_json::{json, Value};

fn ctx() -> ExecutionContext {
    ExecutionContext::default()
}

fn goal_node(text: &str) -> NodeData {
    NodeData::Goal(GoalData {
        label: "Goal".to_string(),
        goal: text.to_string(),
    })
}

fn memory_node(key: &str, operation: MemoryOperation) -> NodeData {
    NodeData::Memory(MemoryData {
        label: "Memory".to_string(),
        memory_key: key.to_string(),
        operation,
    })
}

fn policy_node(condition: PolicyCondition, action: PolicyAction) -> NodeData {
    NodeData::Policy(PolicyData {
        label: "Policy".to_string(),
        rules: vec![PolicyRule {
            id: "rule-1".to_string(),
            condition,
            action,
            message: None,
        }],
    })
}

#[test]
fn goal_node_stores_the_goal() {
    let mut ctx = ctx();
    let result = execute_node(&goal_node("Reduce churn"), &mut ctx, ExecutionMode::Sandbox);
    assert_eq!(result.summary, "Goal set: Reduce churn");
    assert!(result.error.is_none());
    assert_eq!(ctx.variable(keys::GOAL), Some(&json!("Reduce churn")));
}

#[test]
fn empty_goal_falls_back_to_placeholder() {
    let mut ctx = ctx();
    execute_node(&goal_node(""), &mut ctx, ExecutionMode::Sandbox);
    assert_eq!(ctx.variable(keys::GOAL), Some(&json!("No goal specified")));
}

#[test]
fn prompt_substitutes_context_variables_in_sandbox() {
    let mut ctx = ctx();
    ctx.set_variable(keys::GOAL, json!("upsell Acme"));
    let node = NodeData::Prompt(PromptData {
        label: "Prompt".to_string(),
        template: "Draft a note about {goal}".to_string(),
        variables: vec!["goal".to_string()],
    });

    let result = execute_node(&node, &mut ctx, ExecutionMode::Sandbox);
    assert_eq!(result.summary, "Prompt executed (sandbox)");
    assert_eq!(
        result.output,
        json!("[Simulated response to: Draft a note about upsell Acme]")
    );
    assert_eq!(
        ctx.variable(keys::LAST_PROMPT_RESPONSE),
        Some(&result.output)
    );
}

#[test]
fn prompt_in_byok_mode_keeps_the_rendered_text() {
    let mut ctx = ctx();
    ctx.set_variable(keys::GOAL, json!("renewals"));
    let node = NodeData::Prompt(PromptData {
        label: "Prompt".to_string(),
        template: "Focus: {goal}".to_string(),
        variables: vec!["goal".to_string()],
    });

    let result = execute_node(&node, &mut ctx, ExecutionMode::Byok);
    assert_eq!(result.summary, "Prompt prepared for LLM");
    assert_eq!(result.output, json!("Focus: renewals"));
    assert_eq!(ctx.variable(keys::LAST_PROMPT), Some(&json!("Focus: renewals")));
    assert!(ctx.variable(keys::LAST_PROMPT_RESPONSE).is_none());
}

#[test]
fn missing_prompt_variables_render_as_empty() {
    let mut ctx = ctx();
    let node = NodeData::Prompt(PromptData {
        label: "Prompt".to_string(),
        template: "Hello {name}!".to_string(),
        variables: vec!["name".to_string()],
    });
    let result = execute_node(&node, &mut ctx, ExecutionMode::Byok);
    assert_eq!(result.output, json!("Hello !"));
}

#[test]
fn memory_append_preserves_insertion_order() {
    let mut ctx = ctx();
    ctx.set_variable(keys::LAST_OUTPUT, json!("first"));
    execute_node(&memory_node("log", MemoryOperation::Append), &mut ctx, ExecutionMode::Sandbox);
    ctx.set_variable(keys::LAST_OUTPUT, json!("second"));
    let result = execute_node(
        &memory_node("log", MemoryOperation::Append),
        &mut ctx,
        ExecutionMode::Sandbox,
    );

    assert_eq!(result.summary, "Appended to memory[log]");
    assert_eq!(ctx.memory.get("log"), Some(&json!(["first", "second"])));
}

#[test]
fn memory_write_then_read_round_trips() {
    let mut ctx = ctx();
    ctx.set_variable(keys::LAST_OUTPUT, json!({ "score": 85 }));
    execute_node(&memory_node("note", MemoryOperation::Write), &mut ctx, ExecutionMode::Sandbox);

    let result = execute_node(
        &memory_node("note", MemoryOperation::Read),
        &mut ctx,
        ExecutionMode::Sandbox,
    );
    assert_eq!(result.summary, "Read memory[note]: found");
    assert_eq!(result.output, json!({ "score": 85 }));
}

#[test]
fn memory_read_of_unknown_key_is_empty() {
    let mut ctx = ctx();
    let result = execute_node(
        &memory_node("missing", MemoryOperation::Read),
        &mut ctx,
        ExecutionMode::Sandbox,
    );
    assert_eq!(result.summary, "Read memory[missing]: empty");
    assert_eq!(result.output, Value::Null);
}

#[test]
fn memory_write_falls_back_to_prompt_response() {
    let mut ctx = ctx();
    ctx.set_variable(keys::LAST_PROMPT_RESPONSE, json!("simulated"));
    execute_node(&memory_node("note", MemoryOperation::Write), &mut ctx, ExecutionMode::Sandbox);
    assert_eq!(ctx.memory.get("note"), Some(&json!("simulated")));
}

#[test]
fn memory_prefers_last_output_over_prompt_response() {
    let mut ctx = ctx();
    ctx.set_variable(keys::LAST_OUTPUT, json!("direct"));
    ctx.set_variable(keys::LAST_PROMPT_RESPONSE, json!("simulated"));
    execute_node(&memory_node("note", MemoryOperation::Write), &mut ctx, ExecutionMode::Sandbox);
    assert_eq!(ctx.memory.get("note"), Some(&json!("direct")));
}

#[test]
fn memory_append_with_empty_context_stores_null() {
    let mut ctx = ctx();
    execute_node(&memory_node("log", MemoryOperation::Append), &mut ctx, ExecutionMode::Sandbox);
    assert_eq!(ctx.memory.get("log"), Some(&json!([null])));
}

#[test]
fn sensitive_data_deny_rule_aborts() {
    let mut ctx = ctx();
    ctx.set_variable(keys::LAST_OUTPUT, json!("my password is hunter2"));
    let result = execute_node(
        &policy_node(PolicyCondition::NoSensitiveData, PolicyAction::Deny),
        &mut ctx,
        ExecutionMode::Sandbox,
    );

    assert!(ctx.aborted);
    assert_eq!(result.summary, "Policy violations detected");
    assert_eq!(result.error.as_deref(), Some("Sensitive data detected"));
    assert_eq!(result.output, json!({ "violations": ["Sensitive data detected"] }));
}

#[test]
fn policy_deny_halts_downstream_nodes() {
    let graph = GraphBuilder::new("guarded")
        .node("leak", goal_node("the api_key is sk-123"))
        .node(
            "policy",
            policy_node(PolicyCondition::NoSensitiveData, PolicyAction::Deny),
        )
        .node(
            "out",
            NodeData::Output(OutputData {
                label: "Out".to_string(),
                format: OutputFormat::Text,
            }),
        )
        .edge("leak", "policy")
        .edge("policy", "out")
        .build();

    let run = execute_graph(graph, ExecutionMode::Sandbox);
    assert_eq!(run.status, RunStatus::Aborted);
    assert_eq!(run.trace.len(), 2);
    assert!(run.error.as_deref().unwrap().contains("Sensitive data"));
}

#[test]
fn oversized_output_trips_the_length_rule() {
    let mut ctx = ctx();
    ctx.set_variable(keys::LAST_OUTPUT, json!("y".repeat(1001)));
    let result = execute_node(
        &policy_node(PolicyCondition::MaxOutputLength, PolicyAction::Deny),
        &mut ctx,
        ExecutionMode::Sandbox,
    );
    assert!(ctx.aborted);
    assert_eq!(result.error.as_deref(), Some("Output too long"));
}

#[test]
fn warn_rules_never_abort() {
    let mut ctx = ctx();
    ctx.set_variable(keys::LAST_OUTPUT, json!("contains a secret"));
    let result = execute_node(
        &policy_node(PolicyCondition::NoSensitiveData, PolicyAction::Warn),
        &mut ctx,
        ExecutionMode::Sandbox,
    );
    assert!(!ctx.aborted);
    assert!(result.error.is_none());
    assert_eq!(result.summary, "Policy check passed (1 rules)");
}

#[test]
fn clean_output_passes_policy() {
    let mut ctx = ctx();
    ctx.set_variable(keys::LAST_OUTPUT, json!("all clear"));
    let result = execute_node(
        &policy_node(PolicyCondition::NoSensitiveData, PolicyAction::Deny),
        &mut ctx,
        ExecutionMode::Sandbox,
    );
    assert!(!ctx.aborted);
    assert_eq!(result.output, json!({ "passed": true }));
}

#[test]
fn crm_tool_applies_filters_from_parameters() {
    let mut ctx = ctx();
    let mut parameters = serde_json::Map::new();
    parameters.insert("filters".to_string(), json!({ "minHealthScore": 80 }));
    let node = NodeData::Tool(ToolData {
        label: "CRM".to_string(),
        tool_type: ToolType::SimCrm,
        parameters,
    });

    let result = execute_node(&node, &mut ctx, ExecutionMode::Sandbox);
    assert_eq!(result.summary, "CRM query: 2 customers found");
    let names: Vec<&str> = result.output
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Acme Corp", "Global Systems"]);
    assert_eq!(ctx.variable(keys::CRM_RESULTS), Some(&result.output));
}

#[test]
fn ticket_tool_filters_by_customer() {
    let mut ctx = ctx();
    let mut parameters = serde_json::Map::new();
    parameters.insert("filters".to_string(), json!({ "customerId": "CUST-002" }));
    let node = NodeData::Tool(ToolData {
        label: "Tickets".to_string(),
        tool_type: ToolType::SimTicket,
        parameters,
    });

    let result = execute_node(&node, &mut ctx, ExecutionMode::Sandbox);
    assert_eq!(result.summary, "Ticket query: 2 tickets found");
}

#[test]
fn web_search_reads_query_from_context_when_unset() {
    let mut ctx = ctx();
    ctx.set_variable(keys::QUERY, json!("ai agent frameworks overview"));
    let node = NodeData::Tool(ToolData {
        label: "Search".to_string(),
        tool_type: ToolType::SimWebSearch,
        parameters: serde_json::Map::new(),
    });

    let result = execute_node(&node, &mut ctx, ExecutionMode::Sandbox);
    assert_eq!(
        result.summary,
        "Web search: \"ai agent frameworks overview\" (1 results)"
    );
}

#[test]
fn invalid_tool_filters_become_an_error_envelope() {
    let mut ctx = ctx();
    let mut parameters = serde_json::Map::new();
    parameters.insert("filters".to_string(), json!({ "minHealthScore": "not a number" }));
    let node = NodeData::Tool(ToolData {
        label: "CRM".to_string(),
        tool_type: ToolType::SimCrm,
        parameters,
    });

    let result = execute_node(&node, &mut ctx, ExecutionMode::Sandbox);
    assert_eq!(result.summary, "Error");
    assert!(result.error.as_deref().unwrap().contains("invalid tool filters"));
    assert_eq!(result.output, Value::Null);
}

#[test]
fn planner_clips_to_max_steps() {
    let mut ctx = ctx();
    ctx.set_variable(keys::CRM_RESULTS, json!([
        { "id": "CUST-002", "name": "TechStart Inc", "tier": "Pro", "mrr": 500,
          "status": "at-risk", "healthScore": 45, "renewalDate": "2024-03-20",
          "contactEmail": "sarah@techstart.com" }
    ]));
    ctx.set_variable(keys::TICKET_RESULTS, json!([
        { "id": "TICK-101", "customerId": "CUST-002", "subject": "Dark mode",
          "status": "open", "priority": "medium", "created": "2024-01-15T10:30:00Z",
          "description": "Requested." }
    ]));
    let node = NodeData::Planner(PlannerData {
        label: "Plan".to_string(),
        max_steps: 2,
        strategy: PlannerStrategy::Sequential,
    });

    let result = execute_node(&node, &mut ctx, ExecutionMode::Sandbox);
    assert_eq!(result.summary, "Context-aware plan: 2 steps with 2 data points");
    assert_eq!(result.output["steps"].as_array().unwrap().len(), 2);
    assert_eq!(result.output["dataContext"]["crmRecords"], 1);
}

#[test]
fn planner_without_data_uses_the_generic_plan() {
    let mut ctx = ctx();
    let node = NodeData::Planner(PlannerData {
        label: "Plan".to_string(),
        max_steps: 5,
        strategy: PlannerStrategy::Adaptive,
    });

    let result = execute_node(&node, &mut ctx, ExecutionMode::Sandbox);
    assert_eq!(result.summary, "Context-aware plan: 5 steps with 0 data points");
    assert_eq!(result.output["goal"], "No goal set");
    assert_eq!(
        result.output["steps"][0]["action"],
        "Gather context and requirements"
    );
}

#[test]
fn human_approval_auto_approves() {
    let mut ctx = ctx();
    let node = NodeData::HumanApproval(agentstudio::HumanApprovalData {
        label: "Gate".to_string(),
        prompt: String::new(),
        require_approval: true,
    });
    let result = execute_node(&node, &mut ctx, ExecutionMode::Sandbox);
    assert_eq!(result.summary, "Human approval: Approved (auto)");
    assert_eq!(ctx.variable(keys::HUMAN_APPROVED), Some(&json!(true)));
    assert_eq!(result.output["prompt"], "Approve to continue?");
}

#[test]
fn json_output_includes_collected_data() {
    let mut ctx = ctx();
    ctx.set_variable(keys::GOAL, json!("wrap up"));
    let node = NodeData::Output(OutputData {
        label: "Out".to_string(),
        format: OutputFormat::Json,
    });

    let result = execute_node(&node, &mut ctx, ExecutionMode::Sandbox);
    assert_eq!(result.summary, "Output generated (json)");
    let payload: Value = serde_json::from_str(result.output.as_str().unwrap()).unwrap();
    assert_eq!(payload["goal"], "wrap up");
    assert_eq!(payload["data"]["crmResults"], json!([]));
    assert_eq!(ctx.variable(keys::FINAL_OUTPUT), Some(&result.output));
}

#[test]
fn markdown_output_without_data_dumps_the_last_output() {
    let mut ctx = ctx();
    ctx.set_variable(keys::LAST_OUTPUT, json!("plain result"));
    let node = NodeData::Output(OutputData {
        label: "Out".to_string(),
        format: OutputFormat::Markdown,
    });
    let result = execute_node(&node, &mut ctx, ExecutionMode::Sandbox);
    assert_eq!(result.output, json!("# Output\n\nplain result"));
}
