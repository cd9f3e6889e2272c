//! End-to-end sandbox run of the customer-support analysis graph.
//!
//! ```bash
//! cargo run --example support_agent
//! ```

use agentstudio::{
    execute_graph, ExecutionMode, GoalData, GraphBuilder, NodeData, OutputData, OutputFormat,
    PlannerData, PlannerStrategy, ToolData, ToolType,
};
use serde_json::json;

fn main() {
    agentstudio::LoggingConfig::init();

    let mut crm_params = serde_json::Map::new();
    crm_params.insert("filters".to_string(), json!({ "status": "at-risk" }));
    let mut ticket_params = serde_json::Map::new();
    ticket_params.insert("filters".to_string(), json!({ "customerId": "CUST-002" }));

    let graph = GraphBuilder::new("Support Agent")
        .with_description("Analyzes at-risk customers and drafts an outreach plan")
        .node(
            "goal",
            NodeData::Goal(GoalData {
                label: "Set Goal".to_string(),
                goal: "Analyze at-risk customers and create an outreach plan".to_string(),
            }),
        )
        .node(
            "crm",
            NodeData::Tool(ToolData {
                label: "CRM Lookup".to_string(),
                tool_type: ToolType::SimCrm,
                parameters: crm_params,
            }),
        )
        .node(
            "tickets",
            NodeData::Tool(ToolData {
                label: "Ticket Lookup".to_string(),
                tool_type: ToolType::SimTicket,
                parameters: ticket_params,
            }),
        )
        .node(
            "plan",
            NodeData::Planner(PlannerData {
                label: "Plan Outreach".to_string(),
                max_steps: 5,
                strategy: PlannerStrategy::Sequential,
            }),
        )
        .node(
            "report",
            NodeData::Output(OutputData {
                label: "Report".to_string(),
                format: OutputFormat::Markdown,
            }),
        )
        .edge("goal", "crm")
        .edge("crm", "tickets")
        .edge("tickets", "plan")
        .edge("plan", "report")
        .build();

    let run = execute_graph(graph, ExecutionMode::Sandbox);

    println!("run {} finished: {:?}\n", run.id, run.status);
    for entry in &run.trace {
        println!("  [{}] {} -> {}", entry.node_kind, entry.node_name, entry.output_summary);
    }
    if let Some(report) = run.final_output.as_ref().and_then(|v| v.as_str()) {
        println!("\n{}", report);
    }
}
