//! Parses a graph document from JSON and executes it in sandbox mode.
//!
//! ```bash
//! cargo run --example minimal_graph
//! ```

use agentstudio::{execute_graph, AgentGraph, ExecutionMode};

const DOCUMENT: &str = r#"{
    "id": "minimal-1",
    "name": "Minimal Graph",
    "nodes": [
        {
            "id": "goal",
            "position": { "x": 0.0, "y": 0.0 },
            "data": { "type": "goal", "label": "Goal", "goal": "Say hello" }
        },
        {
            "id": "prompt",
            "position": { "x": 0.0, "y": 120.0 },
            "data": {
                "type": "prompt",
                "label": "Prompt",
                "template": "Write a greeting for: {goal}",
                "variables": ["goal"]
            }
        },
        {
            "id": "out",
            "position": { "x": 0.0, "y": 240.0 },
            "data": { "type": "output", "label": "Output", "format": "text" }
        }
    ],
    "edges": [
        { "id": "e1", "source": "goal", "target": "prompt" },
        { "id": "e2", "source": "prompt", "target": "out" }
    ]
}"#;

fn main() -> anyhow::Result<()> {
    agentstudio::LoggingConfig::init();

    let graph = AgentGraph::from_json(DOCUMENT)?;
    graph.validate()?;

    let run = execute_graph(graph, ExecutionMode::Sandbox);
    println!("{}", serde_json::to_string_pretty(&run)?);
    Ok(())
}
