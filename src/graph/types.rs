use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AgentStudioError, Result};

use super::nodes::{NodeData, NodeKind};

/// A user-assembled graph of typed agent steps.
///
/// The document may contain cycles; the executor rejects them at run time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentGraph {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub nodes: Vec<AgentNode>,
    pub edges: Vec<AgentEdge>,
    #[serde(default)]
    pub metadata: GraphMetadata,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphMetadata {
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub modified: Option<DateTime<Utc>>,
    #[serde(default)]
    pub version: Option<String>,
}

/// One typed step in a graph. Configuration is owned by the node and is
/// never mutated by the executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentNode {
    pub id: String,
    #[serde(default)]
    pub position: Position,
    pub data: NodeData,
}

impl AgentNode {
    pub fn kind(&self) -> NodeKind {
        self.data.kind()
    }

    pub fn label(&self) -> &str {
        self.data.label()
    }
}

/// Canvas placement, carried for document fidelity with the visual editor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Directed dependency between two nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl AgentGraph {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| AgentStudioError::Other(anyhow!("failed to parse graph document: {}", e)))
    }

    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value)
            .map_err(|e| AgentStudioError::Other(anyhow!("failed to parse graph value: {}", e)))
    }

    pub fn node(&self, node_id: &str) -> Option<&AgentNode> {
        self.nodes.iter().find(|n| n.id == node_id)
    }

    pub fn edges_from(&self, node_id: &str) -> Vec<&AgentEdge> {
        self.edges.iter().filter(|e| e.source == node_id).collect()
    }

    pub fn edges_to(&self, node_id: &str) -> Vec<&AgentEdge> {
        self.edges.iter().filter(|e| e.target == node_id).collect()
    }

    /// Nodes with no incoming edges, in declaration order.
    pub fn start_nodes(&self) -> Vec<&AgentNode> {
        let has_incoming: std::collections::HashSet<&str> =
            self.edges.iter().map(|e| e.target.as_str()).collect();
        self.nodes
            .iter()
            .filter(|n| !has_incoming.contains(n.id.as_str()))
            .collect()
    }

    /// Structural validation: unique ids and edges referencing known nodes.
    pub fn validate(&self) -> Result<()> {
        let mut node_ids = std::collections::HashSet::new();
        for node in &self.nodes {
            if !node_ids.insert(node.id.as_str()) {
                return Err(AgentStudioError::InvalidGraph(format!(
                    "duplicate node id `{}`",
                    node.id
                )));
            }
        }

        let mut edge_ids = std::collections::HashSet::new();
        for edge in &self.edges {
            if !edge_ids.insert(edge.id.as_str()) {
                return Err(AgentStudioError::InvalidGraph(format!(
                    "duplicate edge id `{}`",
                    edge.id
                )));
            }
            if !node_ids.contains(edge.source.as_str()) {
                return Err(AgentStudioError::InvalidGraph(format!(
                    "edge `{}` references unknown node `{}`",
                    edge.id, edge.source
                )));
            }
            if !node_ids.contains(edge.target.as_str()) {
                return Err(AgentStudioError::InvalidGraph(format!(
                    "edge `{}` references unknown node `{}`",
                    edge.id, edge.target
                )));
            }
        }

        Ok(())
    }
}
