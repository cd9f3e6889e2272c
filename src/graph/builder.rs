use chrono::Utc;

use crate::utils::generate_id;

use super::nodes::NodeData;
use super::types::{AgentEdge, AgentGraph, AgentNode, GraphMetadata, Position};

/// Assembles graph documents in code; used by tests and demos in place of
/// the visual editor.
pub struct GraphBuilder {
    id: String,
    name: String,
    description: String,
    nodes: Vec<AgentNode>,
    edges: Vec<AgentEdge>,
}

impl GraphBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: generate_id("graph"),
            name: name.into(),
            description: String::new(),
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn node(mut self, id: impl Into<String>, data: NodeData) -> Self {
        self.nodes.push(AgentNode {
            id: id.into(),
            position: Position::default(),
            data,
        });
        self
    }

    pub fn edge(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        let source = source.into();
        let target = target.into();
        let id = format!("{}->{}", source, target);
        self.edges.push(AgentEdge {
            id,
            source,
            target,
            label: None,
        });
        self
    }

    pub fn build(self) -> AgentGraph {
        let now = Utc::now();
        AgentGraph {
            id: self.id,
            name: self.name,
            description: self.description,
            nodes: self.nodes,
            edges: self.edges,
            metadata: GraphMetadata {
                created: Some(now),
                modified: Some(now),
                version: Some("1".to_string()),
            },
        }
    }
}
