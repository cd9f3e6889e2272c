use std::collections::{HashMap, HashSet};

use chrono::Utc;
use tracing::{debug, warn};

use crate::error::{AgentStudioError, Result};
use crate::graph::{AgentGraph, AgentNode};
use crate::utils::generate_id;

use super::context::{keys, ExecutionContext};
use super::guardrails::{Guardrails, MAX_STEPS};
use super::handlers::execute_node;
use super::trace::{AgentRun, ExecutionMode, RunStatus, TraceEntry};

/// Walks an agent graph in dependency order, one node at a time, enforcing
/// guardrails and accumulating the trace.
///
/// `execute` never fails past its own boundary: every fault, including a
/// cyclic graph, is converted into a terminal run record.
pub struct GraphExecutor {
    graph: AgentGraph,
    mode: ExecutionMode,
    context: ExecutionContext,
    trace: Vec<TraceEntry>,
    adjacency: HashMap<String, Vec<String>>,
    guardrails: Guardrails,
}

impl GraphExecutor {
    pub fn new(graph: AgentGraph, mode: ExecutionMode) -> Self {
        let mut adjacency: HashMap<String, Vec<String>> = HashMap::new();
        for node in &graph.nodes {
            adjacency.entry(node.id.clone()).or_default();
        }
        for edge in &graph.edges {
            adjacency
                .entry(edge.source.clone())
                .or_default()
                .push(edge.target.clone());
        }

        Self {
            graph,
            mode,
            context: ExecutionContext::new(MAX_STEPS),
            trace: Vec::new(),
            adjacency,
            guardrails: Guardrails::default(),
        }
    }

    /// Seeds context variables before the run starts.
    pub fn with_initial_variables(
        mut self,
        variables: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        for (key, value) in variables {
            self.context.variables.insert(key, value);
        }
        self
    }

    /// Direct successor ids of a node, in edge declaration order.
    pub fn successors(&self, node_id: &str) -> &[String] {
        self.adjacency
            .get(node_id)
            .map(|targets| targets.as_slice())
            .unwrap_or(&[])
    }

    /// Depth-first topological sort over reverse dependencies: a node is
    /// placed only after everything with an edge into it. Iteration follows
    /// declaration order, so ties break deterministically. Revisiting a node
    /// on the active path is a cycle.
    fn topological_sort(&self) -> Result<Vec<AgentNode>> {
        fn visit<'a>(
            id: &'a str,
            predecessors: &HashMap<&'a str, Vec<&'a str>>,
            node_index: &HashMap<&'a str, &'a AgentNode>,
            visited: &mut HashSet<&'a str>,
            visiting: &mut HashSet<&'a str>,
            sorted: &mut Vec<AgentNode>,
        ) -> Result<()> {
            if visited.contains(id) {
                return Ok(());
            }
            if !visiting.insert(id) {
                return Err(AgentStudioError::CycleDetected);
            }

            if let Some(sources) = predecessors.get(id) {
                for source in sources {
                    visit(source, predecessors, node_index, visited, visiting, sorted)?;
                }
            }

            visiting.remove(id);
            visited.insert(id);
            if let Some(node) = node_index.get(id) {
                sorted.push((*node).clone());
            }
            Ok(())
        }

        let mut predecessors: HashMap<&str, Vec<&str>> = HashMap::new();
        for edge in &self.graph.edges {
            predecessors
                .entry(edge.target.as_str())
                .or_default()
                .push(edge.source.as_str());
        }
        let node_index: HashMap<&str, &AgentNode> = self
            .graph
            .nodes
            .iter()
            .map(|node| (node.id.as_str(), node))
            .collect();

        let mut sorted = Vec::with_capacity(self.graph.nodes.len());
        let mut visited = HashSet::new();
        let mut visiting = HashSet::new();
        for node in &self.graph.nodes {
            visit(
                node.id.as_str(),
                &predecessors,
                &node_index,
                &mut visited,
                &mut visiting,
                &mut sorted,
            )?;
        }
        Ok(sorted)
    }

    pub fn execute(mut self) -> AgentRun {
        let run_id = generate_id("run");
        let start_time = Utc::now();
        debug!(graph = %self.graph.name, mode = ?self.mode, "starting graph run");

        let order = match self.topological_sort() {
            Ok(order) => order,
            Err(err) => {
                warn!(graph = %self.graph.name, error = %err, "graph rejected during ordering");
                return AgentRun {
                    id: run_id,
                    agent_id: self.graph.id.clone(),
                    agent_name: self.graph.name.clone(),
                    start_time,
                    end_time: Some(Utc::now()),
                    status: RunStatus::Failed,
                    trace: self.trace,
                    final_output: None,
                    error: Some(err.to_string()),
                    mode: self.mode,
                };
            }
        };

        for node in &order {
            if self.context.aborted {
                break;
            }
            self.step(node);
        }

        let status = if self.context.aborted {
            RunStatus::Aborted
        } else if !self.context.errors.is_empty() {
            RunStatus::Failed
        } else {
            RunStatus::Completed
        };
        let final_output = self
            .context
            .variable(keys::FINAL_OUTPUT)
            .or_else(|| self.context.variable(keys::LAST_OUTPUT))
            .cloned();
        let error = if self.context.errors.is_empty() {
            None
        } else {
            Some(self.context.errors.join("; "))
        };
        debug!(run = %run_id, status = ?status, steps = self.trace.len(), "graph run finished");

        AgentRun {
            id: run_id,
            agent_id: self.graph.id.clone(),
            agent_name: self.graph.name.clone(),
            start_time,
            end_time: Some(Utc::now()),
            status,
            trace: self.trace,
            final_output,
            error,
            mode: self.mode,
        }
    }

    /// Attempts one node: guardrails first, then dispatch. Either way
    /// exactly one trace entry is appended.
    fn step(&mut self, node: &AgentNode) {
        let timestamp = Utc::now();

        if let Some(reason) = self.guardrails.check(&self.context) {
            warn!(node = %node.id, reason = %reason, "guardrail aborted run");
            self.context.aborted = true;
            self.trace.push(TraceEntry {
                id: generate_id("trace"),
                timestamp,
                node_id: node.id.clone(),
                node_kind: node.kind(),
                node_name: node.label().to_string(),
                input_summary: String::new(),
                output_summary: "Guardrail check".to_string(),
                error: Some(reason),
            });
            return;
        }

        self.context.step_count += 1;
        let input_summary = self.summarize_context();
        let result = execute_node(&node.data, &mut self.context, self.mode);
        self.context
            .set_variable(keys::LAST_OUTPUT, result.output.clone());
        if let Some(error) = &result.error {
            self.context.errors.push(error.clone());
        }
        debug!(node = %node.id, kind = %node.kind(), summary = %result.summary, "node executed");

        self.trace.push(TraceEntry {
            id: generate_id("trace"),
            timestamp,
            node_id: node.id.clone(),
            node_kind: node.kind(),
            node_name: node.label().to_string(),
            input_summary,
            output_summary: result.summary,
            error: result.error,
        });
    }

    /// Short listing of up to three variable key names.
    fn summarize_context(&self) -> String {
        if self.context.variables.is_empty() {
            return "Empty context".to_string();
        }
        let listed: Vec<&str> = self
            .context
            .variables
            .keys()
            .take(3)
            .map(String::as_str)
            .collect();
        let suffix = if self.context.variables.len() > 3 {
            "..."
        } else {
            ""
        };
        format!("Variables: {}{}", listed.join(", "), suffix)
    }
}

/// Executes a graph document and returns the run record.
pub fn execute_graph(graph: AgentGraph, mode: ExecutionMode) -> AgentRun {
    GraphExecutor::new(graph, mode).execute()
}
