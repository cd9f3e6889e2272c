use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Closed set of step kinds understood by the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    Goal,
    Prompt,
    Planner,
    Memory,
    Tool,
    Policy,
    HumanApproval,
    Output,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Goal => "goal",
            NodeKind::Prompt => "prompt",
            NodeKind::Planner => "planner",
            NodeKind::Memory => "memory",
            NodeKind::Tool => "tool",
            NodeKind::Policy => "policy",
            NodeKind::HumanApproval => "humanApproval",
            NodeKind::Output => "output",
        };
        f.write_str(name)
    }
}

/// Kind-specific node configuration, tagged by `type` in the document.
///
/// Adding a kind here forces every dispatch site to handle it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NodeData {
    Goal(GoalData),
    Prompt(PromptData),
    Planner(PlannerData),
    Memory(MemoryData),
    Tool(ToolData),
    Policy(PolicyData),
    HumanApproval(HumanApprovalData),
    Output(OutputData),
}

impl NodeData {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeData::Goal(_) => NodeKind::Goal,
            NodeData::Prompt(_) => NodeKind::Prompt,
            NodeData::Planner(_) => NodeKind::Planner,
            NodeData::Memory(_) => NodeKind::Memory,
            NodeData::Tool(_) => NodeKind::Tool,
            NodeData::Policy(_) => NodeKind::Policy,
            NodeData::HumanApproval(_) => NodeKind::HumanApproval,
            NodeData::Output(_) => NodeKind::Output,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            NodeData::Goal(data) => &data.label,
            NodeData::Prompt(data) => &data.label,
            NodeData::Planner(data) => &data.label,
            NodeData::Memory(data) => &data.label,
            NodeData::Tool(data) => &data.label,
            NodeData::Policy(data) => &data.label,
            NodeData::HumanApproval(data) => &data.label,
            NodeData::Output(data) => &data.label,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalData {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub goal: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptData {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub template: String,
    /// Placeholder names substituted from context variables as `{name}`.
    #[serde(default)]
    pub variables: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannerData {
    #[serde(default)]
    pub label: String,
    #[serde(default = "default_max_plan_steps")]
    pub max_steps: u32,
    #[serde(default)]
    pub strategy: PlannerStrategy,
}

fn default_max_plan_steps() -> u32 {
    5
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlannerStrategy {
    #[default]
    Sequential,
    Parallel,
    Adaptive,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryData {
    #[serde(default)]
    pub label: String,
    #[serde(default = "default_memory_key")]
    pub memory_key: String,
    #[serde(default)]
    pub operation: MemoryOperation,
}

fn default_memory_key() -> String {
    "default".to_string()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryOperation {
    #[default]
    Read,
    Write,
    Append,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolData {
    #[serde(default)]
    pub label: String,
    pub tool_type: ToolType,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToolType {
    SimWebSearch,
    #[serde(rename = "SimCRM")]
    SimCrm,
    SimTicket,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyData {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub rules: Vec<PolicyRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRule {
    #[serde(default)]
    pub id: String,
    pub condition: PolicyCondition,
    pub action: PolicyAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyCondition {
    MaxOutputLength,
    NoSensitiveData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyAction {
    Allow,
    Deny,
    Warn,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HumanApprovalData {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub require_approval: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputData {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Markdown,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
            OutputFormat::Markdown => "markdown",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_data_round_trips_document_shape() {
        let json = r#"{
            "type": "memory",
            "label": "Remember",
            "memoryKey": "notes",
            "operation": "append"
        }"#;
        let data: NodeData = serde_json::from_str(json).unwrap();
        match &data {
            NodeData::Memory(memory) => {
                assert_eq!(memory.memory_key, "notes");
                assert_eq!(memory.operation, MemoryOperation::Append);
            }
            other => panic!("unexpected variant: {:?}", other),
        }
        let value = serde_json::to_value(&data).unwrap();
        assert_eq!(value["type"], "memory");
        assert_eq!(value["memoryKey"], "notes");
    }

    #[test]
    fn human_approval_tag_is_camel_case() {
        let data = NodeData::HumanApproval(HumanApprovalData {
            label: "Gate".to_string(),
            prompt: String::new(),
            require_approval: true,
        });
        let value = serde_json::to_value(&data).unwrap();
        assert_eq!(value["type"], "humanApproval");
        assert_eq!(data.kind().to_string(), "humanApproval");
    }

    #[test]
    fn tool_type_uses_document_names() {
        let value = serde_json::to_value(ToolType::SimCrm).unwrap();
        assert_eq!(value, "SimCRM");
    }
}
