mod builder;
mod nodes;
mod types;

pub use builder::GraphBuilder;
pub use nodes::{
    GoalData, HumanApprovalData, MemoryData, MemoryOperation, NodeData, NodeKind, OutputData,
    OutputFormat, PlannerData, PlannerStrategy, PolicyAction, PolicyCondition, PolicyData,
    PolicyRule, PromptData, ToolData, ToolType,
};
pub use types::{AgentEdge, AgentGraph, AgentNode, GraphMetadata, Position};
