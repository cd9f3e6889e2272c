pub mod error;
pub mod graph;
pub mod llm;
pub mod runtime;
pub mod sandbox;
pub mod service;
pub mod store;
pub mod utils;

pub use error::{AgentStudioError, Result};
pub use graph::{
    AgentEdge, AgentGraph, AgentNode, GoalData, GraphBuilder, GraphMetadata, HumanApprovalData,
    MemoryData, MemoryOperation, NodeData, NodeKind, OutputData, OutputFormat, PlannerData,
    PlannerStrategy, PolicyAction, PolicyCondition, PolicyData, PolicyRule, Position, PromptData,
    ToolData, ToolType,
};
#[cfg(feature = "openai-client")]
pub use llm::OpenAiClient;
pub use llm::{
    ChatMessage, LlmClient, LlmRequest, LlmResponse, LocalEchoClient, MessageRole, TokenUsage,
};
pub use runtime::{
    execute_graph, execute_node, keys, AgentRun, ExecutionContext, ExecutionMode, GraphExecutor,
    NodeExecutionResult, PlanStep, RunStatus, TraceEntry, MAX_OUTPUT_LENGTH, MAX_STEPS,
};
pub use sandbox::{
    sim_crm_query, sim_ticket_query, sim_web_search, CrmFilters, CustomerRecord, SearchResult,
    TicketFilters, TicketRecord,
};
pub use service::{
    RateLimitDecision, RateLimiter, RunRequest, RunService, GLOBAL_RATE_LIMITER,
    RATE_LIMIT_MAX_REQUESTS, RATE_LIMIT_WINDOW,
};
#[cfg(feature = "redis-store")]
pub use store::redis::RedisStore;
pub use store::{GraphStore, MemoryStore, RunStore, MAX_RUN_HISTORY};
pub use utils::{generate_id, truncate, LoggingConfig};
