mod context;
mod executor;
mod guardrails;
mod handlers;
mod report;
mod trace;

pub use context::{keys, ExecutionContext};
pub use executor::{execute_graph, GraphExecutor};
pub use guardrails::{Guardrails, MAX_OUTPUT_LENGTH, MAX_STEPS};
pub use handlers::{execute_node, NodeExecutionResult, PlanStep};
pub use trace::{AgentRun, ExecutionMode, RunStatus, TraceEntry};
