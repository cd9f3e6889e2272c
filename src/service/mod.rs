//! Run-submission boundary: rate limiting, request validation, execution,
//! BYOK prompt forwarding, and run persistence.

mod rate_limit;

pub use rate_limit::{
    RateLimitDecision, RateLimiter, RATE_LIMIT_MAX_REQUESTS, RATE_LIMIT_WINDOW,
};

use std::sync::Arc;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::error::{AgentStudioError, Result};
use crate::graph::{AgentGraph, NodeKind};
use crate::llm::{ChatMessage, LlmClient, LlmRequest};
use crate::runtime::{AgentRun, ExecutionMode, GraphExecutor, RunStatus};
use crate::store::RunStore;

/// Process-wide limiter for callers that do not inject their own.
pub static GLOBAL_RATE_LIMITER: Lazy<RateLimiter> = Lazy::new(RateLimiter::default);

const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Submission payload accepted at the HTTP boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    pub graph: AgentGraph,
    #[serde(default)]
    pub mode: ExecutionMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Seed variables merged into the context before the run starts.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub initial_context: Map<String, Value>,
}

impl RunRequest {
    pub fn sandbox(graph: AgentGraph) -> Self {
        Self {
            graph,
            mode: ExecutionMode::Sandbox,
            api_key: None,
            model: None,
            initial_context: Map::new(),
        }
    }
}

/// Gates, validates, and executes run submissions.
pub struct RunService {
    limiter: Arc<RateLimiter>,
    runs: Arc<dyn RunStore>,
    llm: Option<Arc<dyn LlmClient>>,
}

impl RunService {
    pub fn new(runs: Arc<dyn RunStore>) -> Self {
        Self {
            limiter: Arc::new(RateLimiter::default()),
            runs,
            llm: None,
        }
    }

    pub fn with_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = limiter;
        self
    }

    /// Overrides the client used for BYOK prompt forwarding.
    pub fn with_llm_client(mut self, client: Arc<dyn LlmClient>) -> Self {
        self.llm = Some(client);
        self
    }

    pub async fn submit(&self, session_id: &str, request: RunRequest) -> Result<AgentRun> {
        let decision = self.limiter.check(session_id);
        if !decision.allowed {
            warn!(session = session_id, "rate limit exceeded");
            return Err(AgentStudioError::RateLimited {
                session: session_id.to_string(),
                remaining: decision.remaining,
            });
        }
        debug!(session = session_id, remaining = decision.remaining, "run admitted");

        Self::validate(&request)?;

        let mode = request.mode;
        let executor = GraphExecutor::new(request.graph, mode)
            .with_initial_variables(request.initial_context);
        let mut run = executor.execute();
        info!(run = %run.id, status = ?run.status, steps = run.trace.len(), "graph run finished");

        if mode == ExecutionMode::Byok {
            self.forward_prompt(
                &mut run,
                request.api_key.as_deref().unwrap_or_default(),
                request.model.as_deref(),
            )
            .await?;
        }

        self.runs.save_run(&run).await?;
        Ok(run)
    }

    fn validate(request: &RunRequest) -> Result<()> {
        if request.graph.nodes.is_empty() {
            return Err(AgentStudioError::InvalidRequest(
                "graph must have at least one node".to_string(),
            ));
        }
        request.graph.validate()?;
        if request.mode == ExecutionMode::Byok
            && request.api_key.as_deref().unwrap_or_default().is_empty()
        {
            return Err(AgentStudioError::InvalidRequest(
                "API key is required for BYOK mode".to_string(),
            ));
        }
        Ok(())
    }

    /// When a BYOK run ends on a prompt node, its final output is the
    /// rendered prompt; forward it as a single chat message and substitute
    /// the completion text. At most one external call per run.
    async fn forward_prompt(
        &self,
        run: &mut AgentRun,
        api_key: &str,
        model: Option<&str>,
    ) -> Result<()> {
        let ended_on_prompt = run.status == RunStatus::Completed
            && run
                .trace
                .last()
                .map(|entry| entry.node_kind == NodeKind::Prompt)
                .unwrap_or(false);
        if !ended_on_prompt {
            return Ok(());
        }
        let Some(prompt) = run.final_output.as_ref().and_then(Value::as_str) else {
            return Ok(());
        };
        let Some(client) = self.client_for(api_key) else {
            debug!(run = %run.id, "no LLM client available; keeping rendered prompt");
            return Ok(());
        };

        let request = LlmRequest::new(
            model.unwrap_or(DEFAULT_MODEL),
            vec![ChatMessage::user(prompt)],
        );
        let response = client.complete(request).await?;
        debug!(run = %run.id, tokens = response.usage.total_tokens, "prompt forwarded to LLM");
        run.final_output = Some(Value::String(response.text));
        Ok(())
    }

    #[cfg(feature = "openai-client")]
    fn client_for(&self, api_key: &str) -> Option<Arc<dyn LlmClient>> {
        if let Some(client) = &self.llm {
            return Some(Arc::clone(client));
        }
        Some(Arc::new(crate::llm::OpenAiClient::new(api_key)))
    }

    #[cfg(not(feature = "openai-client"))]
    fn client_for(&self, _api_key: &str) -> Option<Arc<dyn LlmClient>> {
        self.llm.as_ref().map(Arc::clone)
    }
}
