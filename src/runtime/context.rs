use serde_json::{Map, Value};

use super::guardrails::MAX_STEPS;

/// Well-known context variable keys shared between handlers.
pub mod keys {
    pub const GOAL: &str = "goal";
    pub const QUERY: &str = "query";
    pub const PLAN: &str = "plan";
    pub const LAST_OUTPUT: &str = "lastOutput";
    pub const LAST_PROMPT: &str = "lastPrompt";
    pub const LAST_PROMPT_RESPONSE: &str = "lastPromptResponse";
    pub const SEARCH_RESULTS: &str = "searchResults";
    pub const CRM_RESULTS: &str = "crmResults";
    pub const TICKET_RESULTS: &str = "ticketResults";
    pub const HUMAN_APPROVED: &str = "humanApproved";
    pub const FINAL_OUTPUT: &str = "finalOutput";
}

/// Mutable state threaded through one run. Created fresh per run, owned
/// exclusively by its executor, and discarded once the run record exists.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// Long-lived key/value store, mutated only by memory nodes.
    pub memory: Map<String, Value>,
    /// Scratch space every node kind writes through to pass results forward.
    pub variables: Map<String, Value>,
    pub step_count: u32,
    pub max_steps: u32,
    /// Sticky: once set, no further nodes execute.
    pub aborted: bool,
    pub errors: Vec<String>,
}

impl ExecutionContext {
    pub fn new(max_steps: u32) -> Self {
        Self {
            memory: Map::new(),
            variables: Map::new(),
            step_count: 0,
            max_steps,
            aborted: false,
            errors: Vec::new(),
        }
    }

    pub fn variable(&self, key: &str) -> Option<&Value> {
        self.variables.get(key)
    }

    pub fn set_variable(&mut self, key: impl Into<String>, value: Value) {
        self.variables.insert(key.into(), value);
    }

    pub fn last_output(&self) -> Option<&Value> {
        self.variable(keys::LAST_OUTPUT)
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new(MAX_STEPS)
    }
}
