use thiserror::Error;

pub type Result<T> = std::result::Result<T, AgentStudioError>;

#[derive(Debug, Error)]
pub enum AgentStudioError {
    #[error("cycle detected in graph")]
    CycleDetected,
    #[error("invalid graph: {0}")]
    InvalidGraph(String),
    #[error("invalid run request: {0}")]
    InvalidRequest(String),
    #[error("rate limit exceeded for session `{session}` ({remaining} requests remaining)")]
    RateLimited { session: String, remaining: u32 },
    #[error("store error: {0}")]
    Store(String),
    #[error("LLM API error: {status} - {body}")]
    LlmApi { status: u16, body: String },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_json_errors_convert_transparently() {
        let parse_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let message = parse_err.to_string();
        let err = AgentStudioError::from(parse_err);
        assert!(matches!(err, AgentStudioError::Json(_)));
        assert_eq!(err.to_string(), message);
    }
}
