mod client;
#[cfg(feature = "openai-client")]
mod openai;

pub use client::{
    ChatMessage, LlmClient, LlmRequest, LlmResponse, LocalEchoClient, MessageRole, TokenUsage,
};
#[cfg(feature = "openai-client")]
pub use openai::OpenAiClient;
