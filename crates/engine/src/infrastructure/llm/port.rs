//! The LLM Client Interface (C1): a capability, not a class hierarchy.
//!
//! Grounded on the teacher's `infrastructure/ports/external.rs` (`LlmPort`,
//! `LlmRequest`, `ChatMessage`), extended with `complete_structured` per
//! SPEC_FULL.md §4.1/§9 ("Structured completion becomes
//! `(schema_text, parser) -> value`").

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub json_mode: bool,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum LlmCallError {
    #[error("llm request failed: {0}")]
    RequestFailed(String),
    #[error("llm response was empty or unusable: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum LlmStructureError {
    #[error(transparent)]
    Call(#[from] LlmCallError),
    #[error("could not extract a valid json value from the llm response: {0}")]
    Unparseable(String),
    #[error("extracted json did not match the expected shape: {0}")]
    ShapeMismatch(String),
}

/// Two operations, both asynchronous (SPEC_FULL.md §4.1).
#[async_trait]
pub trait LlmPort: Send + Sync {
    /// Free-text completion.
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: CompletionOptions,
    ) -> Result<String, LlmCallError>;
}
