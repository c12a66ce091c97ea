//! The engine-level error enum: wraps `DomainError` plus every failure mode
//! that only exists once I/O, concurrency, and HTTP enter the picture. Maps
//! to HTTP status codes at the boundary (SPEC_FULL.md §7).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use taleweave_domain::{DomainError, WorldId};
use thiserror::Error;

use super::llm::LlmStructureError;
use super::prompt_registry::PromptError;
use super::trope_corpus::TropeCorpusError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("world {0} not found")]
    WorldNotFound(WorldId),
    #[error("world lock was poisoned")]
    LockPoisoned,
    #[error(transparent)]
    Llm(#[from] LlmStructureError),
    #[error(transparent)]
    Prompt(#[from] PromptError),
    #[error(transparent)]
    TropeCorpus(#[from] TropeCorpusError),
    #[error("unrecoverable engine failure: {0}")]
    Fatal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl EngineError {
    fn status_code(&self) -> StatusCode {
        match self {
            EngineError::Domain(DomainError::Validation(_))
            | EngineError::Domain(DomainError::InvalidTccn(_))
            | EngineError::Domain(DomainError::UnknownCharacter(_))
            | EngineError::Domain(DomainError::ThreadIndexOutOfRange { .. })
            | EngineError::Domain(DomainError::SceneNotInProgress)
            | EngineError::Domain(DomainError::ActOutOfOrder(_)) => StatusCode::BAD_REQUEST,
            EngineError::WorldNotFound(_) => StatusCode::NOT_FOUND,
            EngineError::LockPoisoned
            | EngineError::Llm(_)
            | EngineError::Prompt(_)
            | EngineError::TropeCorpus(_)
            | EngineError::Fatal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        tracing::warn!(error = %self, status = %status, "request failed");
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, axum::Json(body)).into_response()
    }
}
