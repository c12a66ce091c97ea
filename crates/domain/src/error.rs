//! Unified error type for domain-level invariant violations.
//!
//! Every variant here is a pure data-invariant violation raised by a
//! constructor or mutator on one of the domain types themselves -- never an
//! I/O or LLM failure (those live in `taleweave-engine`). All variants are
//! classed `Validation` at the HTTP boundary (see SPEC_FULL.md §7).

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Generic validation failure (e.g. an empty required field).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A TCCN was constructed without at least one character or thread.
    #[error("invalid story seed: {0}")]
    InvalidTccn(String),

    /// A beat/scene referenced a character name absent from `world.characters`.
    #[error("unknown character: {0}")]
    UnknownCharacter(String),

    /// A thread index supplied by a caller (typically the director) is out
    /// of bounds for `world.thread_states`.
    #[error("thread index {index} out of range (have {len} threads)")]
    ThreadIndexOutOfRange { index: usize, len: usize },

    /// An operation that requires an in-progress scene was called when none
    /// is in progress.
    #[error("no scene is currently in progress")]
    SceneNotInProgress,

    /// An act-ordering invariant was violated (e.g. starting a new scene
    /// while the previous one is still `in_progress`).
    #[error("act out of order: {0}")]
    ActOutOfOrder(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_tccn(msg: impl Into<String>) -> Self {
        Self::InvalidTccn(msg.into())
    }

    pub fn unknown_character(name: impl Into<String>) -> Self {
        Self::UnknownCharacter(name.into())
    }

    pub fn thread_index_out_of_range(index: usize, len: usize) -> Self {
        Self::ThreadIndexOutOfRange { index, len }
    }
}
