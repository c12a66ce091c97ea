//! Core narrative entities, value objects, and invariants.
//!
//! This crate has no dependency on the LLM or on any I/O; every mutation
//! method here either succeeds or returns a `DomainError`. Randomness is
//! deliberately absent (see `Cargo.toml`) -- `dice::classify` is a pure
//! function of an already-rolled value, and the roll itself is produced at
//! the engine boundary.

pub mod act;
pub mod beat;
pub mod character;
pub mod conversation;
pub mod dice;
pub mod error;
pub mod ids;
pub mod scene;
pub mod story;
pub mod thread_state;
pub mod trope;
pub mod world;

pub use act::{Act, ActPlan, ActStatus, TeleologyShift, WorldEvent};
pub use beat::{Beat, CharacterDelta};
pub use character::Character;
pub use conversation::{ConversationEntry, ConversationMemory, ConversationRole};
pub use dice::{classify, DiceOutcome, DiceRoll, FateModifier, FATE_MODIFIER_MAX, FATE_MODIFIER_MIN};
pub use error::DomainError;
pub use ids::{ActId, BeatId, SceneId, TropeId, WorldEventId, WorldId};
pub use scene::{EngineScene, SceneStatus};
pub use story::{CharacterSummary, NarrativeThread, Tccn};
pub use thread_state::{NarrativeThreadState, ThreadStatus};
pub use trope::{Trope, TropeSample, TropeSampleSource};
pub use world::{DirectorIntervention, DirectorInterventionKind, EngineMode, WorldState, WorldStatus};
