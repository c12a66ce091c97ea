//! Request/response bodies for the HTTP surface (SPEC_FULL.md §6). Thin by
//! design: most read accessors serialize domain types directly rather than
//! duplicating their shape in a parallel DTO, following the teacher's
//! `ActResponseDto::from(act)` pattern only where a request needs
//! translating into a use-case call, not for every GET.

use serde::{Deserialize, Serialize};

use taleweave_domain::{EngineMode, ThreadStatus, WorldId, WorldStatus};

use crate::use_cases::AdvanceEvent;

fn default_num_characters() -> usize {
    3
}

#[derive(Debug, Deserialize)]
pub struct CreateWorldRequestDto {
    pub seed_description: String,
    #[serde(default = "default_mode")]
    pub mode: EngineMode,
    /// Falls back to `AppConfig::default_trope_pool_size` when omitted,
    /// resolved by the handler rather than by a hardcoded serde default --
    /// a deployment's configured default would otherwise never be reachable.
    #[serde(default)]
    pub trope_pool_size: Option<usize>,
    #[serde(default = "default_num_characters")]
    pub num_characters: usize,
}

fn default_mode() -> EngineMode {
    EngineMode::Autonomous
}

#[derive(Debug, Serialize)]
pub struct CreateWorldResponseDto {
    pub world_id: WorldId,
    pub status: WorldStatus,
    pub characters: Vec<String>,
    pub thread_count: usize,
    pub trope_pool_size: usize,
}

#[derive(Debug, Serialize)]
pub struct WorldSummaryDto {
    pub world_id: WorldId,
    pub seed_description: String,
    pub status: WorldStatus,
    pub mode: EngineMode,
    pub act_count: usize,
    pub character_count: usize,
}

#[derive(Debug, Deserialize)]
pub struct AdvanceRequestDto {
    pub steps: u32,
}

#[derive(Debug, Serialize)]
pub struct AdvanceResponseDto {
    pub events: Vec<AdvanceEvent>,
}

#[derive(Debug, Deserialize)]
pub struct SetModeRequestDto {
    pub mode: EngineMode,
}

#[derive(Debug, Deserialize)]
pub struct OverrideDiceRequestDto {
    pub actor: String,
    pub action: String,
    pub forced_roll: i32,
}

#[derive(Debug, Deserialize)]
pub struct InjectEventRequestDto {
    pub event_description: String,
}

#[derive(Debug, Deserialize)]
pub struct RedirectCharacterRequestDto {
    pub character_name: String,
    pub new_direction: String,
}

#[derive(Debug, Deserialize)]
pub struct ForceTropeRequestDto {
    pub trope_query: String,
}

#[derive(Debug, Deserialize)]
pub struct ChooseThreadRequestDto {
    pub thread_index: usize,
    pub new_status: ThreadStatus,
}

#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    #[serde(default = "default_stream_steps")]
    pub steps: u32,
}

fn default_stream_steps() -> u32 {
    1
}
