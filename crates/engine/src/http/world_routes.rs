//! World CRUD, advance, and director routes, grounded on the teacher's
//! `infrastructure/http/world_routes.rs` handler shape: `State<Arc<AppState>>`
//! plus a `Path`/`Json` extractor per handler, returning `Result<_, EngineError>`
//! (`EngineError` implements `IntoResponse`, so handlers don't hand-roll
//! status/body pairs the way the teacher's `(StatusCode, String)` tuples do).

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use taleweave_domain::{Act, Beat, Character, DiceRoll, NarrativeThreadState, WorldId};

use crate::application::dto::{
    AdvanceRequestDto, AdvanceResponseDto, ChooseThreadRequestDto, CreateWorldRequestDto,
    CreateWorldResponseDto, ForceTropeRequestDto, InjectEventRequestDto, OverrideDiceRequestDto,
    RedirectCharacterRequestDto, SetModeRequestDto, WorldSummaryDto,
};
use crate::application::AppState;
use crate::infrastructure::error::EngineError;

pub async fn create_world(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateWorldRequestDto>,
) -> Result<(StatusCode, Json<CreateWorldResponseDto>), EngineError> {
    let trope_pool_size = req.trope_pool_size.unwrap_or(state.config.default_trope_pool_size);
    let world = state
        .seeding
        .initialize_world(
            &req.seed_description,
            req.mode,
            trope_pool_size,
            req.num_characters,
            &state.corpus,
            None,
        )
        .await;

    let response = CreateWorldResponseDto {
        world_id: world.id,
        status: world.status,
        characters: world.characters.keys().cloned().collect(),
        thread_count: world.thread_states.len(),
        trope_pool_size: world.global_trope_pool.len(),
    };
    state.world_store.insert(world);
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn list_worlds(State(state): State<Arc<AppState>>) -> Json<Vec<WorldSummaryDto>> {
    let mut summaries = Vec::with_capacity(state.world_store.len());
    for id in state.world_store.ids() {
        if let Some(handle) = state.world_store.get(id) {
            let world = handle.lock().await;
            summaries.push(WorldSummaryDto {
                world_id: world.id,
                seed_description: world.seed_description.clone(),
                status: world.status,
                mode: world.mode,
                act_count: world.act_count(),
                character_count: world.characters.len(),
            });
        }
    }
    Json(summaries)
}

pub async fn get_world(
    State(state): State<Arc<AppState>>,
    Path(id): Path<WorldId>,
) -> Result<Json<taleweave_domain::WorldState>, EngineError> {
    let handle = state.require_world_handle(id)?;
    let world = handle.lock().await;
    Ok(Json(world.clone()))
}

#[derive(Debug, serde::Serialize)]
pub struct WorldTimelineDto {
    pub world_id: WorldId,
    pub acts: Vec<ActTimelineDto>,
}

#[derive(Debug, serde::Serialize)]
pub struct ActTimelineDto {
    pub number: u32,
    pub title: String,
    pub status: taleweave_domain::ActStatus,
    pub scenes: Vec<SceneTimelineDto>,
}

#[derive(Debug, serde::Serialize)]
pub struct SceneTimelineDto {
    pub number: u32,
    pub setting: String,
    pub status: taleweave_domain::SceneStatus,
    pub beat_count: usize,
}

pub async fn get_world_summary(
    State(state): State<Arc<AppState>>,
    Path(id): Path<WorldId>,
) -> Result<Json<WorldTimelineDto>, EngineError> {
    let handle = state.require_world_handle(id)?;
    let world = handle.lock().await;
    let acts = world
        .acts
        .iter()
        .map(|act| ActTimelineDto {
            number: act.number,
            title: act.title.clone(),
            status: act.status,
            scenes: act
                .scenes
                .iter()
                .map(|scene| SceneTimelineDto {
                    number: scene.number,
                    setting: scene.setting.clone(),
                    status: scene.status,
                    beat_count: scene.beats.len(),
                })
                .collect(),
        })
        .collect();
    Ok(Json(WorldTimelineDto { world_id: world.id, acts }))
}

pub async fn delete_world(
    State(state): State<Arc<AppState>>,
    Path(id): Path<WorldId>,
) -> Result<StatusCode, EngineError> {
    state
        .world_store
        .remove(id)
        .ok_or(EngineError::WorldNotFound(id))?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn advance(
    State(state): State<Arc<AppState>>,
    Path(id): Path<WorldId>,
    Json(req): Json<AdvanceRequestDto>,
) -> Result<Json<AdvanceResponseDto>, EngineError> {
    let handle = state.require_world_handle(id)?;
    let mut world = handle.lock().await;
    let events = state.conductor.advance(&mut world, req.steps, None).await;
    Ok(Json(AdvanceResponseDto { events }))
}

pub async fn advance_scene(
    State(state): State<Arc<AppState>>,
    Path(id): Path<WorldId>,
) -> Result<Json<AdvanceResponseDto>, EngineError> {
    let handle = state.require_world_handle(id)?;
    let mut world = handle.lock().await;
    let events = state.conductor.advance_scene(&mut world, None).await;
    Ok(Json(AdvanceResponseDto { events }))
}

pub async fn advance_act(
    State(state): State<Arc<AppState>>,
    Path(id): Path<WorldId>,
) -> Result<Json<AdvanceResponseDto>, EngineError> {
    let handle = state.require_world_handle(id)?;
    let mut world = handle.lock().await;
    let events = state.conductor.advance_act(&mut world, None).await;
    Ok(Json(AdvanceResponseDto { events }))
}

pub async fn set_mode(
    State(state): State<Arc<AppState>>,
    Path(id): Path<WorldId>,
    Json(req): Json<SetModeRequestDto>,
) -> Result<StatusCode, EngineError> {
    let handle = state.require_world_handle(id)?;
    let mut world = handle.lock().await;
    world.set_mode(req.mode);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn override_dice(
    State(state): State<Arc<AppState>>,
    Path(id): Path<WorldId>,
    Json(req): Json<OverrideDiceRequestDto>,
) -> Result<Json<Beat>, EngineError> {
    let handle = state.require_world_handle(id)?;
    let mut world = handle.lock().await;
    let beat = state
        .director
        .override_dice(&mut world, &req.actor, &req.action, req.forced_roll)
        .await?;
    Ok(Json(beat))
}

pub async fn inject_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<WorldId>,
    Json(req): Json<InjectEventRequestDto>,
) -> Result<StatusCode, EngineError> {
    let handle = state.require_world_handle(id)?;
    let mut world = handle.lock().await;
    state.director.inject_event(&mut world, &req.event_description)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn redirect_character(
    State(state): State<Arc<AppState>>,
    Path(id): Path<WorldId>,
    Json(req): Json<RedirectCharacterRequestDto>,
) -> Result<StatusCode, EngineError> {
    let handle = state.require_world_handle(id)?;
    let mut world = handle.lock().await;
    state
        .director
        .redirect_character(&mut world, &req.character_name, &req.new_direction)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, serde::Serialize)]
pub struct ForceTropeResponseDto {
    pub added: usize,
}

pub async fn force_trope(
    State(state): State<Arc<AppState>>,
    Path(id): Path<WorldId>,
    Json(req): Json<ForceTropeRequestDto>,
) -> Result<Json<ForceTropeResponseDto>, EngineError> {
    let handle = state.require_world_handle(id)?;
    let mut world = handle.lock().await;
    let added = state.director.force_trope(&mut world, &req.trope_query)?;
    Ok(Json(ForceTropeResponseDto { added }))
}

pub async fn choose_thread(
    State(state): State<Arc<AppState>>,
    Path(id): Path<WorldId>,
    Json(req): Json<ChooseThreadRequestDto>,
) -> Result<StatusCode, EngineError> {
    let handle = state.require_world_handle(id)?;
    let mut world = handle.lock().await;
    state
        .director
        .choose_thread(&mut world, req.thread_index, req.new_status)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_acts(
    State(state): State<Arc<AppState>>,
    Path(id): Path<WorldId>,
) -> Result<Json<Vec<Act>>, EngineError> {
    let handle = state.require_world_handle(id)?;
    let world = handle.lock().await;
    Ok(Json(world.acts.clone()))
}

pub async fn list_characters(
    State(state): State<Arc<AppState>>,
    Path(id): Path<WorldId>,
) -> Result<Json<Vec<Character>>, EngineError> {
    let handle = state.require_world_handle(id)?;
    let world = handle.lock().await;
    Ok(Json(world.characters.values().cloned().collect()))
}

pub async fn list_threads(
    State(state): State<Arc<AppState>>,
    Path(id): Path<WorldId>,
) -> Result<Json<Vec<NarrativeThreadState>>, EngineError> {
    let handle = state.require_world_handle(id)?;
    let world = handle.lock().await;
    Ok(Json(world.thread_states.clone()))
}

pub async fn get_prose(
    State(state): State<Arc<AppState>>,
    Path(id): Path<WorldId>,
) -> Result<String, EngineError> {
    let handle = state.require_world_handle(id)?;
    let world = handle.lock().await;
    Ok(world.accumulated_prose.clone())
}

pub async fn get_dice_history(
    State(state): State<Arc<AppState>>,
    Path(id): Path<WorldId>,
) -> Result<Json<Vec<DiceRoll>>, EngineError> {
    let handle = state.require_world_handle(id)?;
    let world = handle.lock().await;
    let rolls = world
        .acts
        .iter()
        .flat_map(|act| act.scenes.iter())
        .flat_map(|scene| scene.beats.iter())
        .map(|beat| beat.dice_roll.clone())
        .collect();
    Ok(Json(rolls))
}
