//! The two SSE endpoints: world creation progress and advance progress,
//! grounded on `sblanchard-SerialAgent`'s `run_events_sse` /
//! `make_run_event_stream` (`api/runs.rs`) -- an `mpsc` channel fed by a
//! spawned task, drained by an `async-stream` generator turned into
//! `axum::response::sse::Event` frames.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::Json;
use futures_util::stream::Stream;

use taleweave_domain::WorldId;

use crate::application::dto::{CreateWorldRequestDto, StreamQuery};
use crate::application::AppState;
use crate::infrastructure::error::EngineError;
use crate::infrastructure::progress::{progress_channel, ProgressEvent};

const PROGRESS_CHANNEL_CAPACITY: usize = 64;

pub async fn create_world_stream(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateWorldRequestDto>,
) -> impl IntoResponse {
    let (tx, rx) = progress_channel(PROGRESS_CHANNEL_CAPACITY);

    tokio::spawn(async move {
        let trope_pool_size = req.trope_pool_size.unwrap_or(state.config.default_trope_pool_size);
        let world = state
            .seeding
            .initialize_world(
                &req.seed_description,
                req.mode,
                trope_pool_size,
                req.num_characters,
                &state.corpus,
                Some(&tx),
            )
            .await;
        state.world_store.insert(world);
    });

    Sse::new(make_progress_stream(rx)).keep_alive(KeepAlive::default())
}

pub async fn world_stream(
    State(state): State<Arc<AppState>>,
    Path(id): Path<WorldId>,
    Query(query): Query<StreamQuery>,
) -> Result<impl IntoResponse, EngineError> {
    let handle = state.require_world_handle(id)?;
    let (tx, rx) = progress_channel(PROGRESS_CHANNEL_CAPACITY);

    tokio::spawn(async move {
        let mut world = handle.lock().await;
        state.conductor.advance(&mut world, query.steps, Some(&tx)).await;
    });

    Ok(Sse::new(make_progress_stream(rx)).keep_alive(KeepAlive::default()))
}

fn make_progress_stream(
    mut rx: crate::infrastructure::progress::ProgressReceiver,
) -> impl Stream<Item = Result<Event, Infallible>> {
    async_stream::stream! {
        while let Some(event) = rx.recv().await {
            let event_type = event_type_name(&event);
            let data = serde_json::to_string(&event).unwrap_or_default();
            let is_terminal = matches!(event, ProgressEvent::Done { .. } | ProgressEvent::AdvanceFinished { .. });
            yield Ok(Event::default().event(event_type).data(data));
            if is_terminal {
                break;
            }
        }
    }
}

fn event_type_name(event: &ProgressEvent) -> &'static str {
    match event {
        ProgressEvent::ActPlanned { .. } => "act_planned",
        ProgressEvent::SceneComposed { .. } => "scene_composed",
        ProgressEvent::BeatResolved { .. } => "beat_resolved",
        ProgressEvent::SceneCompleted { .. } => "scene_completed",
        ProgressEvent::ActCompleted { .. } => "act_completed",
        ProgressEvent::AdvanceFinished { .. } => "advance_finished",
        ProgressEvent::SafetyLimitReached { .. } => "safety_limit_reached",
        ProgressEvent::Starting => "starting",
        ProgressEvent::SeedReady { .. } => "seed_ready",
        ProgressEvent::CharacterReady { .. } => "character_ready",
        ProgressEvent::TropesReady { .. } => "tropes_ready",
        ProgressEvent::Done { .. } => "done",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_events_are_recognized() {
        assert_eq!(event_type_name(&ProgressEvent::Done { world_id: WorldId::new() }), "done");
        assert_eq!(event_type_name(&ProgressEvent::AdvanceFinished { steps_taken: 3 }), "advance_finished");
    }
}
