//! Router assembly, grounded on the teacher's `infrastructure/http/mod.rs`
//! `create_routes()` convention: one function nesting every route group
//! under the `/api/narrative` prefix (SPEC_FULL.md §6).

use std::sync::Arc;

use axum::routing::{get, post, put};
use axum::Router;

use crate::application::AppState;
use crate::http::{stream_routes, world_routes};

pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/worlds", post(world_routes::create_world).get(world_routes::list_worlds))
        .route("/worlds/stream", post(stream_routes::create_world_stream))
        .route("/worlds/{id}", get(world_routes::get_world).delete(world_routes::delete_world))
        .route("/worlds/{id}/summary", get(world_routes::get_world_summary))
        .route("/worlds/{id}/advance", post(world_routes::advance))
        .route("/worlds/{id}/advance/scene", post(world_routes::advance_scene))
        .route("/worlds/{id}/advance/act", post(world_routes::advance_act))
        .route("/worlds/{id}/stream", get(stream_routes::world_stream))
        .route("/worlds/{id}/mode", put(world_routes::set_mode))
        .route("/worlds/{id}/director/override-dice", post(world_routes::override_dice))
        .route("/worlds/{id}/director/inject-event", post(world_routes::inject_event))
        .route(
            "/worlds/{id}/director/redirect-character",
            post(world_routes::redirect_character),
        )
        .route("/worlds/{id}/director/force-trope", post(world_routes::force_trope))
        .route("/worlds/{id}/director/choose-thread", post(world_routes::choose_thread))
        .route("/worlds/{id}/acts", get(world_routes::list_acts))
        .route("/worlds/{id}/characters", get(world_routes::list_characters))
        .route("/worlds/{id}/threads", get(world_routes::list_threads))
        .route("/worlds/{id}/prose", get(world_routes::get_prose))
        .route("/worlds/{id}/dice-history", get(world_routes::get_dice_history))
}
