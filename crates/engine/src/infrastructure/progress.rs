//! SSE Progress Channel (C13), grounded on `sblanchard-SerialAgent`'s
//! `chat_stream` / `make_sse_stream`: an mpsc channel feeding an
//! `async-stream` generator that the HTTP layer turns into an
//! `axum::response::sse::Sse` body.
//!
//! Frame shapes mirror SPEC_FULL.md §6's event schema exactly (`act_planned`,
//! `scene_composed`, `beat_resolved`, `scene_completed`, `act_completed`) so
//! an SSE subscriber sees the same JSON a synchronous `advance` caller would
//! get back in its response body, plus a handful of frames that only make
//! sense on a live stream (seeding lifecycle, safety limits, completion).

use serde::Serialize;
use taleweave_domain::WorldId;
use tokio::sync::mpsc;

/// One notification pushed to subscribers of a world's advance or
/// initialization stream.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    ActPlanned {
        act_number: u32,
        title: String,
    },
    SceneComposed {
        scene_number: u32,
        actors: Vec<String>,
        setting: String,
        beat_count: usize,
    },
    BeatResolved {
        beat_sequence: u32,
        actor: String,
        intended_action: String,
        actual_outcome: String,
        dice_outcome: String,
        raw_roll: i32,
        final_value: i32,
        prose: String,
    },
    SceneCompleted {
        scene_number: u32,
        beats_count: usize,
    },
    ActCompleted {
        act_number: u32,
        world_events: Vec<String>,
    },
    AdvanceFinished {
        steps_taken: u32,
    },
    SafetyLimitReached {
        limit: u32,
    },
    /// Emitted once `initialize_world` begins.
    Starting,
    /// Emitted once `generate_seed` produces a TCCN.
    SeedReady {
        teleology: String,
        context: String,
    },
    /// Emitted once per character, after `generate_character` + `refine_character`.
    CharacterReady {
        name: String,
    },
    /// Emitted once the global trope pool has been sampled.
    TropesReady {
        count: usize,
    },
    /// Emitted once the constructed `WorldState` has been stored.
    Done {
        world_id: WorldId,
    },
}

/// Sending half handed to the conductor; receivers subscribe on the
/// matching `ProgressReceiver`. Bounded so a stalled subscriber applies
/// backpressure to the advance loop rather than growing memory unbounded.
pub type ProgressSender = mpsc::Sender<ProgressEvent>;
pub type ProgressReceiver = mpsc::Receiver<ProgressEvent>;

pub fn progress_channel(capacity: usize) -> (ProgressSender, ProgressReceiver) {
    mpsc::channel(capacity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn events_arrive_in_order() {
        let (tx, mut rx) = progress_channel(4);
        tx.send(ProgressEvent::SceneComposed {
            scene_number: 1,
            actors: vec!["Mara".to_string()],
            setting: "a rain-soaked alley".to_string(),
            beat_count: 0,
        })
        .await
        .unwrap();
        tx.send(ProgressEvent::AdvanceFinished { steps_taken: 1 })
            .await
            .unwrap();
        drop(tx);

        let first = rx.recv().await.unwrap();
        assert!(matches!(first, ProgressEvent::SceneComposed { .. }));
        let second = rx.recv().await.unwrap();
        assert!(matches!(second, ProgressEvent::AdvanceFinished { steps_taken: 1 }));
        assert!(rx.recv().await.is_none());
    }
}
