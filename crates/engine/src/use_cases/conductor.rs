//! Narrative Conductor (C11): the `advance(world, steps)` loop, grounded on
//! `original_source/services/narrative_engine.py`'s top-level driver and
//! SPEC_FULL.md §4.9's pseudo-design. Never advances a coarser scale while
//! a finer one has unfinished work.

use std::sync::Arc;

use serde::Serialize;
use taleweave_domain::{ActStatus, SceneStatus, WorldState};
use tokio::sync::Mutex;
use tracing::warn;

use crate::infrastructure::progress::{ProgressEvent, ProgressSender};
use crate::infrastructure::prompt_registry::PromptRegistry;
use crate::infrastructure::trope_corpus::TropeCorpus;
use crate::use_cases::act_engine::ActEngine;
use crate::use_cases::scene_engine::SceneEngine;

/// A single `steps` transition, surfaced to HTTP callers via `advance`'s
/// response body. Mirrored field-for-field into `ProgressEvent` for SSE
/// subscribers; see the `From` impl below.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AdvanceEvent {
    ActPlanned { act_number: u32, title: String },
    SceneComposed { scene_number: u32, actors: Vec<String>, setting: String, beat_count: usize },
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
    SceneCompleted { scene_number: u32, beats_count: usize },
    ActCompleted { act_number: u32, world_events: Vec<String> },
}

impl From<AdvanceEvent> for ProgressEvent {
    fn from(event: AdvanceEvent) -> Self {
        match event {
            AdvanceEvent::ActPlanned { act_number, title } => ProgressEvent::ActPlanned { act_number, title },
            AdvanceEvent::SceneComposed { scene_number, actors, setting, beat_count } => {
                ProgressEvent::SceneComposed { scene_number, actors, setting, beat_count }
            }
            AdvanceEvent::BeatResolved {
                beat_sequence,
                actor,
                intended_action,
                actual_outcome,
                dice_outcome,
                raw_roll,
                final_value,
                prose,
            } => ProgressEvent::BeatResolved {
                beat_sequence,
                actor,
                intended_action,
                actual_outcome,
                dice_outcome,
                raw_roll,
                final_value,
                prose,
            },
            AdvanceEvent::SceneCompleted { scene_number, beats_count } => {
                ProgressEvent::SceneCompleted { scene_number, beats_count }
            }
            AdvanceEvent::ActCompleted { act_number, world_events } => {
                ProgressEvent::ActCompleted { act_number, world_events }
            }
        }
    }
}

const SCENE_SAFETY_LIMIT: u32 = 20;
const ACT_SAFETY_LIMIT: u32 = 100;

pub struct Conductor {
    act_engine: Arc<ActEngine>,
    scene_engine: Arc<SceneEngine>,
    prompts: Arc<Mutex<PromptRegistry>>,
    corpus: Arc<TropeCorpus>,
}

impl Conductor {
    pub fn new(
        act_engine: Arc<ActEngine>,
        scene_engine: Arc<SceneEngine>,
        prompts: Arc<Mutex<PromptRegistry>>,
        corpus: Arc<TropeCorpus>,
    ) -> Self {
        Self {
            act_engine,
            scene_engine,
            prompts,
            corpus,
        }
    }

    /// Advances up to `steps` beat-or-boundary transitions. Emits events on
    /// `progress` (if given, for the SSE surface) and always returns the
    /// same events for the synchronous HTTP response.
    pub async fn advance(
        &self,
        world: &mut WorldState,
        steps: u32,
        progress: Option<&ProgressSender>,
    ) -> Vec<AdvanceEvent> {
        let mut events = Vec::new();
        let mut pending_actions: Vec<(String, String)> = Vec::new();

        for _ in 0..steps {
            if world.current_act().is_none() || world.last_completed_act_is(ActStatus::Completed) {
                let act_number = world.act_count() as u32 + 1;
                let character_roster: Vec<String> = world.characters.keys().cloned().collect();
                let act = self
                    .act_engine
                    .plan(
                        act_number,
                        &world.tccn.teleology,
                        &world.tccn.context,
                        &world.accumulated_prose,
                        &world.thread_states,
                        &character_roster,
                    )
                    .await;
                let event = AdvanceEvent::ActPlanned {
                    act_number: act.number,
                    title: act.title.clone(),
                };
                world.push_act(act);
                self.emit(&mut events, progress, event).await;
                pending_actions.clear();
            }

            let scene_missing_or_done = world
                .current_act()
                .and_then(|a| a.current_scene())
                .map(|s| s.status == SceneStatus::Completed)
                .unwrap_or(true);

            if scene_missing_or_done {
                let act_done = world
                    .current_act()
                    .map(|a| a.all_planned_scenes_done())
                    .unwrap_or(false);

                if act_done {
                    if let Some(idx) = world.current_act_index {
                        let mut teleology = world.tccn.teleology.clone();
                        let mut context = world.tccn.context.clone();
                        self.act_engine
                            .complete(&mut world.acts[idx], &mut teleology, &mut context, &world.thread_states, &self.corpus)
                            .await;
                        world.tccn.teleology = teleology;
                        world.tccn.context = context;

                        let act_number = world.acts[idx].number;
                        let world_events = world.acts[idx]
                            .world_events
                            .iter()
                            .map(|e| e.description.clone())
                            .collect();
                        let completed_event = AdvanceEvent::ActCompleted { act_number, world_events };
                        self.emit(&mut events, progress, completed_event).await;
                    }

                    let next_number = world.act_count() as u32 + 1;
                    let character_roster: Vec<String> = world.characters.keys().cloned().collect();
                    let act = self
                        .act_engine
                        .plan(
                            next_number,
                            &world.tccn.teleology,
                            &world.tccn.context,
                            &world.accumulated_prose,
                            &world.thread_states,
                            &character_roster,
                        )
                        .await;
                    let planned_event = AdvanceEvent::ActPlanned {
                        act_number: act.number,
                        title: act.title.clone(),
                    };
                    world.push_act(act);
                    self.emit(&mut events, progress, planned_event).await;
                }

                let Some(idx) = world.current_act_index else { break };
                let act_id = world.acts[idx].id;
                let scenes_len = world.acts[idx].scenes.len();
                let scene_number = scenes_len as u32 + 1;
                let slot = world.acts[idx]
                    .plan
                    .as_ref()
                    .and_then(|p| p.planned_scene_sketches.get(scenes_len).cloned())
                    .unwrap_or_else(|| "Continue the story.".to_string());

                let scene = self
                    .scene_engine
                    .compose(act_id, scene_number, &slot, &world.thread_states, &self.corpus)
                    .await;

                let act_goals = world.acts[idx]
                    .plan
                    .as_ref()
                    .map(|p| p.thread_goals.values().cloned().collect::<Vec<_>>().join("; "))
                    .unwrap_or_default();
                let thread_summary = world
                    .thread_states
                    .iter()
                    .map(|t| t.thread.text.clone())
                    .collect::<Vec<_>>()
                    .join("; ");
                pending_actions = self
                    .scene_engine
                    .generate_actions(&scene.actors, &scene.setting, &act_goals, &thread_summary)
                    .await;

                let composed_event = AdvanceEvent::SceneComposed {
                    scene_number: scene.number,
                    actors: scene.actors.clone(),
                    setting: scene.setting.clone(),
                    beat_count: pending_actions.len(),
                };

                if let Err(err) = world.acts[idx].push_scene(scene) {
                    warn!(error = %err, "failed to push composed scene onto act");
                }
                self.emit(&mut events, progress, composed_event).await;
                continue;
            }

            let Some(idx) = world.current_act_index else { break };
            let Some(scene_idx) = world.acts[idx].scenes.len().checked_sub(1) else { break };

            if !pending_actions.is_empty() {
                let (actor, action) = pending_actions.remove(0);
                let scene_id = world.acts[idx].scenes[scene_idx].id;
                let sequence = world.acts[idx].scenes[scene_idx].next_beat_sequence();
                let setting = world.acts[idx].scenes[scene_idx].setting.clone();
                let previous_prose = world.acts[idx].scenes[scene_idx]
                    .beats
                    .last()
                    .map(|b| b.prose.clone())
                    .unwrap_or_default();

                let mut prompts = self.prompts.lock().await;
                let beat = self
                    .scene_engine
                    .resolve_one(
                        &mut prompts,
                        scene_id,
                        sequence,
                        &actor,
                        &action,
                        &setting,
                        &previous_prose,
                        &world.global_trope_pool,
                        &self.corpus,
                        2,
                        None,
                    )
                    .await;
                drop(prompts);

                let event = AdvanceEvent::BeatResolved {
                    beat_sequence: beat.sequence,
                    actor: beat.actor.clone(),
                    intended_action: beat.intended_action.clone(),
                    actual_outcome: beat.actual_outcome.clone(),
                    dice_outcome: beat.dice_roll.outcome.as_str().to_string(),
                    raw_roll: beat.dice_roll.raw,
                    final_value: beat.dice_roll.r#final,
                    prose: beat.prose.clone(),
                };
                if world.acts[idx].scenes[scene_idx].push_beat(beat).is_ok() {
                    self.emit(&mut events, progress, event).await;
                }
            } else {
                let header = {
                    let scene = &mut world.acts[idx].scenes[scene_idx];
                    self.scene_engine
                        .complete(scene, &mut world.characters, &mut world.thread_states)
                        .await;
                    scene.prose_with_header()
                };
                world.append_scene_prose(&header);

                let scene_number = world.acts[idx].scenes[scene_idx].number;
                let beats_count = world.acts[idx].scenes[scene_idx].beats.len();
                let event = AdvanceEvent::SceneCompleted { scene_number, beats_count };
                self.emit(&mut events, progress, event).await;
            }
        }

        if let Some(sender) = progress {
            let _ = sender
                .send(ProgressEvent::AdvanceFinished { steps_taken: events.len() as u32 })
                .await;
        }

        events
    }

    /// Thin wrapper: advances one beat at a time until the matching
    /// `scene_completed` event appears, bounded by a safety limit.
    pub async fn advance_scene(&self, world: &mut WorldState, progress: Option<&ProgressSender>) -> Vec<AdvanceEvent> {
        let mut all = Vec::new();
        for _ in 0..SCENE_SAFETY_LIMIT {
            let batch = self.advance(world, 1, progress).await;
            let reached_completion = batch.iter().any(|e| matches!(e, AdvanceEvent::SceneCompleted { .. }));
            all.extend(batch);
            if reached_completion {
                return all;
            }
        }
        if let Some(sender) = progress {
            let _ = sender.send(ProgressEvent::SafetyLimitReached { limit: SCENE_SAFETY_LIMIT }).await;
        }
        all
    }

    /// As `advance_scene`, but until an `act_completed` event appears.
    pub async fn advance_act(&self, world: &mut WorldState, progress: Option<&ProgressSender>) -> Vec<AdvanceEvent> {
        let mut all = Vec::new();
        for _ in 0..ACT_SAFETY_LIMIT {
            let batch = self.advance(world, 1, progress).await;
            let reached_completion = batch.iter().any(|e| matches!(e, AdvanceEvent::ActCompleted { .. }));
            all.extend(batch);
            if reached_completion {
                return all;
            }
        }
        if let Some(sender) = progress {
            let _ = sender.send(ProgressEvent::SafetyLimitReached { limit: ACT_SAFETY_LIMIT }).await;
        }
        all
    }

    /// Forwards the same frame that lands in the synchronous response to the
    /// SSE channel, so a stream subscriber sees identical JSON to a caller
    /// polling `advance`'s return value.
    async fn emit(&self, events: &mut Vec<AdvanceEvent>, progress: Option<&ProgressSender>, event: AdvanceEvent) {
        if let Some(sender) = progress {
            let _ = sender.send(ProgressEvent::from(event.clone())).await;
        }
        events.push(event);
    }
}
