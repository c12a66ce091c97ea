//! Scene Engine (C9, meso scale), grounded on
//! `original_source/services/narrative_engine.py`'s compose/execute/complete
//! scene lifecycle.

use std::sync::Arc;

use serde::Deserialize;
use taleweave_domain::{
    ActId, Character, EngineScene, NarrativeThreadState, ThreadStatus, Trope, TropeSample,
    TropeSampleSource,
};
use tracing::warn;

use crate::infrastructure::llm::{complete_structured, LlmPort};
use crate::infrastructure::prompt_registry::PromptRegistry;
use crate::infrastructure::random::RandomPort;
use crate::infrastructure::trope_corpus::TropeCorpus;
use crate::use_cases::beat_engine::BeatEngine;

#[derive(Debug, Deserialize)]
struct ComposedScene {
    #[serde(default)]
    actors: Vec<String>,
    #[serde(default)]
    setting: String,
    #[serde(default)]
    place_description: String,
    #[serde(default)]
    narrative_threads: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ThreadUpdate {
    #[serde(default)]
    status: Option<ThreadStatus>,
    #[serde(default)]
    tension: Option<u8>,
    #[serde(default)]
    notes: String,
}

pub struct SceneEngine {
    strong_llm: Arc<dyn LlmPort>,
    fast_llm: Arc<dyn LlmPort>,
    random: Arc<dyn RandomPort>,
    beats: Arc<BeatEngine>,
}

impl SceneEngine {
    pub fn new(
        strong_llm: Arc<dyn LlmPort>,
        fast_llm: Arc<dyn LlmPort>,
        random: Arc<dyn RandomPort>,
        beats: Arc<BeatEngine>,
    ) -> Self {
        Self {
            strong_llm,
            fast_llm,
            random,
            beats,
        }
    }

    /// Composes a new scene for the given act, using three randomly-sampled
    /// tropes as "literary fate" (SPEC_FULL.md §4.7 Compose).
    pub async fn compose(
        &self,
        act_id: ActId,
        scene_number: u32,
        act_plan_slot: &str,
        active_thread_states: &[NarrativeThreadState],
        corpus: &TropeCorpus,
    ) -> EngineScene {
        let tropes = corpus.sample_random(self.random.as_ref(), 3);
        let thread_summary = active_thread_states
            .iter()
            .map(|t| format!("{} ({:?}, tension {})", t.thread.text, t.status, t.tension))
            .collect::<Vec<_>>()
            .join("; ");
        let trope_text = TropeSample::new(tropes, TropeSampleSource::Random).to_prompt_text();

        let system = "You compose the next scene of an ongoing story. Respond with JSON only.";
        let user = format!(
            "Act plan slot: {act_plan_slot}\nActive threads: {thread_summary}\nLiterary fate (tropes to weave in): {trope_text}"
        );
        let composed: Result<ComposedScene, _> = complete_structured(
            self.strong_llm.as_ref(),
            system,
            &user,
            "{actors: [string], setting: string, place_description: string, narrative_threads: [string]}",
        )
        .await;

        let composed = composed.unwrap_or_else(|err| {
            warn!(error = %err, "scene composition failed, using a minimal single-actor scene");
            ComposedScene {
                actors: vec!["Narrator".to_string()],
                setting: act_plan_slot.to_string(),
                place_description: act_plan_slot.to_string(),
                narrative_threads: vec![],
            }
        });

        let snapshot: Vec<NarrativeThreadState> = active_thread_states
            .iter()
            .filter(|t| t.status != ThreadStatus::Resolved)
            .cloned()
            .collect();

        let tropes_injected = TropeSample::new(
            composed
                .narrative_threads
                .iter()
                .map(|t| Trope::new(t.clone(), String::new()))
                .collect::<Vec<_>>(),
            TropeSampleSource::Random,
        );

        let mut scene = EngineScene::planned(
            act_id,
            scene_number,
            composed.actors,
            composed.setting,
            composed.place_description,
            snapshot,
            tropes_injected,
        );
        scene.begin_composing();
        scene.begin_in_progress();
        scene
    }

    /// Generates the scene's action roster (SPEC_FULL.md §4.6 Generate),
    /// exposed so the conductor can step through actions one beat at a time
    /// rather than resolving a whole scene in one call.
    pub async fn generate_actions(
        &self,
        roster: &[String],
        scene_context: &str,
        act_goals: &str,
        thread_summary: &str,
    ) -> Vec<(String, String)> {
        self.beats.generate(roster, scene_context, act_goals, thread_summary).await
    }

    /// Resolves exactly one action into a `Beat` (SPEC_FULL.md §4.6
    /// Resolve). A scene holds one beat in progress at a time; beats within
    /// a scene are strictly serial, so the conductor calls this once per
    /// `advance` step rather than draining the whole roster at once.
    #[allow(clippy::too_many_arguments)]
    pub async fn resolve_one(
        &self,
        prompts: &mut PromptRegistry,
        scene_id: taleweave_domain::SceneId,
        sequence: u32,
        actor: &str,
        action: &str,
        scene_context: &str,
        previous_prose: &str,
        trope_pool: &[Trope],
        corpus: &TropeCorpus,
        n_tropes: usize,
        override_roll: Option<i32>,
    ) -> taleweave_domain::Beat {
        self.beats
            .resolve(
                prompts,
                scene_id,
                sequence,
                actor,
                action,
                scene_context,
                previous_prose,
                trope_pool,
                corpus,
                n_tropes,
                override_roll,
            )
            .await
    }

    /// Finalizes a scene: rewrites each acting character's live profile,
    /// advances thread states, concatenates prose, completes the scene
    /// (SPEC_FULL.md §4.7 Complete).
    pub async fn complete(
        &self,
        scene: &mut EngineScene,
        characters: &mut std::collections::HashMap<String, Character>,
        thread_states: &mut [NarrativeThreadState],
    ) {
        let mut acting_characters: Vec<String> =
            scene.beats.iter().map(|b| b.actor.clone()).collect();
        acting_characters.sort();
        acting_characters.dedup();

        for name in &acting_characters {
            let Some(current) = characters.get(name) else {
                continue;
            };
            let beat_summaries = scene
                .beats
                .iter()
                .filter(|b| &b.actor == name)
                .map(|b| b.actual_outcome.clone())
                .collect::<Vec<_>>()
                .join("; ");
            let accumulated_deltas = scene
                .beats
                .iter()
                .filter(|b| &b.actor == name)
                .flat_map(|b| b.character_deltas.iter())
                .map(|d| d.to_prompt_text())
                .collect::<Vec<_>>()
                .join("; ");

            let system = "You rewrite a character's living profile given what just happened to them. Respond with JSON only.";
            let user = format!(
                "Current profile: {}\nWhat happened this scene: {beat_summaries}\nAccumulated character deltas: {accumulated_deltas}",
                current.to_prompt_text()
            );
            let rewritten: Result<Character, _> = complete_structured(
                self.strong_llm.as_ref(),
                system,
                &user,
                "{name: string, internal_state: string, ambitions: string, teleology: string, \
                 philosophy: string, physical_state: string, voice_style: string, \
                 long_term_memory: [string], short_term_memory: [string], internal_contradictions: [string]}",
            )
            .await;

            match rewritten {
                Ok(character) => {
                    characters.insert(name.clone(), character);
                }
                Err(err) => {
                    warn!(error = %err, character = %name, "character rewrite failed, keeping prior profile");
                }
            }
        }

        let scene_summary = format!(
            "Scene in {}: {}",
            scene.setting,
            scene
                .beats
                .iter()
                .map(|b| b.actual_outcome.as_str())
                .collect::<Vec<_>>()
                .join("; ")
        );
        let system = "You advance narrative thread states given what happened this scene. Respond with JSON only.";
        let user = format!(
            "Scene summary: {scene_summary}\nCurrent threads: {}",
            thread_states
                .iter()
                .map(|t| format!("{} ({:?}, tension {})", t.thread.text, t.status, t.tension))
                .collect::<Vec<_>>()
                .join("; ")
        );
        let updates: Result<Vec<ThreadUpdate>, _> = complete_structured(
            self.fast_llm.as_ref(),
            system,
            &user,
            "[{status: string, tension: integer, notes: string}]",
        )
        .await;

        if let Ok(updates) = updates {
            for (state, update) in thread_states.iter_mut().zip(updates) {
                let status = update.status.unwrap_or(state.status);
                let tension = update.tension.unwrap_or(state.tension);
                state.apply_update(status, tension, update.notes);
            }
        } else if let Err(err) = updates {
            warn!(error = %err, "thread state advance failed, leaving thread states unchanged");
        }

        if let Err(err) = scene.complete() {
            warn!(error = %err, "scene completion invariant violated");
        }
    }
}
