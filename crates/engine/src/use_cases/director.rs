//! Director Protocol (C12): five synchronous operator-intervention
//! operations, grounded on SPEC_FULL.md §4.10. Unlike the conductor's
//! `advance`, these do not have an error firewall -- their errors surface
//! directly to the caller so an HTTP handler can reject bad input.

use std::sync::Arc;

use taleweave_domain::{
    Beat, DirectorIntervention, DirectorInterventionKind, DomainError, ThreadStatus, WorldEvent,
    WorldState,
};
use tokio::sync::Mutex;

use crate::infrastructure::error::EngineError;
use crate::infrastructure::prompt_registry::PromptRegistry;
use crate::infrastructure::trope_corpus::TropeCorpus;
use crate::use_cases::scene_engine::SceneEngine;

const DEFAULT_N_TROPES: usize = 2;
const FORCE_TROPE_MATCHES: usize = 5;

pub struct Director {
    scene_engine: Arc<SceneEngine>,
    prompts: Arc<Mutex<PromptRegistry>>,
    corpus: Arc<TropeCorpus>,
}

impl Director {
    pub fn new(scene_engine: Arc<SceneEngine>, prompts: Arc<Mutex<PromptRegistry>>, corpus: Arc<TropeCorpus>) -> Self {
        Self {
            scene_engine,
            prompts,
            corpus,
        }
    }

    /// Resolves one beat in the current in-progress scene with a fixed raw
    /// roll; trope sampling and narration proceed normally.
    pub async fn override_dice(
        &self,
        world: &mut WorldState,
        actor: &str,
        action: &str,
        forced_roll: i32,
    ) -> Result<Beat, EngineError> {
        let idx = world
            .current_act_index
            .ok_or(DomainError::SceneNotInProgress)?;
        let scene_idx = world.acts[idx]
            .scenes
            .len()
            .checked_sub(1)
            .ok_or(DomainError::SceneNotInProgress)?;

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
                actor,
                action,
                &setting,
                &previous_prose,
                &world.global_trope_pool,
                &self.corpus,
                DEFAULT_N_TROPES,
                Some(forced_roll),
            )
            .await;
        drop(prompts);

        world.acts[idx].scenes[scene_idx].push_beat(beat.clone())?;
        world.record_intervention(DirectorIntervention::new(
            DirectorInterventionKind::OverrideDice,
            format!("{actor} forced to roll {forced_roll} for: {action}"),
        ));
        Ok(beat)
    }

    /// Appends a synthetic world event to the current act.
    pub fn inject_event(&self, world: &mut WorldState, description: &str) -> Result<(), EngineError> {
        let idx = world.current_act_index.ok_or_else(|| {
            DomainError::ActOutOfOrder("no act is in progress to inject an event into".to_string())
        })?;
        world.acts[idx].world_events.push(WorldEvent::injected(description));
        world.record_intervention(DirectorIntervention::new(
            DirectorInterventionKind::InjectEvent,
            description.to_string(),
        ));
        Ok(())
    }

    /// Overwrites a character's ambitions and leaves a "director" breadcrumb
    /// in their short-term memory.
    pub fn redirect_character(
        &self,
        world: &mut WorldState,
        name: &str,
        new_direction: &str,
    ) -> Result<(), EngineError> {
        let character = world.require_character_mut(name)?;
        character.ambitions = new_direction.to_string();
        character.push_short_term_memory(format!("director: {new_direction}"));
        world.record_intervention(DirectorIntervention::new(
            DirectorInterventionKind::RedirectCharacter,
            format!("{name} redirected toward: {new_direction}"),
        ));
        Ok(())
    }

    /// Searches the trope corpus and extends `global_trope_pool` with the
    /// matches. Returns the number of tropes added.
    pub fn force_trope(&self, world: &mut WorldState, query: &str) -> Result<usize, EngineError> {
        let matches = self.corpus.search(query, FORCE_TROPE_MATCHES);
        let added = matches.len();
        world.global_trope_pool.extend(matches);
        world.record_intervention(DirectorIntervention::new(
            DirectorInterventionKind::ForceTrope,
            format!("forced {added} trope(s) matching '{query}'"),
        ));
        Ok(added)
    }

    /// Forces a thread's status directly; `resolved` remains absorbing even
    /// under a forced transition.
    pub fn choose_thread(
        &self,
        world: &mut WorldState,
        index: usize,
        new_status: ThreadStatus,
    ) -> Result<(), EngineError> {
        world.require_thread_index(index)?;
        world.thread_states[index].force_status(new_status);
        world.record_intervention(DirectorIntervention::new(
            DirectorInterventionKind::ChooseThread,
            format!("thread {index} forced to {new_status:?}"),
        ));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::llm::{CompletionOptions, LlmCallError, LlmPort};
    use crate::infrastructure::random::FixedRandom;
    use crate::use_cases::beat_engine::BeatEngine;
    use crate::use_cases::dice_service::DiceService;
    use async_trait::async_trait;
    use taleweave_domain::{
        Act, ActId, ActPlan, Character, EngineMode, EngineScene, NarrativeThread, Tccn,
    };

    struct EchoLlm(&'static str);

    #[async_trait]
    impl LlmPort for EchoLlm {
        async fn complete(
            &self,
            _system_prompt: &str,
            _user_prompt: &str,
            _options: CompletionOptions,
        ) -> Result<String, LlmCallError> {
            Ok(self.0.to_string())
        }
    }

    fn empty_corpus() -> Arc<TropeCorpus> {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            file.path(),
            "name,description,media,title\nChosen One,destiny finds the unwilling,book,\n",
        )
        .unwrap();
        Arc::new(TropeCorpus::load(file.path()).unwrap())
    }

    fn make_director() -> (Director, Arc<TropeCorpus>) {
        let llm: Arc<dyn LlmPort> = Arc::new(EchoLlm("garbage"));
        let random = Arc::new(FixedRandom(50));
        let dice = Arc::new(DiceService::new(llm.clone(), random.clone()));
        let beats = Arc::new(BeatEngine::new(llm.clone(), llm.clone(), dice));
        let scene_engine = Arc::new(SceneEngine::new(llm.clone(), llm, random, beats));
        let prompts = Arc::new(Mutex::new(PromptRegistry::new(tempfile::tempdir().unwrap().path())));
        let corpus = empty_corpus();
        (Director::new(scene_engine, prompts, corpus.clone()), corpus)
    }

    fn make_world_with_in_progress_scene() -> WorldState {
        let tccn = Tccn::new(
            "t",
            "c",
            vec![taleweave_domain::CharacterSummary {
                name: "Keeper".to_string(),
                description: "d".to_string(),
            }],
            vec![NarrativeThread::new("a mystery")],
        )
        .unwrap();
        let mut characters = std::collections::HashMap::new();
        characters.insert("Keeper".to_string(), Character::minimal("Keeper", "d"));
        let thread_states = vec![taleweave_domain::NarrativeThreadState::new(
            NarrativeThread::new("a mystery"),
            taleweave_domain::ThreadStatus::Active,
            5,
            "",
        )];
        let mut world = WorldState::new("seed", tccn, characters, thread_states, vec![], EngineMode::Director);

        let mut act = Act::planned(1, "Act One", ActPlan::three_scene_fallback());
        act.begin_in_progress();
        let mut scene = EngineScene::planned(
            act.id,
            1,
            vec!["Keeper".to_string()],
            "a library",
            "a quiet library",
            vec![],
            taleweave_domain::TropeSample::default(),
        );
        scene.begin_composing();
        scene.begin_in_progress();
        act.scenes.push(scene);
        world.push_act(act);
        world
    }

    #[tokio::test]
    async fn override_dice_uses_the_forced_roll() {
        let (director, _corpus) = make_director();
        let mut world = make_world_with_in_progress_scene();
        let beat = director
            .override_dice(&mut world, "Keeper", "open the diary", 87)
            .await
            .unwrap();
        assert_eq!(beat.dice_roll.raw, 87);
        assert_eq!(world.director_interventions.len(), 1);
    }

    #[test]
    fn inject_event_appends_to_current_act() {
        let (director, _corpus) = make_director();
        let mut world = make_world_with_in_progress_scene();
        director.inject_event(&mut world, "a storm rolls in").unwrap();
        let idx = world.current_act_index.unwrap();
        assert_eq!(world.acts[idx].world_events.len(), 1);
        assert_eq!(world.acts[idx].world_events[0].description, "a storm rolls in");
    }

    #[test]
    fn redirect_character_overwrites_ambitions_and_logs_memory() {
        let (director, _corpus) = make_director();
        let mut world = make_world_with_in_progress_scene();
        director.redirect_character(&mut world, "Keeper", "flee the library").unwrap();
        let character = world.characters.get("Keeper").unwrap();
        assert_eq!(character.ambitions, "flee the library");
        assert!(character.short_term_memory.iter().any(|m| m.contains("flee the library")));
    }

    #[test]
    fn redirect_character_rejects_unknown_name() {
        let (director, _corpus) = make_director();
        let mut world = make_world_with_in_progress_scene();
        assert!(director.redirect_character(&mut world, "Nobody", "x").is_err());
    }

    #[test]
    fn force_trope_extends_global_pool() {
        let (director, _corpus) = make_director();
        let mut world = make_world_with_in_progress_scene();
        let added = director.force_trope(&mut world, "chosen").unwrap();
        assert_eq!(added, 1);
        assert_eq!(world.global_trope_pool.len(), 1);
    }

    #[test]
    fn choose_thread_forces_status_and_bumps_tension_when_advancing() {
        let (director, _corpus) = make_director();
        let mut world = make_world_with_in_progress_scene();
        director
            .choose_thread(&mut world, 0, taleweave_domain::ThreadStatus::Advancing)
            .unwrap();
        assert_eq!(world.thread_states[0].status, taleweave_domain::ThreadStatus::Advancing);
        assert_eq!(world.thread_states[0].tension, 7);
    }

    #[test]
    fn choose_thread_rejects_out_of_range_index() {
        let (director, _corpus) = make_director();
        let mut world = make_world_with_in_progress_scene();
        assert!(director.choose_thread(&mut world, 99, taleweave_domain::ThreadStatus::Stalled).is_err());
    }
}
