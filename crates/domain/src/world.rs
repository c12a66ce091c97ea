//! The top-level aggregate: `WorldState`, plus engine mode and director
//! intervention records.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::act::{Act, ActStatus, WorldEvent};
use crate::character::Character;
use crate::error::DomainError;
use crate::ids::WorldId;
use crate::scene::SceneStatus;
use crate::story::Tccn;
use crate::thread_state::{NarrativeThreadState, ThreadStatus};
use crate::trope::Trope;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineMode {
    Autonomous,
    Director,
}

/// Engine phase label. Not a fixed closed set in the source, but these are
/// the phases the conductor and seeding pipeline actually produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorldStatus {
    Initializing,
    Initialized,
    Running,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectorInterventionKind {
    OverrideDice,
    InjectEvent,
    RedirectCharacter,
    ForceTrope,
    ChooseThread,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectorIntervention {
    pub kind: DirectorInterventionKind,
    pub description: String,
}

impl DirectorIntervention {
    pub fn new(kind: DirectorInterventionKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldState {
    pub id: WorldId,
    pub seed_description: String,
    pub tccn: Tccn,
    pub characters: HashMap<String, Character>,
    pub acts: Vec<Act>,
    pub current_act_index: Option<usize>,
    pub current_scene_index: Option<usize>,
    pub current_beat_index: Option<usize>,
    pub thread_states: Vec<NarrativeThreadState>,
    pub global_trope_pool: Vec<Trope>,
    pub mode: EngineMode,
    pub director_interventions: Vec<DirectorIntervention>,
    pub accumulated_prose: String,
    pub status: WorldStatus,
}

impl WorldState {
    pub fn new(
        seed_description: impl Into<String>,
        tccn: Tccn,
        characters: HashMap<String, Character>,
        thread_states: Vec<NarrativeThreadState>,
        global_trope_pool: Vec<Trope>,
        mode: EngineMode,
    ) -> Self {
        Self {
            id: WorldId::new(),
            seed_description: seed_description.into(),
            tccn,
            characters,
            acts: Vec::new(),
            current_act_index: None,
            current_scene_index: None,
            current_beat_index: None,
            thread_states,
            global_trope_pool,
            mode,
            director_interventions: Vec::new(),
            accumulated_prose: String::new(),
            status: WorldStatus::Initialized,
        }
    }

    pub fn current_act(&self) -> Option<&Act> {
        self.current_act_index.and_then(|i| self.acts.get(i))
    }

    pub fn current_act_mut(&mut self) -> Option<&mut Act> {
        self.current_act_index.and_then(|i| self.acts.get_mut(i))
    }

    /// Appends a new act as `current_act_index` (SPEC_FULL.md §3 invariant:
    /// "current_act_index points to the last planned act").
    pub fn push_act(&mut self, act: Act) {
        self.acts.push(act);
        self.current_act_index = Some(self.acts.len() - 1);
    }

    pub fn current_scene_in_progress(&self) -> bool {
        self.current_act()
            .and_then(|a| a.current_scene())
            .map(|s| s.status == SceneStatus::InProgress)
            .unwrap_or(false)
    }

    /// Every `Beat.actor` / `Scene.actors[k]` must name an existing
    /// character (SPEC_FULL.md §3 invariant).
    pub fn require_character(&self, name: &str) -> Result<&Character, DomainError> {
        self.characters
            .get(name)
            .ok_or_else(|| DomainError::unknown_character(name))
    }

    pub fn require_character_mut(&mut self, name: &str) -> Result<&mut Character, DomainError> {
        self.characters
            .get_mut(name)
            .ok_or_else(|| DomainError::unknown_character(name))
    }

    pub fn require_thread_index(&self, index: usize) -> Result<(), DomainError> {
        if index >= self.thread_states.len() {
            return Err(DomainError::thread_index_out_of_range(
                index,
                self.thread_states.len(),
            ));
        }
        Ok(())
    }

    /// Appends a scene's prose to the monotonically-growing accumulated
    /// prose, with the scene-header separator (SPEC_FULL.md §3/§8).
    pub fn append_scene_prose(&mut self, scene_header_prose: &str) {
        self.accumulated_prose.push_str(scene_header_prose);
    }

    pub fn append_world_events(&mut self, events: &[WorldEvent]) {
        if let Some(act) = self.current_act_mut() {
            act.world_events.extend(events.iter().cloned());
        }
    }

    pub fn record_intervention(&mut self, intervention: DirectorIntervention) {
        self.director_interventions.push(intervention);
    }

    pub fn set_mode(&mut self, mode: EngineMode) {
        self.mode = mode;
    }

    /// A condensed timeline: acts -> scenes -> beats, for the `/summary`
    /// read accessor (SPEC_FULL.md §6).
    pub fn act_count(&self) -> usize {
        self.acts.len()
    }

    pub fn last_completed_act_is(&self, status: ActStatus) -> bool {
        self.acts.last().map(|a| a.status == status).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::story::{CharacterSummary, NarrativeThread};

    fn make_world() -> WorldState {
        let tccn = Tccn::new(
            "t",
            "c",
            vec![CharacterSummary {
                name: "Keeper".to_string(),
                description: "d".to_string(),
            }],
            vec![NarrativeThread::new("x")],
        )
        .unwrap();
        let mut characters = HashMap::new();
        characters.insert("Keeper".to_string(), Character::minimal("Keeper", "d"));
        WorldState::new("seed", tccn, characters, vec![], vec![], EngineMode::Autonomous)
    }

    #[test]
    fn unknown_character_is_an_error() {
        let world = make_world();
        assert!(world.require_character("Nobody").is_err());
        assert!(world.require_character("Keeper").is_ok());
    }

    #[test]
    fn push_act_updates_current_index() {
        let mut world = make_world();
        world.push_act(Act::planned(1, "Act One", crate::act::ActPlan::three_scene_fallback()));
        assert_eq!(world.current_act_index, Some(0));
        assert!(world.current_act().is_some());
    }

    #[test]
    fn accumulated_prose_only_grows() {
        let mut world = make_world();
        world.append_scene_prose("\n\n--- Scene 1 ---\n\nHello.");
        let before = world.accumulated_prose.clone();
        world.append_scene_prose("\n\n--- Scene 2 ---\n\nMore.");
        assert!(world.accumulated_prose.starts_with(&before));
        assert!(world.accumulated_prose.len() > before.len());
    }
}
