//! The large-scale container of scenes; completion produces world events
//! and may shift teleology.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ids::{ActId, WorldEventId};
use crate::scene::{EngineScene, SceneStatus};
use crate::story::NarrativeThread;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActStatus {
    Planned,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActPlan {
    pub planned_scene_sketches: Vec<String>,
    #[serde(default)]
    pub thread_goals: HashMap<String, String>,
    #[serde(default)]
    pub character_arcs: HashMap<String, String>,
    #[serde(default)]
    pub world_events_planned: Vec<String>,
}

impl ActPlan {
    /// The synthesized fallback used when `plan_act`'s JSON fails to parse:
    /// a three-scene plan with no goals (SPEC_FULL.md §4.8).
    pub fn three_scene_fallback() -> Self {
        Self {
            planned_scene_sketches: vec![
                "An opening scene establishing the stakes.".to_string(),
                "A complication scene raising tension.".to_string(),
                "A turning-point scene.".to_string(),
            ],
            thread_goals: HashMap::new(),
            character_arcs: HashMap::new(),
            world_events_planned: Vec::new(),
        }
    }
}

/// Generated at act completion; immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldEvent {
    pub id: WorldEventId,
    pub description: String,
    pub impact_on_context: String,
    #[serde(default)]
    pub affected_characters: Vec<String>,
    #[serde(default)]
    pub affected_threads: Vec<String>,
    #[serde(default)]
    pub spawned_threads: Vec<NarrativeThread>,
}

impl WorldEvent {
    pub fn new(
        description: impl Into<String>,
        impact_on_context: impl Into<String>,
        affected_characters: Vec<String>,
        affected_threads: Vec<String>,
        spawned_threads: Vec<NarrativeThread>,
    ) -> Self {
        Self {
            id: WorldEventId::new(),
            description: description.into(),
            impact_on_context: impact_on_context.into(),
            affected_characters,
            affected_threads,
            spawned_threads,
        }
    }

    /// The synthetic event appended by the director's `inject_event`
    /// (SPEC_FULL.md §4.10).
    pub fn injected(description: impl Into<String>) -> Self {
        Self::new(description, String::new(), vec![], vec![], vec![])
    }
}

/// At most one per act.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeleologyShift {
    pub original: String,
    pub shifted: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Act {
    pub id: ActId,
    pub number: u32,
    pub title: String,
    pub plan: Option<ActPlan>,
    pub scenes: Vec<EngineScene>,
    pub world_events: Vec<WorldEvent>,
    pub teleology_shift: Option<TeleologyShift>,
    pub context_evolution: String,
    pub status: ActStatus,
}

impl Act {
    pub fn planned(number: u32, title: impl Into<String>, plan: ActPlan) -> Self {
        Self {
            id: ActId::new(),
            number,
            title: title.into(),
            plan: Some(plan),
            scenes: Vec::new(),
            world_events: Vec::new(),
            teleology_shift: None,
            context_evolution: String::new(),
            status: ActStatus::Planned,
        }
    }

    pub fn begin_in_progress(&mut self) {
        self.status = ActStatus::InProgress;
    }

    /// Appends a scene, enforcing that no new scene starts while the
    /// previous one is still `in_progress` (SPEC_FULL.md §3).
    pub fn push_scene(&mut self, scene: EngineScene) -> Result<(), DomainError> {
        if let Some(last) = self.scenes.last() {
            if last.status != SceneStatus::Completed {
                return Err(DomainError::ActOutOfOrder(
                    "previous scene is not yet completed".to_string(),
                ));
            }
        }
        self.scenes.push(scene);
        Ok(())
    }

    pub fn current_scene(&self) -> Option<&EngineScene> {
        self.scenes.last()
    }

    pub fn current_scene_mut(&mut self) -> Option<&mut EngineScene> {
        self.scenes.last_mut()
    }

    pub fn planned_scene_count(&self) -> usize {
        self.plan
            .as_ref()
            .map(|p| p.planned_scene_sketches.len())
            .unwrap_or(0)
    }

    pub fn all_planned_scenes_done(&self) -> bool {
        self.scenes.len() >= self.planned_scene_count()
            && self.scenes.iter().all(EngineScene::is_completed)
    }

    pub fn complete(&mut self) {
        self.status = ActStatus::Completed;
    }

    pub fn is_completed(&self) -> bool {
        self.status == ActStatus::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trope::TropeSample;

    fn scene(act_id: ActId, number: u32, status: SceneStatus) -> EngineScene {
        let mut s = EngineScene::planned(act_id, number, vec![], "", "", vec![], TropeSample::default());
        s.status = status;
        s
    }

    #[test]
    fn rejects_new_scene_while_previous_in_progress() {
        let mut act = Act::planned(1, "Act One", ActPlan::three_scene_fallback());
        act.push_scene(scene(act.id, 1, SceneStatus::InProgress)).unwrap();
        let err = act.push_scene(scene(act.id, 2, SceneStatus::Planned));
        assert!(err.is_err());
    }

    #[test]
    fn allows_new_scene_after_previous_completed() {
        let mut act = Act::planned(1, "Act One", ActPlan::three_scene_fallback());
        act.push_scene(scene(act.id, 1, SceneStatus::Completed)).unwrap();
        assert!(act.push_scene(scene(act.id, 2, SceneStatus::Planned)).is_ok());
    }

    #[test]
    fn all_planned_scenes_done_respects_count() {
        let mut act = Act::planned(1, "Act One", ActPlan::three_scene_fallback());
        assert!(!act.all_planned_scenes_done());
        for i in 1..=3 {
            act.push_scene(scene(act.id, i, SceneStatus::Completed)).unwrap();
        }
        assert!(act.all_planned_scenes_done());
    }
}
