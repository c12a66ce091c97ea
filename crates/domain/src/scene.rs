//! The meso-scale container of beats sharing setting and actors.

use serde::{Deserialize, Serialize};

use crate::beat::Beat;
use crate::error::DomainError;
use crate::ids::{ActId, SceneId};
use crate::thread_state::NarrativeThreadState;
use crate::trope::TropeSample;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneStatus {
    Planned,
    Composing,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineScene {
    pub id: SceneId,
    pub act_id: ActId,
    pub number: u32,
    pub actors: Vec<String>,
    pub setting: String,
    pub place_description: String,
    pub thread_states_snapshot: Vec<NarrativeThreadState>,
    pub tropes_injected: TropeSample,
    pub beats: Vec<Beat>,
    pub full_prose: String,
    pub status: SceneStatus,
}

impl EngineScene {
    #[allow(clippy::too_many_arguments)]
    pub fn planned(
        act_id: ActId,
        number: u32,
        actors: Vec<String>,
        setting: impl Into<String>,
        place_description: impl Into<String>,
        thread_states_snapshot: Vec<NarrativeThreadState>,
        tropes_injected: TropeSample,
    ) -> Self {
        Self {
            id: SceneId::new(),
            act_id,
            number,
            actors,
            setting: setting.into(),
            place_description: place_description.into(),
            thread_states_snapshot,
            tropes_injected,
            beats: Vec::new(),
            full_prose: String::new(),
            status: SceneStatus::Planned,
        }
    }

    pub fn begin_composing(&mut self) {
        self.status = SceneStatus::Composing;
    }

    pub fn begin_in_progress(&mut self) {
        self.status = SceneStatus::InProgress;
    }

    /// The next dense sequence number for a beat appended to this scene.
    pub fn next_beat_sequence(&self) -> u32 {
        self.beats.len() as u32 + 1
    }

    /// Appends a beat, enforcing that the scene is `in_progress` and that
    /// beats stay dense/ordered (SPEC_FULL.md §3, §5).
    pub fn push_beat(&mut self, beat: Beat) -> Result<(), DomainError> {
        if self.status != SceneStatus::InProgress {
            return Err(DomainError::SceneNotInProgress);
        }
        if beat.sequence != self.next_beat_sequence() {
            return Err(DomainError::validation(format!(
                "beat sequence {} is not dense (expected {})",
                beat.sequence,
                self.next_beat_sequence()
            )));
        }
        self.beats.push(beat);
        Ok(())
    }

    /// Completes the scene: concatenates beat prose into `full_prose` and
    /// transitions to `completed` (SPEC_FULL.md §4.7 step 3-4).
    pub fn complete(&mut self) -> Result<(), DomainError> {
        if self.status != SceneStatus::InProgress {
            return Err(DomainError::SceneNotInProgress);
        }
        self.full_prose = self
            .beats
            .iter()
            .map(|b| b.prose.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        self.status = SceneStatus::Completed;
        Ok(())
    }

    pub fn is_completed(&self) -> bool {
        self.status == SceneStatus::Completed
    }

    /// The scene-header separator used when appending this scene's prose
    /// to `world.accumulated_prose` (SPEC_FULL.md §4.7 step 3).
    pub fn prose_with_header(&self) -> String {
        format!("\n\n--- Scene {} ---\n\n{}", self.number, self.full_prose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::DiceRoll;

    fn make_scene() -> EngineScene {
        EngineScene::planned(
            ActId::new(),
            1,
            vec!["Keeper".to_string()],
            "lighthouse",
            "a rain-soaked lighthouse",
            vec![],
            TropeSample::default(),
        )
    }

    #[test]
    fn push_beat_requires_in_progress() {
        let mut scene = make_scene();
        let beat = Beat::new(
            scene.id,
            1,
            "Keeper",
            "open the diary",
            DiceRoll::resolve(50, vec![], "Keeper", "open the diary"),
            "opens it",
            "prose",
            vec![],
            vec![],
        );
        assert!(matches!(
            scene.push_beat(beat),
            Err(DomainError::SceneNotInProgress)
        ));
    }

    #[test]
    fn complete_concatenates_prose() {
        let mut scene = make_scene();
        scene.begin_composing();
        scene.begin_in_progress();
        let beat = Beat::new(
            scene.id,
            1,
            "Keeper",
            "open the diary",
            DiceRoll::resolve(50, vec![], "Keeper", "open the diary"),
            "opens it",
            "The Keeper opens the diary.",
            vec![],
            vec![],
        );
        scene.push_beat(beat).unwrap();
        scene.complete().unwrap();
        assert_eq!(scene.full_prose, "The Keeper opens the diary.");
        assert!(scene.is_completed());
    }

    #[test]
    fn rejects_non_dense_sequence() {
        let mut scene = make_scene();
        scene.begin_composing();
        scene.begin_in_progress();
        let beat = Beat::new(
            scene.id,
            5,
            "Keeper",
            "act",
            DiceRoll::resolve(50, vec![], "Keeper", "act"),
            "does it",
            "prose",
            vec![],
            vec![],
        );
        assert!(scene.push_beat(beat).is_err());
    }
}
