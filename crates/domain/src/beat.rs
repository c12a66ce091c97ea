//! The smallest narrative unit: one character attempts one action, resolved
//! by dice and narrated in prose.

use serde::{Deserialize, Serialize};

use crate::dice::DiceRoll;
use crate::ids::BeatId;
use crate::trope::Trope;

/// A buffered set of changes to apply to a `Character` at scene completion.
/// Never applied mid-scene (SPEC_FULL.md §4.6).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterDelta {
    pub character_name: String,
    #[serde(default)]
    pub new_short_term_memories: Vec<String>,
    #[serde(default)]
    pub new_long_term_memories: Vec<String>,
    #[serde(default)]
    pub internal_state_shift: String,
    #[serde(default)]
    pub ambition_shift: String,
    #[serde(default)]
    pub contradiction_shifts: Vec<String>,
    #[serde(default)]
    pub physical_state_change: String,
}

impl CharacterDelta {
    /// The minimal delta synthesized when the Delta LLM call's JSON fails
    /// to parse: exactly one new short-term memory, the actual outcome
    /// (SPEC_FULL.md §4.6 step 4 / §8 boundary behavior).
    pub fn minimal(character_name: impl Into<String>, actual_outcome: impl Into<String>) -> Self {
        Self {
            character_name: character_name.into(),
            new_short_term_memories: vec![actual_outcome.into()],
            ..Default::default()
        }
    }

    /// Renders this delta for inclusion in a character-rewrite prompt, so
    /// the buffered per-beat changes actually reach the LLM that flushes
    /// them into the character's live profile at scene completion.
    pub fn to_prompt_text(&self) -> String {
        format!(
            "internal state shift: {internal_state_shift}; ambition shift: {ambition_shift}; \
             physical state change: {physical_state_change}; new contradictions: {contradictions}; \
             new short-term memories: {short_term}; new long-term memories: {long_term}",
            internal_state_shift = self.internal_state_shift,
            ambition_shift = self.ambition_shift,
            physical_state_change = self.physical_state_change,
            contradictions = self.contradiction_shifts.join(", "),
            short_term = self.new_short_term_memories.join(", "),
            long_term = self.new_long_term_memories.join(", "),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Beat {
    pub id: BeatId,
    pub scene_id: crate::ids::SceneId,
    pub sequence: u32,
    pub actor: String,
    pub intended_action: String,
    pub dice_roll: DiceRoll,
    pub actual_outcome: String,
    pub prose: String,
    #[serde(default)]
    pub character_deltas: Vec<CharacterDelta>,
    #[serde(default)]
    pub tropes_active: Vec<Trope>,
}

impl Beat {
    /// Constructs a beat, enforcing `dice_roll.actor == actor`
    /// (SPEC_FULL.md §3).
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        scene_id: crate::ids::SceneId,
        sequence: u32,
        actor: impl Into<String>,
        intended_action: impl Into<String>,
        dice_roll: DiceRoll,
        actual_outcome: impl Into<String>,
        prose: impl Into<String>,
        character_deltas: Vec<CharacterDelta>,
        tropes_active: Vec<Trope>,
    ) -> Self {
        let actor = actor.into();
        debug_assert_eq!(dice_roll.actor, actor, "dice roll must match beat actor");
        Self {
            id: BeatId::new(),
            scene_id,
            sequence,
            actor,
            intended_action: intended_action.into(),
            dice_roll,
            actual_outcome: actual_outcome.into(),
            prose: prose.into(),
            character_deltas,
            tropes_active,
        }
    }
}
