//! The stochastic action-resolution subsystem's pure data layer.
//!
//! This module has no dependency on randomness or the LLM -- it only models
//! the *outcome* of a roll that has already happened. The actual
//! `roll_d100()` PRNG call lives at the engine boundary
//! (`taleweave-engine::infrastructure::random`) so that a dice roll can
//! never be accidentally routed through an LLM (SPEC_FULL.md §9,
//! "Randomness boundary").

use serde::{Deserialize, Serialize};

use crate::trope::Trope;

/// The lower and upper bound a single fate modifier may take.
pub const FATE_MODIFIER_MIN: i32 = -30;
pub const FATE_MODIFIER_MAX: i32 = 30;

/// The five closed outcome tiers. `classify` is a pure, exhaustive,
/// total map from `[1..100]` into this set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiceOutcome {
    CatastrophicFailure,
    Failure,
    Mixed,
    Success,
    CriticalSuccess,
}

impl DiceOutcome {
    /// The canonical snake_case tier name, matching this type's own
    /// `#[serde(rename_all = "snake_case")]` wire form.
    pub fn as_str(&self) -> &'static str {
        match self {
            DiceOutcome::CatastrophicFailure => "catastrophic_failure",
            DiceOutcome::Failure => "failure",
            DiceOutcome::Mixed => "mixed",
            DiceOutcome::Success => "success",
            DiceOutcome::CriticalSuccess => "critical_success",
        }
    }
}

/// Classifies a final (post-modifier, already-clamped) roll value in
/// `[1..100]` into its outcome tier, per the table in SPEC_FULL.md §4.5.
///
/// Values outside `[1..100]` are clamped first so the function is total.
pub fn classify(final_value: i32) -> DiceOutcome {
    match final_value.clamp(1, 100) {
        1..=5 => DiceOutcome::CatastrophicFailure,
        6..=30 => DiceOutcome::Failure,
        31..=60 => DiceOutcome::Mixed,
        61..=90 => DiceOutcome::Success,
        _ => DiceOutcome::CriticalSuccess,
    }
}

/// A bounded signed integer derived from an active trope that biases one
/// dice roll. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FateModifier {
    pub trope: Trope,
    pub signed_modifier: i32,
    pub rationale: String,
}

impl FateModifier {
    /// Clamps `signed_modifier` to `[-30, +30]` -- per-modifier clamping
    /// per the Open Question resolution in DESIGN.md.
    pub fn new(trope: Trope, signed_modifier: i32, rationale: impl Into<String>) -> Self {
        Self {
            trope,
            signed_modifier: signed_modifier.clamp(FATE_MODIFIER_MIN, FATE_MODIFIER_MAX),
            rationale: rationale.into(),
        }
    }

    /// A neutral (zero) modifier, used when `assess_fate_modifiers` falls
    /// back after an LLM failure.
    pub fn neutral(trope: Trope) -> Self {
        Self {
            trope,
            signed_modifier: 0,
            rationale: "neutral fate (fallback)".to_string(),
        }
    }
}

/// The full record of one dice resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceRoll {
    pub raw: i32,
    pub modifiers: Vec<FateModifier>,
    pub r#final: i32,
    pub outcome: DiceOutcome,
    pub actor: String,
    pub action: String,
}

impl DiceRoll {
    /// Computes `final = clamp(raw + sum(modifiers), 1, 100)` and
    /// `outcome = classify(final)` so the invariant in SPEC_FULL.md §3/§8
    /// can never be violated by construction -- this is the only way to
    /// build a `DiceRoll`.
    pub fn resolve(
        raw: i32,
        modifiers: Vec<FateModifier>,
        actor: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        let modifier_sum: i32 = modifiers.iter().map(|m| m.signed_modifier).sum();
        let final_value = (raw + modifier_sum).clamp(1, 100);
        Self {
            raw,
            modifiers,
            r#final: final_value,
            outcome: classify(final_value),
            actor: actor.into(),
            action: action.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_covers_every_boundary() {
        assert_eq!(classify(1), DiceOutcome::CatastrophicFailure);
        assert_eq!(classify(5), DiceOutcome::CatastrophicFailure);
        assert_eq!(classify(6), DiceOutcome::Failure);
        assert_eq!(classify(30), DiceOutcome::Failure);
        assert_eq!(classify(31), DiceOutcome::Mixed);
        assert_eq!(classify(60), DiceOutcome::Mixed);
        assert_eq!(classify(61), DiceOutcome::Success);
        assert_eq!(classify(90), DiceOutcome::Success);
        assert_eq!(classify(91), DiceOutcome::CriticalSuccess);
        assert_eq!(classify(100), DiceOutcome::CriticalSuccess);
    }

    #[test]
    fn classify_is_total_over_full_range() {
        for v in 1..=100 {
            // Must not panic for any in-range value.
            let _ = classify(v);
        }
    }

    #[test]
    fn classify_clamps_out_of_range_input() {
        assert_eq!(classify(-50), DiceOutcome::CatastrophicFailure);
        assert_eq!(classify(500), DiceOutcome::CriticalSuccess);
    }

    #[test]
    fn fate_modifier_clamps_to_bound() {
        let m = FateModifier::new(Trope::new("X", "Y"), 999, "too strong");
        assert_eq!(m.signed_modifier, FATE_MODIFIER_MAX);
        let m = FateModifier::new(Trope::new("X", "Y"), -999, "too strong");
        assert_eq!(m.signed_modifier, FATE_MODIFIER_MIN);
    }

    #[test]
    fn dice_roll_final_matches_clamp_invariant() {
        let modifiers = vec![
            FateModifier::new(Trope::new("A", "a"), 30, "r"),
            FateModifier::new(Trope::new("B", "b"), 30, "r"),
        ];
        let roll = DiceRoll::resolve(95, modifiers, "Keeper", "open the chest");
        assert_eq!(roll.r#final, 100); // clamped, not 155
        assert_eq!(roll.outcome, DiceOutcome::CriticalSuccess);
    }

    #[test]
    fn dice_roll_final_never_below_one() {
        let modifiers = vec![FateModifier::new(Trope::new("A", "a"), -30, "r")];
        let roll = DiceRoll::resolve(1, modifiers, "Keeper", "flee");
        assert_eq!(roll.r#final, 1);
        assert_eq!(roll.outcome, DiceOutcome::CatastrophicFailure);
    }

    #[test]
    fn dice_roll_outcome_always_matches_classify_of_final() {
        let roll = DiceRoll::resolve(50, vec![], "A", "act");
        assert_eq!(roll.outcome, classify(roll.r#final));
    }
}
