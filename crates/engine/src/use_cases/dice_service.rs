//! Dice Service (C5): the anti-collapse heart. Grounded on
//! `original_source/services/dice.py`'s three-operation shape, composed
//! here over the engine's `RandomPort` and `LlmPort` boundaries.

use std::sync::Arc;

use serde::Deserialize;
use taleweave_domain::{DiceRoll, FateModifier, Trope};
use tracing::warn;

use crate::infrastructure::llm::{complete_structured, LlmPort};
use crate::infrastructure::random::RandomPort;
use crate::infrastructure::trope_corpus::TropeCorpus;

#[derive(Debug, Deserialize)]
struct ModifierAssessment {
    #[serde(default)]
    signed_modifier: i32,
    #[serde(default)]
    rationale: String,
}

pub struct DiceService {
    llm: Arc<dyn LlmPort>,
    random: Arc<dyn RandomPort>,
}

impl DiceService {
    pub fn new(llm: Arc<dyn LlmPort>, random: Arc<dyn RandomPort>) -> Self {
        Self { llm, random }
    }

    /// A uniform `[1, 100]` roll from the injected `RandomPort`. Never the LLM.
    pub fn roll_d100(&self) -> i32 {
        self.random.roll_d100()
    }

    /// Asks the fast LLM, once per trope, how that trope biases this action.
    /// Falls back to an all-neutral modifier set on any failure and logs a
    /// warning -- this call never fails its caller (SPEC_FULL.md §4.5).
    pub async fn assess_fate_modifiers(
        &self,
        action: &str,
        actor: &str,
        tropes: &[Trope],
        scene_context: &str,
    ) -> Vec<FateModifier> {
        let mut modifiers = Vec::with_capacity(tropes.len());
        for trope in tropes {
            let system =
                "You assess how a literary trope biases the fate of an action. Respond with JSON only.";
            let user = format!(
                "Action: {action}\nActor: {actor}\nScene context: {scene_context}\n\
                 Trope: {} -- {}\n\nReturn a signed integer modifier in [-30, 30] \
                 and a short rationale for how this trope biases the outcome.",
                trope.name, trope.description
            );
            let assessment: Result<ModifierAssessment, _> = complete_structured(
                self.llm.as_ref(),
                system,
                &user,
                "{signed_modifier: integer, rationale: string}",
            )
            .await;
            match assessment {
                Ok(a) => modifiers.push(FateModifier::new(trope.clone(), a.signed_modifier, a.rationale)),
                Err(err) => {
                    warn!(error = %err, trope = %trope.name, "fate modifier assessment failed, using neutral fate");
                    modifiers.push(FateModifier::neutral(trope.clone()));
                }
            }
        }
        modifiers
    }

    /// The full beat resolution: draw tropes, assess modifiers, roll (or use
    /// `override_roll` from a director's `override_dice`), resolve. Returns
    /// the roll plus the tropes drawn, since beats record both.
    #[allow(clippy::too_many_arguments)]
    pub async fn resolve_action(
        &self,
        action: &str,
        actor: &str,
        scene_context: &str,
        pool: &[Trope],
        corpus: &TropeCorpus,
        n_tropes: usize,
        override_roll: Option<i32>,
    ) -> (DiceRoll, Vec<Trope>) {
        let drawn = if pool.len() >= n_tropes {
            self.random
                .sample_indices(pool.len(), n_tropes)
                .into_iter()
                .map(|i| pool[i].clone())
                .collect::<Vec<_>>()
        } else {
            corpus.sample_random(self.random.as_ref(), n_tropes)
        };

        let modifiers = self
            .assess_fate_modifiers(action, actor, &drawn, scene_context)
            .await;
        let raw = override_roll.unwrap_or_else(|| self.roll_d100());
        (DiceRoll::resolve(raw, modifiers, actor, action), drawn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::llm::{CompletionOptions, LlmCallError};
    use crate::infrastructure::random::FixedRandom;
    use async_trait::async_trait;

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

    struct FailingLlm;

    #[async_trait]
    impl LlmPort for FailingLlm {
        async fn complete(
            &self,
            _system_prompt: &str,
            _user_prompt: &str,
            _options: CompletionOptions,
        ) -> Result<String, LlmCallError> {
            Err(LlmCallError::RequestFailed("down".to_string()))
        }
    }

    #[tokio::test]
    async fn assess_falls_back_to_neutral_on_llm_failure() {
        let service = DiceService::new(Arc::new(FailingLlm), Arc::new(FixedRandom(50)));
        let tropes = vec![Trope::new("Chosen One", "destiny finds the unwilling")];
        let modifiers = service
            .assess_fate_modifiers("open the door", "Keeper", &tropes, "a dark hallway")
            .await;
        assert_eq!(modifiers.len(), 1);
        assert_eq!(modifiers[0].signed_modifier, 0);
    }

    #[tokio::test]
    async fn assess_parses_llm_modifier() {
        let service = DiceService::new(
            Arc::new(EchoLlm(r#"{"signed_modifier": 15, "rationale": "favorable"}"#)),
            Arc::new(FixedRandom(50)),
        );
        let tropes = vec![Trope::new("Chosen One", "destiny finds the unwilling")];
        let modifiers = service
            .assess_fate_modifiers("open the door", "Keeper", &tropes, "a dark hallway")
            .await;
        assert_eq!(modifiers[0].signed_modifier, 15);
    }

    #[tokio::test]
    async fn resolve_action_honors_override_roll() {
        let service = DiceService::new(
            Arc::new(EchoLlm(r#"{"signed_modifier": 0, "rationale": "neutral"}"#)),
            Arc::new(FixedRandom(99)),
        );
        let corpus_file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(corpus_file.path(), "name,description,media,title\n").unwrap();
        let corpus = TropeCorpus::load(corpus_file.path()).unwrap();
        let pool = vec![Trope::new("A", "a")];
        let (roll, drawn) = service
            .resolve_action("act", "Keeper", "ctx", &pool, &corpus, 1, Some(10))
            .await;
        assert_eq!(roll.raw, 10);
        assert_eq!(drawn.len(), 1);
    }
}
