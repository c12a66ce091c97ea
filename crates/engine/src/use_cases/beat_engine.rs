//! Beat Engine (C8, small scale), grounded on
//! `original_source/services/narrative_engine.py`'s per-beat pipeline:
//! generate candidate actions once per scene, then resolve each action
//! through dice -> narration -> prose -> delta, four separate LLM calls.

use std::sync::Arc;

use serde::Deserialize;
use taleweave_domain::{Beat, CharacterDelta, SceneId, Trope};
use tracing::warn;

use crate::infrastructure::llm::{complete_structured, LlmPort};
use crate::infrastructure::prompt_registry::PromptRegistry;
use crate::infrastructure::trope_corpus::TropeCorpus;
use crate::use_cases::dice_service::DiceService;

#[derive(Debug, Deserialize)]
struct GeneratedAction {
    actor: String,
    action: String,
}

pub struct BeatEngine {
    strong_llm: Arc<dyn LlmPort>,
    fast_llm: Arc<dyn LlmPort>,
    dice: Arc<DiceService>,
}

impl BeatEngine {
    pub fn new(strong_llm: Arc<dyn LlmPort>, fast_llm: Arc<dyn LlmPort>, dice: Arc<DiceService>) -> Self {
        Self {
            strong_llm,
            fast_llm,
            dice,
        }
    }

    /// Generates the scene's full action roster once. Validates every
    /// returned actor against `roster`; on parse failure or an
    /// out-of-roster actor, falls back to one neutral observation action
    /// per actor so the scene can never stall (SPEC_FULL.md §4.6 Generate).
    pub async fn generate(
        &self,
        roster: &[String],
        scene_context: &str,
        act_goals: &str,
        thread_states_summary: &str,
    ) -> Vec<(String, String)> {
        let system = "You propose one action per character for this scene. Respond with a JSON array of {actor, action} objects.";
        let user = format!(
            "Scene context: {scene_context}\nAct goals: {act_goals}\nThread states: {thread_states_summary}\nRoster: {}",
            roster.join(", ")
        );
        let result: Result<Vec<GeneratedAction>, _> = complete_structured(
            self.strong_llm.as_ref(),
            system,
            &user,
            "[{actor: string, action: string}]",
        )
        .await;

        match result {
            Ok(actions) => {
                let valid: Vec<(String, String)> = actions
                    .into_iter()
                    .filter(|a| roster.contains(&a.actor))
                    .map(|a| (a.actor, a.action))
                    .collect();
                if valid.is_empty() {
                    warn!("beat generation returned no roster-valid actions, falling back");
                    Self::neutral_actions(roster)
                } else {
                    valid
                }
            }
            Err(err) => {
                warn!(error = %err, "beat generation failed, falling back to neutral actions");
                Self::neutral_actions(roster)
            }
        }
    }

    fn neutral_actions(roster: &[String]) -> Vec<(String, String)> {
        roster
            .iter()
            .map(|actor| (actor.clone(), "observes the scene quietly".to_string()))
            .collect()
    }

    /// Resolves one action into a fully-formed `Beat`: dice, narration,
    /// prose, delta (SPEC_FULL.md §4.6 Resolve).
    #[allow(clippy::too_many_arguments)]
    pub async fn resolve(
        &self,
        prompts: &mut PromptRegistry,
        scene_id: SceneId,
        sequence: u32,
        actor: &str,
        action: &str,
        scene_context: &str,
        previous_prose: &str,
        trope_pool: &[Trope],
        corpus: &TropeCorpus,
        n_tropes: usize,
        override_roll: Option<i32>,
    ) -> Beat {
        let (dice_roll, tropes_active) = self
            .dice
            .resolve_action(action, actor, scene_context, trope_pool, corpus, n_tropes, override_roll)
            .await;

        let modifiers_summary = dice_roll
            .modifiers
            .iter()
            .map(|m| format!("{} ({:+})", m.trope.name, m.signed_modifier))
            .collect::<Vec<_>>()
            .join(", ");

        let actual_outcome = self
            .narrate(prompts, actor, action, &dice_roll.outcome, scene_context, &modifiers_summary)
            .await;
        let prose = self.write_prose(prompts, actor, &actual_outcome, previous_prose).await;
        let delta = self.compute_delta(actor, &actual_outcome).await;

        Beat::new(
            scene_id,
            sequence,
            actor,
            action,
            dice_roll,
            actual_outcome,
            prose,
            vec![delta],
            tropes_active,
        )
    }

    async fn narrate(
        &self,
        prompts: &mut PromptRegistry,
        actor: &str,
        action: &str,
        outcome: &taleweave_domain::DiceOutcome,
        scene_context: &str,
        modifiers_summary: &str,
    ) -> String {
        let outcome_label = format!("{outcome:?}");
        let vars = [
            ("actor", actor),
            ("action", action),
            ("outcome", outcome_label.as_str()),
            ("scene_context", scene_context),
            ("modifiers", modifiers_summary),
        ];
        let user = match prompts.render("embodiers", "narration", &vars) {
            Ok(rendered) => rendered,
            Err(err) => {
                warn!(error = %err, "narration template unavailable, using inline fallback");
                format!(
                    "Actor {actor} attempts: {action}. The dice outcome is {outcome_label}. \
                     Narrate what actually happens, consistent with that outcome, without \
                     overriding it. Scene: {scene_context}. Active modifiers: {modifiers_summary}."
                )
            }
        };
        self.strong_llm
            .complete(
                "You narrate the concrete result of an action given a pre-decided dice outcome. Never contradict the outcome tier.",
                &user,
                Default::default(),
            )
            .await
            .unwrap_or_else(|err| {
                warn!(error = %err, "narration call failed, using outcome label as fallback");
                format!("{actor} {action} -- outcome: {outcome_label}")
            })
    }

    async fn write_prose(&self, prompts: &mut PromptRegistry, actor: &str, actual_outcome: &str, previous_prose: &str) -> String {
        let vars = [
            ("actor", actor),
            ("actual_outcome", actual_outcome),
            ("previous_prose", previous_prose),
        ];
        let user = match prompts.render("embodiers", "prose", &vars) {
            Ok(rendered) => rendered,
            Err(err) => {
                warn!(error = %err, "prose template unavailable, using inline fallback");
                format!(
                    "Rewrite the following as theatrical stage prose, with action parentheticals \
                     and dialogue, continuing naturally from the previous beat.\n\
                     Previous: {previous_prose}\nThis beat: {actual_outcome}"
                )
            }
        };
        self.strong_llm
            .complete(
                "You write theatrical stage prose for one narrative beat.",
                &user,
                Default::default(),
            )
            .await
            .unwrap_or_else(|err| {
                warn!(error = %err, "prose call failed, falling back to plain outcome text");
                actual_outcome.to_string()
            })
    }

    async fn compute_delta(&self, actor: &str, actual_outcome: &str) -> CharacterDelta {
        let system = "You compute how this beat changed the acting character's internal state. Respond with JSON only.";
        let user = format!(
            "Character: {actor}\nWhat happened: {actual_outcome}\n\nReturn a character delta."
        );
        let result: Result<CharacterDelta, _> = complete_structured(
            self.fast_llm.as_ref(),
            system,
            &user,
            "{character_name: string, new_short_term_memories: [string], \
             new_long_term_memories: [string], internal_state_shift: string, \
             ambition_shift: string, contradiction_shifts: [string], physical_state_change: string}",
        )
        .await;

        result.unwrap_or_else(|err| {
            warn!(error = %err, actor, "delta computation failed, synthesizing minimal delta");
            CharacterDelta::minimal(actor, actual_outcome)
        })
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

    fn empty_corpus() -> TropeCorpus {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "name,description,media,title\n").unwrap();
        TropeCorpus::load(file.path()).unwrap()
    }

    #[tokio::test]
    async fn generate_falls_back_to_neutral_on_garbage() {
        let llm = Arc::new(EchoLlm("not json"));
        let dice = Arc::new(DiceService::new(llm.clone(), Arc::new(FixedRandom(50))));
        let engine = BeatEngine::new(llm.clone(), llm, dice);
        let roster = vec!["Keeper".to_string(), "Ren".to_string()];
        let actions = engine.generate(&roster, "ctx", "goals", "threads").await;
        assert_eq!(actions.len(), 2);
        assert!(actions.iter().all(|(_, a)| a.contains("observes")));
    }

    #[tokio::test]
    async fn resolve_produces_a_beat_with_matching_actor() {
        let llm = Arc::new(EchoLlm(r#"{"character_name": "Keeper", "new_short_term_memories": ["did it"]}"#));
        let dice = Arc::new(DiceService::new(llm.clone(), Arc::new(FixedRandom(50))));
        let engine = BeatEngine::new(llm.clone(), llm, dice);
        let mut prompts = PromptRegistry::new(tempfile::tempdir().unwrap().path());
        let corpus = empty_corpus();
        let beat = engine
            .resolve(
                &mut prompts,
                SceneId::new(),
                1,
                "Keeper",
                "open the diary",
                "a quiet library",
                "",
                &[],
                &corpus,
                2,
                Some(50),
            )
            .await;
        assert_eq!(beat.actor, "Keeper");
        assert_eq!(beat.dice_roll.raw, 50);
    }
}
