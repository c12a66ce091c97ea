//! Act Engine (C10, large scale), grounded on
//! `original_source/services/narrative_engine.py`'s plan/run/complete act
//! lifecycle.

use std::sync::Arc;

use serde::Deserialize;
use taleweave_domain::{
    Act, ActPlan, NarrativeThread, NarrativeThreadState, TeleologyShift, Trope, TropeSample,
    TropeSampleSource, WorldEvent,
};
use tracing::warn;

use crate::infrastructure::llm::{complete_structured, LlmPort};
use crate::infrastructure::random::RandomPort;
use crate::infrastructure::trope_corpus::TropeCorpus;

#[derive(Debug, Deserialize)]
struct TeleologyShiftCheck {
    #[serde(default)]
    shifted: bool,
    #[serde(default)]
    new_teleology: Option<String>,
    #[serde(default)]
    reason: String,
}

pub struct ActEngine {
    strong_llm: Arc<dyn LlmPort>,
    random: Arc<dyn RandomPort>,
}

impl ActEngine {
    pub fn new(strong_llm: Arc<dyn LlmPort>, random: Arc<dyn RandomPort>) -> Self {
        Self { strong_llm, random }
    }

    /// Plans the next act from the teleology, context, prior-act summary,
    /// thread states, and character roster. Falls back to a three-scene
    /// plan with no goals on parse failure (SPEC_FULL.md §4.8 Plan).
    pub async fn plan(
        &self,
        act_number: u32,
        teleology: &str,
        context: &str,
        prior_act_summary: &str,
        thread_states: &[NarrativeThreadState],
        character_roster: &[String],
    ) -> Act {
        let system = "You plan the next act of an ongoing story. Respond with JSON only.";
        let user = format!(
            "Teleology: {teleology}\nContext: {context}\nPrior act summary: {prior_act_summary}\n\
             Thread states: {}\nCharacters: {}",
            thread_states
                .iter()
                .map(|t| t.thread.text.as_str())
                .collect::<Vec<_>>()
                .join("; "),
            character_roster.join(", "),
        );

        #[derive(Debug, Deserialize)]
        struct PlannedAct {
            title: String,
            plan: ActPlan,
        }

        let planned: Result<PlannedAct, _> = complete_structured(
            self.strong_llm.as_ref(),
            system,
            &user,
            "{title: string, plan: {planned_scene_sketches: [string], thread_goals: object, \
             character_arcs: object, world_events_planned: [string]}}",
        )
        .await;

        let (title, plan) = match planned {
            Ok(p) => (p.title, p.plan),
            Err(err) => {
                warn!(error = %err, "act planning failed, using three-scene fallback");
                (format!("Act {act_number}"), ActPlan::three_scene_fallback())
            }
        };

        let mut act = Act::planned(act_number, title, plan);
        act.begin_in_progress();
        act
    }

    /// Finalizes a completed act: world events, a possible teleology shift
    /// (at most one per act), and context evolution (SPEC_FULL.md §4.8
    /// Complete).
    pub async fn complete(
        &self,
        act: &mut Act,
        teleology: &mut String,
        context: &mut String,
        thread_states: &[NarrativeThreadState],
        corpus: &TropeCorpus,
    ) {
        let act_summary = act
            .scenes
            .iter()
            .map(|s| s.full_prose.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let resolved_threads = thread_states
            .iter()
            .filter(|t| t.status == taleweave_domain::ThreadStatus::Resolved)
            .map(|t| t.thread.text.as_str())
            .collect::<Vec<_>>()
            .join("; ");

        let events = self.generate_world_events(&act_summary, thread_states, corpus).await;
        act.world_events.extend(events);

        if let Some(shift) = self.check_teleology_shift(teleology, &act_summary, &resolved_threads).await {
            *teleology = shift.shifted.clone();
            act.teleology_shift = Some(shift);
        }

        *context = self.evolve_context(context, &act_summary, &act.world_events).await;
        act.context_evolution = context.clone();
        act.complete();
    }

    async fn generate_world_events(
        &self,
        act_summary: &str,
        thread_states: &[NarrativeThreadState],
        corpus: &TropeCorpus,
    ) -> Vec<WorldEvent> {
        let tropes: Vec<Trope> = corpus.sample_random(self.random.as_ref(), 2);
        let trope_text = TropeSample::new(tropes, TropeSampleSource::Random).to_prompt_text();

        #[derive(Debug, Deserialize)]
        struct RawEvent {
            description: String,
            #[serde(default)]
            impact_on_context: String,
            #[serde(default)]
            affected_characters: Vec<String>,
            #[serde(default)]
            affected_threads: Vec<String>,
            #[serde(default)]
            spawned_threads: Vec<String>,
        }

        let system = "You derive world events from this act's events. Respond with a JSON array (may be empty).";
        let user = format!(
            "Act summary: {act_summary}\nThread states: {}\nLiterary fate: {trope_text}",
            thread_states
                .iter()
                .map(|t| t.thread.text.as_str())
                .collect::<Vec<_>>()
                .join("; "),
        );
        let result: Result<Vec<RawEvent>, _> = complete_structured(
            self.strong_llm.as_ref(),
            system,
            &user,
            "[{description: string, impact_on_context: string, affected_characters: [string], \
             affected_threads: [string], spawned_threads: [string]}]",
        )
        .await;

        result
            .unwrap_or_else(|err| {
                warn!(error = %err, "world event generation failed, producing none");
                vec![]
            })
            .into_iter()
            .map(|e| {
                WorldEvent::new(
                    e.description,
                    e.impact_on_context,
                    e.affected_characters,
                    e.affected_threads,
                    e.spawned_threads.into_iter().map(NarrativeThread::new).collect(),
                )
            })
            .collect()
    }

    async fn check_teleology_shift(
        &self,
        teleology: &str,
        act_summary: &str,
        resolved_threads: &str,
    ) -> Option<TeleologyShift> {
        let system = "You decide whether an act's events should shift the story's core teleology. Respond with JSON only.";
        let user = format!(
            "Original teleology: {teleology}\nAccumulated events: {act_summary}\nResolved threads: {resolved_threads}"
        );
        let result: Result<TeleologyShiftCheck, _> = complete_structured(
            self.strong_llm.as_ref(),
            system,
            &user,
            "{shifted: boolean, new_teleology: string, reason: string}",
        )
        .await;

        match result {
            Ok(check) if check.shifted => check.new_teleology.map(|new_teleology| TeleologyShift {
                original: teleology.to_string(),
                shifted: new_teleology,
                reason: check.reason,
            }),
            Ok(_) => None,
            Err(err) => {
                warn!(error = %err, "teleology shift check failed, leaving teleology unchanged");
                None
            }
        }
    }

    async fn evolve_context(&self, context: &str, act_summary: &str, world_events: &[WorldEvent]) -> String {
        let events_text = world_events
            .iter()
            .map(|e| e.description.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        let system = "You rewrite the story's context given what just happened. Respond with the new context as plain text.";
        let user = format!("Current context: {context}\nAct summary: {act_summary}\nWorld events: {events_text}");
        self.strong_llm
            .complete(system, &user, Default::default())
            .await
            .unwrap_or_else(|err| {
                warn!(error = %err, "context evolution failed, leaving context unchanged");
                context.to_string()
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

    #[tokio::test]
    async fn plan_falls_back_to_three_scenes_on_garbage() {
        let engine = ActEngine::new(Arc::new(EchoLlm("garbage")), Arc::new(FixedRandom(1)));
        let act = engine.plan(1, "t", "c", "", &[], &[]).await;
        assert_eq!(act.planned_scene_count(), 3);
    }

    #[tokio::test]
    async fn complete_leaves_teleology_unchanged_on_llm_failure() {
        let engine = ActEngine::new(Arc::new(EchoLlm("garbage")), Arc::new(FixedRandom(1)));
        let mut act = engine.plan(1, "t", "c", "", &[], &[]).await;
        let mut teleology = "original".to_string();
        let mut context = "ctx".to_string();
        let corpus_file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(corpus_file.path(), "name,description,media,title\n").unwrap();
        let corpus = TropeCorpus::load(corpus_file.path()).unwrap();
        engine.complete(&mut act, &mut teleology, &mut context, &[], &corpus).await;
        assert_eq!(teleology, "original");
        assert!(act.is_completed());
    }
}
