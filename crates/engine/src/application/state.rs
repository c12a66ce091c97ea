//! Application state: one process-wide struct grouping every wired-up
//! service, grounded on the teacher's `infrastructure/state/game_services.rs`
//! "group related services into a typed struct with a constructor" idiom.
//! Unlike the teacher, there is only one such group here -- the engine has
//! no queue workers, sessions, or asset pipeline to split out.

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::Mutex;

use taleweave_domain::WorldId;

use crate::config::AppConfig;
use crate::infrastructure::llm::{HttpLlmClient, LlmPort, ResilientLlmClient};
use crate::infrastructure::prompt_registry::PromptRegistry;
use crate::infrastructure::random::{RandomPort, SystemRandom};
use crate::infrastructure::trope_corpus::TropeCorpus;
use crate::infrastructure::world_store::WorldStore;
use crate::infrastructure::EngineError;
use crate::use_cases::{ActEngine, BeatEngine, Conductor, DiceService, Director, SceneEngine, SeedingService};

pub struct AppState {
    pub config: AppConfig,
    pub world_store: Arc<WorldStore>,
    pub prompts: Arc<Mutex<PromptRegistry>>,
    pub corpus: Arc<TropeCorpus>,
    pub conductor: Arc<Conductor>,
    pub director: Arc<Director>,
    pub seeding: Arc<SeedingService>,
}

impl AppState {
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        let strong_llm: Arc<dyn LlmPort> = Arc::new(ResilientLlmClient::new(
            Arc::new(HttpLlmClient::new(&config.strong_llm)),
            config.retry.clone(),
        ));
        let fast_llm: Arc<dyn LlmPort> = Arc::new(ResilientLlmClient::new(
            Arc::new(HttpLlmClient::new(&config.fast_llm)),
            config.retry.clone(),
        ));
        let random: Arc<dyn RandomPort> = Arc::new(SystemRandom::new());

        let prompts = Arc::new(Mutex::new(PromptRegistry::new(config.prompts_dir.clone())));
        let corpus = Arc::new(
            TropeCorpus::load(&config.trope_corpus_path)
                .with_context(|| format!("loading trope corpus from {}", config.trope_corpus_path))?,
        );

        let dice = Arc::new(DiceService::new(fast_llm.clone(), random.clone()));
        let beats = Arc::new(BeatEngine::new(strong_llm.clone(), fast_llm.clone(), dice));
        let scene_engine = Arc::new(SceneEngine::new(
            strong_llm.clone(),
            fast_llm.clone(),
            random.clone(),
            beats,
        ));
        let act_engine = Arc::new(ActEngine::new(strong_llm.clone(), random.clone()));

        let conductor = Arc::new(Conductor::new(
            act_engine,
            scene_engine.clone(),
            prompts.clone(),
            corpus.clone(),
        ));
        let director = Arc::new(Director::new(scene_engine, prompts.clone(), corpus.clone()));
        let seeding = Arc::new(SeedingService::new(strong_llm, random));

        Ok(Self {
            config,
            world_store: Arc::new(WorldStore::new()),
            prompts,
            corpus,
            conductor,
            director,
            seeding,
        })
    }

    pub fn require_world_handle(&self, id: WorldId) -> Result<Arc<Mutex<taleweave_domain::WorldState>>, EngineError> {
        self.world_store.get(id).ok_or(EngineError::WorldNotFound(id))
    }
}
