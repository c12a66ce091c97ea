pub mod error;
pub mod json_extract;
pub mod llm;
pub mod progress;
pub mod prompt_registry;
pub mod random;
pub mod trope_corpus;
pub mod world_store;

pub use error::EngineError;
pub use progress::{progress_channel, ProgressEvent, ProgressReceiver, ProgressSender};
pub use prompt_registry::{PromptError, PromptRegistry};
pub use random::{RandomPort, SystemRandom};
pub use trope_corpus::{TropeCorpus, TropeCorpusError};
pub use world_store::WorldStore;
