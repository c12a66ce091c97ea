pub mod act_engine;
pub mod beat_engine;
pub mod conductor;
pub mod dice_service;
pub mod director;
pub mod scene_engine;
pub mod seeding;

pub use act_engine::ActEngine;
pub use beat_engine::BeatEngine;
pub use conductor::{AdvanceEvent, Conductor};
pub use dice_service::DiceService;
pub use director::Director;
pub use scene_engine::SceneEngine;
pub use seeding::SeedingService;
