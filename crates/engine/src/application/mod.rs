pub mod dto;
pub mod state;

pub use state::AppState;
