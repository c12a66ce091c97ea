pub mod http_client;
pub mod port;
pub mod resilient;
pub mod structured;

pub use http_client::HttpLlmClient;
pub use port::{CompletionOptions, LlmCallError, LlmPort, LlmStructureError};
pub use resilient::ResilientLlmClient;
pub use structured::{complete_structured, format_instructions};
