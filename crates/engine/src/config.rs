//! Environment-driven configuration, loaded once at startup.
//!
//! Mirrors the teacher's `AppConfig::from_env()` convention: every
//! deployment-varying value comes from an environment variable with a sane
//! default, so the server is runnable with nothing but an LLM endpoint
//! configured.

use std::net::SocketAddr;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value}")]
    InvalidValue { var: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct LlmTierConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay_ms: 500,
            max_delay_ms: 8_000,
            jitter_factor: 0.2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub prompts_dir: String,
    pub trope_corpus_path: String,
    pub strong_llm: LlmTierConfig,
    pub fast_llm: LlmTierConfig,
    pub retry: RetryConfig,
    /// Window size for any `taleweave_domain::ConversationMemory` a consumer
    /// constructs. No component in the core narrative pipeline owns one
    /// today; this configures the default for whichever future surface
    /// does.
    pub conversation_window: usize,
    pub default_trope_pool_size: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port: u16 = env_or("NARRATIVE_ENGINE_PORT", "8080").parse().map_err(|_| {
            ConfigError::InvalidValue {
                var: "NARRATIVE_ENGINE_PORT",
                value: env_or("NARRATIVE_ENGINE_PORT", "8080"),
            }
        })?;

        let conversation_window: usize =
            env_or("NARRATIVE_ENGINE_CONVERSATION_WINDOW", "20")
                .parse()
                .unwrap_or(20);
        let default_trope_pool_size: usize =
            env_or("NARRATIVE_ENGINE_DEFAULT_TROPE_POOL_SIZE", "10")
                .parse()
                .unwrap_or(10);

        Ok(Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], port)),
            prompts_dir: env_or("NARRATIVE_ENGINE_PROMPTS_DIR", "prompts"),
            trope_corpus_path: env_or("NARRATIVE_ENGINE_TROPE_CORPUS", "data/tropes.csv"),
            strong_llm: LlmTierConfig {
                base_url: env_or("NARRATIVE_ENGINE_STRONG_LLM_URL", "http://localhost:11434/v1"),
                model: env_or("NARRATIVE_ENGINE_STRONG_LLM_MODEL", "strong-model"),
                api_key: std::env::var("NARRATIVE_ENGINE_STRONG_LLM_API_KEY").ok(),
            },
            fast_llm: LlmTierConfig {
                base_url: env_or("NARRATIVE_ENGINE_FAST_LLM_URL", "http://localhost:11434/v1"),
                model: env_or("NARRATIVE_ENGINE_FAST_LLM_MODEL", "fast-model"),
                api_key: std::env::var("NARRATIVE_ENGINE_FAST_LLM_API_KEY").ok(),
            },
            retry: RetryConfig::default(),
            conversation_window,
            default_trope_pool_size,
        })
    }
}

fn env_or(var: &str, default: &str) -> String {
    std::env::var(var).unwrap_or_else(|_| default.to_string())
}
