//! Generative backends.
//!
//! Supports:
//! - **Ollama**: locally hosted model service (`/api/generate`)
//! - **Groq**: hosted OpenAI-compatible chat completions
//!
//! Both implement [`LlmProvider`]; the backend is chosen from configuration.

pub mod groq;
pub mod ollama;
pub mod provider;

pub use groq::GroqProvider;
pub use ollama::OllamaProvider;
pub use provider::*;

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::error::ConfigError;

/// Supported LLM backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmBackend {
    Ollama,
    Groq,
}

impl FromStr for LlmBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "groq" => Ok(Self::Groq),
            other => Err(ConfigError::InvalidValue {
                key: "LLM_PROVIDER".into(),
                message: format!("unsupported provider '{other}' (expected 'ollama' or 'groq')"),
            }),
        }
    }
}

/// Configuration for creating an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub backend: LlmBackend,
    /// Only used by hosted backends.
    pub api_key: secrecy::SecretString,
    pub model: String,
    /// Ollama host or Groq API base, without trailing slash.
    pub base_url: String,
}

/// Create an LLM provider from configuration.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, ConfigError> {
    match config.backend {
        LlmBackend::Ollama => Ok(Arc::new(ollama_provider(config))),
        LlmBackend::Groq => {
            use secrecy::ExposeSecret;

            if config.api_key.expose_secret().trim().is_empty() {
                return Err(ConfigError::MissingRequired {
                    key: "GROQ_API_KEY".into(),
                    hint: "The groq backend needs an API key".into(),
                });
            }
            tracing::info!("Using Groq (model: {})", config.model);
            Ok(Arc::new(GroqProvider::new(
                &config.base_url,
                config.api_key.clone(),
                &config.model,
            )))
        }
    }
}

/// Like [`create_provider`], but waits for a local Ollama service to answer
/// before handing the provider out. Hosted backends are returned immediately.
pub async fn create_ready_provider(
    config: &LlmConfig,
    attempts: u32,
    interval: Duration,
) -> Result<Arc<dyn LlmProvider>, ConfigError> {
    match config.backend {
        LlmBackend::Ollama => {
            let provider = ollama_provider(config);
            provider.wait_until_ready(attempts, interval).await;
            Ok(Arc::new(provider))
        }
        LlmBackend::Groq => create_provider(config),
    }
}

fn ollama_provider(config: &LlmConfig) -> OllamaProvider {
    tracing::info!("Using Ollama (model: {}, host: {})", config.model, config.base_url);
    OllamaProvider::new(&config.base_url, &config.model)
}
