//! Locally hosted Ollama backend.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::error::LlmError;
use crate::llm::provider::{CompletionRequest, CompletionResponse, LlmProvider};

const PROVIDER: &str = "ollama";

/// Generation can be slow on CPU-only hosts.
const GENERATE_TIMEOUT: Duration = Duration::from_secs(120);
const PULL_TIMEOUT: Duration = Duration::from_secs(10);
const TAGS_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

/// Ollama `/api/generate` client.
///
/// No output token limit is sent; Ollama decides when to stop.
pub struct OllamaProvider {
    client: reqwest::Client,
    host: String,
    model: String,
}

impl OllamaProvider {
    pub fn new(host: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            host: host.into().trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }

    /// Poll `/api/tags` until the server answers.
    ///
    /// Returns `true` once ready. Never fails: after `attempts` the caller
    /// carries on and lets individual calls fall back.
    pub async fn wait_until_ready(&self, attempts: u32, interval: Duration) -> bool {
        let url = format!("{}/api/tags", self.host);
        for attempt in 1..=attempts {
            match self.client.get(&url).timeout(TAGS_TIMEOUT).send().await {
                Ok(resp) if resp.status().is_success() => {
                    info!(host = %self.host, attempt, "Ollama is ready");
                    return true;
                }
                Ok(resp) => debug!(status = %resp.status(), "Ollama not ready yet"),
                Err(e) => debug!(error = %e, "Ollama not reachable yet"),
            }
            info!("Waiting for Ollama ...");
            tokio::time::sleep(interval).await;
        }
        warn!(host = %self.host, "Ollama may not be ready, continuing anyway");
        false
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    /// Ask Ollama to pull the model. Failures are ignored.
    async fn warm_up(&self) {
        let url = format!("{}/api/pull", self.host);
        let result = self
            .client
            .post(&url)
            .json(&json!({ "name": self.model }))
            .timeout(PULL_TIMEOUT)
            .send()
            .await;
        if let Err(e) = result {
            debug!(model = %self.model, error = %e, "Model pull failed, generating anyway");
        }
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.warm_up().await;

        let mut options = serde_json::Map::new();
        if let Some(t) = request.temperature {
            options.insert("temperature".into(), json!(t));
        }
        let payload = json!({
            "model": self.model,
            "prompt": request.prompt_text(),
            "stream": false,
            "options": options,
        });

        let url = format!("{}/api/generate", self.host);
        let response = self
            .client
            .post(&url)
            .json(&payload)
            .timeout(GENERATE_TIMEOUT)
            .send()
            .await
            .map_err(|e| LlmError::from_reqwest(PROVIDER, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::BackendError {
                provider: PROVIDER.into(),
                reason: format!("HTTP {status}: {body}"),
            });
        }

        let data: GenerateResponse = response
            .json()
            .await
            .map_err(|e| LlmError::from_reqwest(PROVIDER, e))?;

        Ok(CompletionResponse {
            content: data.response.trim().to_string(),
        })
    }
}
