//! Completion backend adapters.
//!
//! The extractor only needs single-turn "prompt in, text out" generation,
//! so the adapter surface is one method. Any backend honoring the JSON
//! output contract is substitutable; tests register a stub that never
//! touches the network.

use async_trait::async_trait;
use log::debug;
use serde_json::json;
use std::sync::Arc;

use crate::errors::Result;
use crate::extraction::extraction_errors::ExtractionError;
use crate::secrets::{SecretStore, COMPLETION_API_KEY};

/// A single-turn completion request.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

#[async_trait]
pub trait CompletionBackend: Send + Sync {
    fn backend_id(&self) -> &str;

    /// Returns the raw completion text.
    async fn complete(&self, request: CompletionRequest) -> Result<String>;
}

/// OpenAI-compatible `/chat/completions` backend.
///
/// Works against any server speaking that dialect (hosted APIs, Ollama,
/// llama.cpp, vLLM); the API key is optional for local servers.
pub struct HttpCompletionBackend {
    client: reqwest::Client,
    base_url: String,
    model_id: String,
    secrets: Arc<dyn SecretStore>,
}

impl HttpCompletionBackend {
    pub fn new(base_url: String, model_id: String, secrets: Arc<dyn SecretStore>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model_id,
            secrets,
        }
    }
}

#[async_trait]
impl CompletionBackend for HttpCompletionBackend {
    fn backend_id(&self) -> &str {
        "openai-compatible"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let payload = json!({
            "model": self.model_id,
            "messages": [
                { "role": "system", "content": request.system_prompt },
                { "role": "user", "content": request.user_prompt },
            ],
            "temperature": request.temperature.unwrap_or(0.0),
            "max_tokens": request.max_tokens.unwrap_or(400),
        });

        let mut builder = self.client.post(&url).json(&payload);
        if let Some(api_key) = self.secrets.get_secret(COMPLETION_API_KEY)? {
            builder = builder.bearer_auth(api_key);
        }

        debug!("Requesting completion from {} ({})", url, self.model_id);

        let resp = builder.send().await.map_err(ExtractionError::Http)?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(ExtractionError::Backend(format!(
                "completion request failed ({}): {}",
                status, body
            ))
            .into());
        }

        let body: serde_json::Value = resp.json().await.map_err(ExtractionError::Http)?;
        let content = body
            .pointer("/choices/0/message/content")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                ExtractionError::Backend("completion response had no content".to_string())
            })?;

        Ok(content.to_string())
    }
}

/// A stub backend returning a fixed response. Used by tests.
pub struct StubBackend {
    response: String,
    calls: std::sync::atomic::AtomicU32,
}

impl StubBackend {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            calls: std::sync::atomic::AtomicU32::new(0),
        }
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionBackend for StubBackend {
    fn backend_id(&self) -> &str {
        "stub"
    }

    async fn complete(&self, _request: CompletionRequest) -> Result<String> {
        self.calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(self.response.clone())
    }
}
