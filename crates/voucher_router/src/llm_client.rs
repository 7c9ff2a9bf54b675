//! Text generation backends for the fallback tier.
//!
//! One explicit adapter: `TextGenerator::generate(prompt) -> String`.
//! `HttpTextGenerator` talks to Ollama or an OpenAI-compatible server;
//! `FakeTextGenerator` replays scripted replies for tests.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

/// `[llm]` section of the router configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_enabled() -> bool {
    true
}

fn default_endpoint() -> String {
    "http://127.0.0.1:11434".to_string()
}

fn default_model() -> String {
    "llama3.2:3b".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            endpoint: default_endpoint(),
            model: default_model(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Transport-level failures of a text generation call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LlmError {
    #[error("LLM is disabled in configuration")]
    Disabled,

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Request timeout after {0} seconds")]
    Timeout(u64),

    #[error("LLM returned empty response")]
    EmptyResponse,

    #[error("Invalid JSON response: {0}")]
    InvalidJson(String),
}

impl LlmError {
    /// Worth another attempt. A disabled backend never recovers mid-request.
    pub fn is_transient(&self) -> bool {
        !matches!(self, LlmError::Disabled)
    }
}

pub trait TextGenerator: Send + Sync {
    /// Generate a completion for `prompt`.
    fn generate(&self, prompt: &str) -> Result<String, LlmError>;

    /// Backend name for logs.
    fn name(&self) -> &str;
}

/// HTTP backend (blocking).
pub struct HttpTextGenerator {
    config: LlmConfig,
    client: reqwest::blocking::Client,
}

impl HttpTextGenerator {
    pub fn new(config: LlmConfig) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    fn is_ollama_endpoint(&self) -> bool {
        self.config.endpoint.contains("11434") || self.config.endpoint.contains("ollama")
    }

    fn send_error(&self, e: reqwest::Error) -> LlmError {
        if e.is_timeout() {
            LlmError::Timeout(self.config.timeout_secs)
        } else {
            LlmError::Http(format!("Request failed: {}", e))
        }
    }

    fn call_ollama(&self, prompt: &str) -> Result<String, LlmError> {
        let url = format!("{}/api/generate", self.config.endpoint.trim_end_matches('/'));
        let body = serde_json::json!({
            "model": self.config.model,
            "prompt": prompt,
            "stream": false,
            "format": "json",
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| self.send_error(e))?;

        if !response.status().is_success() {
            return Err(LlmError::Http(format!("HTTP {} from Ollama", response.status())));
        }

        let json: serde_json::Value = response
            .json()
            .map_err(|e| LlmError::InvalidJson(format!("Failed to parse response: {}", e)))?;

        non_empty(json.get("response").and_then(|v| v.as_str()))
    }

    fn call_openai_compatible(&self, prompt: &str) -> Result<String, LlmError> {
        let url = format!(
            "{}/v1/chat/completions",
            self.config.endpoint.trim_end_matches('/')
        );
        let body = serde_json::json!({
            "model": self.config.model,
            "messages": [
                {"role": "user", "content": prompt},
            ],
            "response_format": {"type": "json_object"},
        });

        let mut request = self.client.post(&url).json(&body);
        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().map_err(|e| self.send_error(e))?;

        if !response.status().is_success() {
            return Err(LlmError::Http(format!(
                "HTTP {} from OpenAI-compatible API",
                response.status()
            )));
        }

        let json: serde_json::Value = response
            .json()
            .map_err(|e| LlmError::InvalidJson(format!("Failed to parse response: {}", e)))?;

        non_empty(
            json.get("choices")
                .and_then(|v| v.get(0))
                .and_then(|v| v.get("message"))
                .and_then(|v| v.get("content"))
                .and_then(|v| v.as_str()),
        )
    }
}

fn non_empty(text: Option<&str>) -> Result<String, LlmError> {
    match text {
        Some(t) if !t.trim().is_empty() => Ok(t.to_string()),
        _ => Err(LlmError::EmptyResponse),
    }
}

impl TextGenerator for HttpTextGenerator {
    fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        if !self.config.enabled {
            return Err(LlmError::Disabled);
        }

        if self.is_ollama_endpoint() {
            debug!(model = %self.config.model, chars = prompt.len(), "calling Ollama");
            self.call_ollama(prompt)
        } else {
            debug!(model = %self.config.model, chars = prompt.len(), "calling OpenAI-compatible API");
            self.call_openai_compatible(prompt)
        }
    }

    fn name(&self) -> &str {
        if self.is_ollama_endpoint() {
            "ollama"
        } else {
            "openai-compatible"
        }
    }
}

/// Scripted backend. Replies are consumed in order; the last one repeats.
pub struct FakeTextGenerator {
    responses: Mutex<VecDeque<Result<String, LlmError>>>,
    prompts: Mutex<Vec<String>>,
}

impl FakeTextGenerator {
    pub fn new(responses: Vec<Result<String, LlmError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn always(reply: impl Into<String>) -> Self {
        Self::new(vec![Ok(reply.into())])
    }

    pub fn always_error(error: LlmError) -> Self {
        Self::new(vec![Err(error)])
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or_default()
    }

    /// Every prompt received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

impl TextGenerator for FakeTextGenerator {
    fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        let mut responses = self
            .responses
            .lock()
            .map_err(|_| LlmError::Http("fake generator poisoned".to_string()))?;

        match responses.len() {
            0 => Err(LlmError::EmptyResponse),
            1 => responses[0].clone(),
            _ => responses.pop_front().unwrap_or(Err(LlmError::EmptyResponse)),
        }
    }

    fn name(&self) -> &str {
        "fake"
    }
}
