//! Generative-text backends

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pensionweb_config::{LlmConfig, LlmProvider};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::FlowError;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// A model that answers a prompt with a JSON value
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// Provider name for logs and the settings page
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &str) -> Result<Value, FlowError>;
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    response_mime_type: &'static str,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiResponseContent,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    #[serde(default)]
    text: String,
}

/// Google Gemini `generateContent` client
#[derive(Clone)]
pub struct GeminiBackend {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl std::fmt::Debug for GeminiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiBackend")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &"***")
            .finish()
    }
}

impl GeminiBackend {
    pub fn new(config: &LlmConfig, api_key: String) -> Result<Self, FlowError> {
        if api_key.trim().is_empty() {
            return Err(FlowError::Disabled(format!(
                "{} is not set",
                config.api_key_env
            )));
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FlowError::Generation(e.to_string()))?;

        Ok(Self {
            http,
            base_url: GEMINI_BASE_URL.to_string(),
            model: config.model.clone(),
            api_key,
        })
    }

    fn transport_error(&self, error: reqwest::Error) -> FlowError {
        FlowError::Generation(error.to_string().replace(&self.api_key, "***"))
    }

    /// Point at another endpoint root
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

/// Strip a markdown code fence some models wrap JSON in
fn strip_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[async_trait]
impl GenerativeBackend for GeminiBackend {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, prompt: &str) -> Result<Value, FlowError> {
        let body = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GeminiGenerationConfig {
                response_mime_type: "application/json",
                temperature: 0.4,
            },
        };

        let url = format!(
            "{}/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );
        log::debug!("Sending prompt to {}", url.replace(&self.api_key, "***"));

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| self.transport_error(e))?;
        if !status.is_success() {
            log::error!("Gemini returned {}: {}", status, pensionweb_utils::truncate_chars(&text, 300));
            return Err(FlowError::Generation(format!("HTTP {}", status)));
        }

        let parsed: GeminiResponse = serde_json::from_str(&text)
            .map_err(|e| FlowError::Generation(format!("unreadable response: {}", e)))?;
        let answer = parsed
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.as_str())
            .ok_or_else(|| FlowError::Generation("no candidates in response".to_string()))?;

        serde_json::from_str(strip_fence(answer))
            .map_err(|e| FlowError::InvalidOutput(format!("model answer is not JSON: {}", e)))
    }
}

/// Backend used when no provider is configured; every call fails
#[derive(Debug, Clone)]
pub struct DisabledBackend {
    reason: String,
}

impl DisabledBackend {
    pub fn new(reason: &str) -> Self {
        Self {
            reason: reason.to_string(),
        }
    }
}

#[async_trait]
impl GenerativeBackend for DisabledBackend {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn generate(&self, _prompt: &str) -> Result<Value, FlowError> {
        Err(FlowError::Disabled(self.reason.clone()))
    }
}

/// Build the configured backend, reading the API key from the environment
pub fn from_config(config: &LlmConfig) -> Arc<dyn GenerativeBackend> {
    if config.provider == LlmProvider::Disabled {
        return Arc::new(DisabledBackend::new("provider disabled in configuration"));
    }
    let key = std::env::var(&config.api_key_env).unwrap_or_default();
    match GeminiBackend::new(config, key) {
        Ok(backend) => {
            log::info!("Flows use Gemini model {}", config.model);
            Arc::new(backend)
        }
        Err(e) => {
            log::warn!("Flows disabled: {}", e);
            Arc::new(DisabledBackend::new(&e.to_string()))
        }
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::spawn_backend;
    use axum::{Json, Router};
    use serde_json::json;

    fn config() -> LlmConfig {
        LlmConfig {
            provider: LlmProvider::Gemini,
            model: "test-model".to_string(),
            api_key_env: "PENSIONWEB_TEST_KEY".to_string(),
            timeout_secs: 5,
        }
    }

    #[test]
    fn test_strip_fence() {
        assert_eq!(strip_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_fence("  {\"a\":1} "), "{\"a\":1}");
    }

    #[test]
    fn test_missing_key_is_disabled() {
        let err = GeminiBackend::new(&config(), String::new()).unwrap_err();
        assert!(matches!(err, FlowError::Disabled(_)));
    }

    #[tokio::test]
    async fn test_disabled_backend_fails() {
        let backend = DisabledBackend::new("off");
        assert!(matches!(backend.generate("x").await, Err(FlowError::Disabled(_))));
    }

    #[tokio::test]
    async fn test_disabled_provider_from_config() {
        let mut config = config();
        config.provider = LlmProvider::Disabled;
        assert_eq!(from_config(&config).name(), "disabled");
    }

    #[tokio::test]
    async fn test_gemini_round_trip_against_stub() {
        let app = Router::new().fallback(
            |Json(body): Json<Value>| async move {
                let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap_or("").to_string();
                Json(json!({
                    "candidates": [{
                        "content": { "parts": [{ "text": format!("{{\"echo\": {}}}", prompt.len()) }] }
                    }]
                }))
            },
        );
        let base = spawn_backend(app).await;
        let backend = GeminiBackend::new(&config(), "k".to_string())
            .unwrap()
            .with_base_url(&base);
        let value = backend.generate("hello").await.unwrap();
        assert_eq!(value, json!({ "echo": 5 }));
    }
}
