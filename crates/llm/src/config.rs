use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use vidya_common::{Result, VidyaError};

use crate::client::{LlmClient, LlmRequest, LlmResponse};
use crate::gemini::GeminiClient;
use crate::openai::OpenAiClient;
use crate::retry::{RetryConfig, RetryingClient};

/// Remote AI provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "gemini" or "openai" (any OpenAI-compatible endpoint, including Ollama).
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Falls back to `GEMINI_API_KEY` / `OPENAI_API_KEY` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_requests: usize,
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_provider() -> String {
    "gemini".into()
}

fn default_model() -> String {
    "gemini-2.0-flash".into()
}

fn default_request_timeout_ms() -> u64 {
    20_000
}

fn default_max_concurrent() -> usize {
    2
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_key: None,
            api_url: None,
            temperature: None,
            max_tokens: None,
            request_timeout_ms: default_request_timeout_ms(),
            max_concurrent_requests: default_max_concurrent(),
            retry: RetryConfig::default(),
        }
    }
}

impl LlmConfig {
    /// Resolve the API key from config or environment variables.
    ///
    /// Priority:
    /// 1. Explicit non-empty `api_key`
    /// 2. `GEMINI_API_KEY` for "gemini", `OPENAI_API_KEY` for "openai"
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(ref key) = self.api_key {
            if !key.is_empty() {
                return Some(key.clone());
            }
        }

        let env_var = match self.provider.as_str() {
            "gemini" => "GEMINI_API_KEY",
            "openai" => "OPENAI_API_KEY",
            _ => return None,
        };

        std::env::var(env_var).ok().filter(|k| !k.is_empty())
    }
}

/// Bounds in-flight requests and fills request defaults from config.
pub struct SemaphoredClient {
    inner: Arc<dyn LlmClient>,
    semaphore: Arc<tokio::sync::Semaphore>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl SemaphoredClient {
    pub fn new(inner: Arc<dyn LlmClient>, max_concurrent: usize) -> Self {
        Self {
            inner,
            semaphore: Arc::new(tokio::sync::Semaphore::new(max_concurrent.max(1))),
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_defaults(mut self, temperature: Option<f32>, max_tokens: Option<u32>) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }
}

#[async_trait]
impl LlmClient for SemaphoredClient {
    async fn complete(&self, mut request: LlmRequest) -> Result<LlmResponse> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| VidyaError::Remote(format!("Semaphore acquire failed: {e}")))?;
        if request.temperature.is_none() {
            request.temperature = self.temperature;
        }
        if request.max_tokens.is_none() {
            request.max_tokens = self.max_tokens;
        }
        self.inner.complete(request).await
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}

pub fn build_llm_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>> {
    let timeout = Duration::from_millis(config.request_timeout_ms);
    let base_client: Box<dyn LlmClient> = match config.provider.as_str() {
        "gemini" => {
            let api_key = config.resolve_api_key().ok_or_else(|| {
                VidyaError::Config(
                    "Gemini requires an API key (api_key or GEMINI_API_KEY)".to_string(),
                )
            })?;
            let mut client = GeminiClient::new(config.model.clone(), api_key).with_timeout(timeout);
            if let Some(ref url) = config.api_url {
                client = client.with_base_url(url.clone());
            }
            Box::new(client)
        }
        "openai" => Box::new(
            OpenAiClient::new(
                config.api_url.clone(),
                config.model.clone(),
                config.resolve_api_key(),
            )
            .with_timeout(timeout),
        ),
        other => {
            return Err(VidyaError::Config(format!(
                "Unknown remote AI provider: {other}"
            )));
        }
    };

    let retrying: Box<dyn LlmClient> =
        Box::new(RetryingClient::new(base_client, config.retry.clone()));

    let semaphored = SemaphoredClient::new(Arc::from(retrying), config.max_concurrent_requests)
        .with_defaults(config.temperature, config.max_tokens);

    Ok(Arc::new(semaphored))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    const TOML_CONFIG: &str = r#"
provider = "openai"
model = "llama3.2"
api_url = "http://localhost:11434"
max_concurrent_requests = 4

[retry]
max_retries = 5
initial_delay_ms = 1000
"#;

    #[test]
    fn deserialize_config_from_toml() {
        let config: LlmConfig = toml::from_str(TOML_CONFIG).unwrap();
        assert_eq!(config.provider, "openai");
        assert_eq!(config.model, "llama3.2");
        assert_eq!(config.api_url.as_deref(), Some("http://localhost:11434"));
        assert!(config.api_key.is_none());
        assert_eq!(config.max_concurrent_requests, 4);
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.retry.initial_delay_ms, 1000);
        assert_eq!(config.retry.max_delay_ms, 30_000);
    }

    #[test]
    fn deserialize_config_defaults() {
        let config: LlmConfig = toml::from_str("api_key = \"AIza-test\"").unwrap();
        assert_eq!(config.provider, "gemini");
        assert_eq!(config.model, "gemini-2.0-flash");
        assert_eq!(config.max_concurrent_requests, 2);
        assert_eq!(config.request_timeout_ms, 20_000);
        assert_eq!(config.retry.max_retries, 3);
    }

    #[test]
    fn explicit_key_wins() {
        let config = LlmConfig {
            api_key: Some("from-config".into()),
            ..Default::default()
        };
        assert_eq!(config.resolve_api_key().as_deref(), Some("from-config"));
    }

    #[test]
    fn build_openai_client_without_key() {
        let config = LlmConfig {
            provider: "openai".to_string(),
            model: "llama3".to_string(),
            ..Default::default()
        };
        let client = build_llm_client(&config).unwrap();
        assert_eq!(client.model_name(), "llama3");
    }

    #[test]
    fn build_gemini_client_with_key() {
        let config = LlmConfig {
            api_key: Some("AIza-test".to_string()),
            ..Default::default()
        };
        let client = build_llm_client(&config).unwrap();
        assert_eq!(client.model_name(), "gemini-2.0-flash");
    }

    #[test]
    fn build_unknown_provider_fails() {
        let config = LlmConfig {
            provider: "palm".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            build_llm_client(&config),
            Err(VidyaError::Config(_))
        ));
    }

    struct CountingClient {
        concurrent: Arc<AtomicU32>,
        max_seen: Arc<AtomicU32>,
    }

    #[async_trait]
    impl LlmClient for CountingClient {
        async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
            let current = self.concurrent.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_seen.fetch_max(current, Ordering::SeqCst);
            tokio::time::sleep(tokio::time::Duration::from_millis(30)).await;
            self.concurrent.fetch_sub(1, Ordering::SeqCst);
            Ok(LlmResponse {
                content: format!("{:?}", request.temperature),
                model: "test".to_string(),
                usage: None,
                finish_reason: None,
            })
        }
        fn model_name(&self) -> &str {
            "test"
        }
    }

    #[tokio::test]
    async fn semaphored_client_limits_concurrency() {
        let concurrent = Arc::new(AtomicU32::new(0));
        let max_seen = Arc::new(AtomicU32::new(0));

        let inner = Arc::new(CountingClient {
            concurrent: concurrent.clone(),
            max_seen: max_seen.clone(),
        });

        let semaphored = Arc::new(SemaphoredClient::new(inner, 2));

        let mut handles = vec![];
        for _ in 0..6 {
            let client = semaphored.clone();
            handles.push(tokio::spawn(async move {
                client.complete(LlmRequest::default()).await.unwrap();
            }));
        }

        for h in handles {
            h.await.unwrap();
        }

        assert!(max_seen.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn semaphored_client_fills_defaults() {
        let inner = Arc::new(CountingClient {
            concurrent: Arc::new(AtomicU32::new(0)),
            max_seen: Arc::new(AtomicU32::new(0)),
        });
        let client = SemaphoredClient::new(inner, 1).with_defaults(Some(0.25), Some(100));

        let filled = client.complete(LlmRequest::default()).await.unwrap();
        assert_eq!(filled.content, "Some(0.25)");

        let explicit = client
            .complete(LlmRequest::default().with_temperature(0.9))
            .await
            .unwrap();
        assert_eq!(explicit.content, "Some(0.9)");
    }
}
