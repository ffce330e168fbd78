//! OpenAI-compatible chat completions client.
//!
//! Also speaks to a school-local Ollama server, which is the default target.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use vidya_common::{Result, VidyaError};

use crate::client::{LlmClient, LlmRequest, LlmResponse, Role, TokenUsage};

pub(crate) const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct OpenAiMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    model: String,
    usage: Option<OpenAiUsage>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

pub struct OpenAiClient {
    base_url: String,
    model: String,
    api_key: Option<String>,
    timeout: Duration,
    http_client: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(base_url: Option<String>, model: String, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            model,
            api_key,
            timeout: DEFAULT_TIMEOUT,
            http_client: reqwest::Client::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn role_to_string(role: &Role) -> &'static str {
        match role {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    fn build_body(&self, request: &LlmRequest) -> OpenAiRequest {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if let Some(ref system) = request.system_prompt {
            messages.push(OpenAiMessage {
                role: "system".to_string(),
                content: system.clone(),
            });
        }
        messages.extend(request.messages.iter().map(|msg| OpenAiMessage {
            role: Self::role_to_string(&msg.role).to_string(),
            content: msg.content.clone(),
        }));

        OpenAiRequest {
            model: self.model.clone(),
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = self.build_body(&request);

        let mut http_req = self
            .http_client
            .post(&url)
            .timeout(self.timeout)
            .json(&body);
        if let Some(ref key) = self.api_key {
            http_req = http_req.bearer_auth(key);
        }

        let response = http_req
            .send()
            .await
            .map_err(|e| VidyaError::Remote(format!("OpenAI request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VidyaError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let oai_response: OpenAiResponse = response
            .json()
            .await
            .map_err(|e| VidyaError::Remote(format!("Failed to parse OpenAI response: {e}")))?;

        let choice = oai_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| VidyaError::Remote("No choices in OpenAI response".to_string()))?;

        Ok(LlmResponse {
            content: choice.message.content,
            model: oai_response.model,
            usage: oai_response.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
            }),
            finish_reason: choice.finish_reason,
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ChatMessage;

    #[test]
    fn request_body_matches_openai_format() {
        let client = OpenAiClient::new(None, "llama3.2".to_string(), Some("sk-test".to_string()));
        let request = LlmRequest {
            system_prompt: Some("You are a patient tutor.".to_string()),
            messages: vec![ChatMessage::user("Explain fractions")],
            temperature: Some(0.5),
            max_tokens: Some(512),
        };

        let json = serde_json::to_value(client.build_body(&request)).unwrap();

        assert_eq!(json["model"], "llama3.2");
        assert_eq!(json["temperature"], 0.5);
        assert_eq!(json["max_tokens"], 512);

        let messages = json["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[1]["role"], "user");
        assert_eq!(messages[1]["content"], "Explain fractions");
    }

    #[test]
    fn request_body_omits_unset_fields() {
        let client = OpenAiClient::new(None, "llama3.2".to_string(), None);
        let request = LlmRequest::prompt(None, "Hello");

        let json = serde_json::to_value(client.build_body(&request)).unwrap();

        assert_eq!(json["messages"].as_array().unwrap().len(), 1);
        assert!(json.get("temperature").is_none());
        assert!(json.get("max_tokens").is_none());
    }

    #[test]
    fn base_url_defaults_to_local_ollama_and_is_trimmed() {
        let client = OpenAiClient::new(None, "llama3".to_string(), None);
        assert_eq!(client.base_url, "http://localhost:11434");

        let client = OpenAiClient::new(Some("http://school-server:8080/".into()), "m".into(), None);
        assert_eq!(client.base_url, "http://school-server:8080");
    }
}
