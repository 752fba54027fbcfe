//! OpenAI-compatible chat-completions client (Ollama, vLLM, llama.cpp, ...).

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::ModelInvoker;
use crate::debate::context::{ContextEntry, Speaker};
use crate::error::InvocationFailure;

const MAX_ERROR_BODY: usize = 300;

/// Endpoint settings for [`OpenAiCompatClient`].
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Full chat-completions URL.
    pub api_url: String,
    /// Bearer token; local servers usually need none.
    pub api_key: Option<String>,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:11434/v1/chat/completions".to_string(),
            api_key: None,
            request_timeout: Duration::from_secs(300),
            connect_timeout: Duration::from_secs(60),
        }
    }
}

/// Wire-format chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Map context entries onto chat roles.
///
/// Earlier turns become `user` messages prefixed with the speaking role's
/// name and round so the model can tell participants apart.
pub fn to_chat_messages(context: &[ContextEntry]) -> Vec<ChatMessage> {
    context
        .iter()
        .map(|entry| match &entry.speaker {
            Speaker::System => ChatMessage {
                role: "system".to_string(),
                content: entry.text.clone(),
            },
            Speaker::User => ChatMessage {
                role: "user".to_string(),
                content: entry.text.clone(),
            },
            Speaker::Participant {
                role_name, round, ..
            } => ChatMessage {
                role: "user".to_string(),
                content: format!("**{}** (Round {}): {}", role_name, round, entry.text),
            },
        })
        .collect()
}

/// Extract `choices[0].message.content` from a completion response.
pub fn parse_completion(body: &Value) -> Result<String, InvocationFailure> {
    let choice = body["choices"]
        .get(0)
        .ok_or_else(|| InvocationFailure::MalformedResponse("no choices in response".into()))?;
    choice["message"]["content"]
        .as_str()
        .map(|s| s.to_string())
        .ok_or_else(|| InvocationFailure::MalformedResponse("choice has no message content".into()))
}

fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY;
    while end > 0 && !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

/// HTTP client speaking the OpenAI chat-completions protocol.
pub struct OpenAiCompatClient {
    client: reqwest::Client,
    config: ProviderConfig,
}

impl OpenAiCompatClient {
    pub fn new(config: ProviderConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn classify(&self, err: &reqwest::Error) -> InvocationFailure {
        if err.is_timeout() {
            InvocationFailure::Timeout(self.config.request_timeout)
        } else {
            InvocationFailure::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl ModelInvoker for OpenAiCompatClient {
    async fn invoke(
        &self,
        model_id: &str,
        context: &[ContextEntry],
    ) -> Result<String, InvocationFailure> {
        let payload = json!({
            "model": model_id,
            "messages": to_chat_messages(context),
        });

        let start = Instant::now();
        let mut request = self.client.post(&self.config.api_url).json(&payload);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            warn!(model = model_id, "HTTP request failed: {}", e);
            self.classify(&e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(model = model_id, status = %status, "Provider API error");
            return Err(InvocationFailure::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let body: Value = response.json().await.map_err(|e| {
            if e.is_timeout() {
                self.classify(&e)
            } else {
                InvocationFailure::MalformedResponse(e.to_string())
            }
        })?;

        let content = parse_completion(&body)?;
        debug!(
            model = model_id,
            elapsed_ms = start.elapsed().as_millis() as u64,
            chars = content.len(),
            "Completion received"
        );
        Ok(content)
    }
}
