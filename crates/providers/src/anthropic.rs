//! Anthropic native chat integration via the Messages API.
//!
//! Differences from the OpenAI-compatible path:
//! - `x-api-key` header authentication (not Bearer)
//! - `anthropic-version` header
//! - System directive as a top-level field, not a message

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use voxlog_core::collaborator::Converse;
use voxlog_core::{ChatPrompt, Role, UpstreamError};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Anthropic Messages API chat collaborator.
pub struct AnthropicChat {
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    client: reqwest::Client,
}

impl AnthropicChat {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        temperature: f32,
        max_tokens: u32,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
            model: model.into(),
            temperature,
            max_tokens,
            client,
        }
    }

    /// Override the base URL (for proxies or testing).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Split a prompt into the top-level system string and the
    /// user/assistant message list Anthropic expects.
    fn split_prompt(prompt: &ChatPrompt) -> (Option<String>, Vec<AnthropicMessage>) {
        let mut system_parts: Vec<&str> = Vec::new();
        let mut messages = Vec::new();

        for msg in &prompt.messages {
            match msg.role {
                Role::System => system_parts.push(&msg.content),
                Role::User => messages.push(AnthropicMessage {
                    role: "user".into(),
                    content: msg.content.clone(),
                }),
                Role::Assistant => messages.push(AnthropicMessage {
                    role: "assistant".into(),
                    content: msg.content.clone(),
                }),
            }
        }

        let system = if system_parts.is_empty() {
            None
        } else {
            Some(system_parts.join("\n\n"))
        };

        (system, messages)
    }
}

#[async_trait]
impl Converse for AnthropicChat {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn converse(&self, prompt: ChatPrompt) -> std::result::Result<String, UpstreamError> {
        let url = format!("{}/v1/messages", self.base_url);
        let (system, messages) = Self::split_prompt(&prompt);

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
        });

        if let Some(ref sys) = system {
            body["system"] = serde_json::json!(sys);
        }

        debug!(provider = "anthropic", model = %self.model, messages = prompt.messages.len(), "Sending chat request");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    UpstreamError::Timeout(e.to_string())
                } else {
                    UpstreamError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(UpstreamError::RateLimited {
                retry_after_secs: 5,
            });
        }
        if status == 401 || status == 403 {
            return Err(UpstreamError::AuthenticationFailed(
                "Invalid Anthropic API key".into(),
            ));
        }
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Anthropic API error");
            return Err(UpstreamError::Api {
                status_code: status,
                message: error_body,
            });
        }

        let api_response: AnthropicResponse = response.json().await.map_err(|e| {
            UpstreamError::UnexpectedResponse(format!("Failed to parse Anthropic response: {e}"))
        })?;

        let mut text = String::new();
        for block in &api_response.content {
            if let ResponseContentBlock::Text { text: t } = block {
                if !text.is_empty() {
                    text.push('\n');
                }
                text.push_str(t);
            }
        }

        Ok(text)
    }

    async fn health_check(&self) -> std::result::Result<bool, UpstreamError> {
        // Minimal request to verify the key and reachability.
        let url = format!("{}/v1/messages", self.base_url);
        let body = serde_json::json!({
            "model": self.model,
            "messages": [{"role": "user", "content": "hi"}],
            "max_tokens": 1,
        });

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| UpstreamError::Network(e.to_string()))?;

        Ok(response.status().is_success())
    }
}

// --- Anthropic API types ---

#[derive(Debug, Serialize, Deserialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ResponseContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ResponseContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxlog_core::ChatMessage;

    #[test]
    fn constructor() {
        let chat = AnthropicChat::new("sk-ant-test", "claude-haiku-35-20241022", 0.7, 500);
        assert_eq!(chat.name(), "anthropic");
        assert_eq!(chat.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn split_prompt_extracts_system() {
        let prompt = ChatPrompt {
            messages: vec![
                ChatMessage::system("You are a journaling companion"),
                ChatMessage::user("I had a long day"),
                ChatMessage::assistant("Tell me more"),
            ],
        };
        let (system, messages) = AnthropicChat::split_prompt(&prompt);
        assert_eq!(system.as_deref(), Some("You are a journaling companion"));
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "user");
        assert_eq!(messages[1].role, "assistant");
    }

    #[test]
    fn split_prompt_without_system() {
        let prompt = ChatPrompt {
            messages: vec![ChatMessage::user("hello")],
        };
        let (system, messages) = AnthropicChat::split_prompt(&prompt);
        assert!(system.is_none());
        assert_eq!(messages.len(), 1);
    }

    #[test]
    fn parse_text_response() {
        let parsed: AnthropicResponse = serde_json::from_str(
            r#"{"content":[{"type":"text","text":"That sounds hard."}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.content.len(), 1);
        assert!(matches!(
            &parsed.content[0],
            ResponseContentBlock::Text { text } if text == "That sounds hard."
        ));
    }

    #[test]
    fn unknown_content_blocks_are_tolerated() {
        let parsed: AnthropicResponse = serde_json::from_str(
            r#"{"content":[{"type":"thinking","thinking":"..."},{"type":"text","text":"Hi"}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.content.len(), 2);
    }
}
