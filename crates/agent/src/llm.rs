//! Chat-completions wire types and the client trait.
//!
//! The request/response shapes follow the OpenAI chat-completions contract
//! (messages, declared tools, `tool_calls` finish reason), which the local
//! Ollama `/v1` endpoint also speaks, so one client covers both.

use std::time::Duration;

use async_trait::async_trait;
use panier_core::config::{ConfigError, LlmConfig};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    /// A tool result message, tagged with the originating call's id.
    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: "tool".to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.into()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionCall,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// Raw JSON argument payload, parsed at dispatch time.
    pub arguments: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Value>,
    pub temperature: f32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CompletionResponse {
    pub choices: Vec<Choice>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Choice {
    pub message: ChatMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

impl Choice {
    /// Whether this completion signals "tool calls requested".
    pub fn wants_tools(&self) -> bool {
        self.finish_reason.as_deref() == Some("tool_calls")
            || self.message.tool_calls.as_ref().is_some_and(|calls| !calls.is_empty())
    }
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("completion request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("completion endpoint returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Pluggable completion endpoint. Production uses [`OpenAiClient`]; tests
/// use the scripted double from [`crate::testing`].
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;
}

pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: SecretString,
}

impl OpenAiClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let api_key = config.require_api_key()?.clone();
        let http =
            reqwest::Client::builder().timeout(Duration::from_secs(config.timeout_secs)).build()?;
        Ok(Self { http, base_url: config.base_url.trim_end_matches('/').to_string(), api_key })
    }
}

#[async_trait]
impl ChatClient for OpenAiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api { status: status.as_u16(), body });
        }

        Ok(response.json::<CompletionResponse>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::{ChatMessage, Choice, FunctionCall, ToolCall};

    #[test]
    fn tool_result_messages_carry_the_originating_call_id() {
        let message = ChatMessage::tool("call_42", "{\"count\":0}");
        assert_eq!(message.role, "tool");
        assert_eq!(message.tool_call_id.as_deref(), Some("call_42"));
    }

    #[test]
    fn optional_fields_are_omitted_from_the_wire() {
        let serialized =
            serde_json::to_string(&ChatMessage::user("hello")).expect("message serializes");
        assert!(!serialized.contains("tool_calls"));
        assert!(!serialized.contains("tool_call_id"));
    }

    #[test]
    fn wants_tools_accepts_finish_reason_or_populated_calls() {
        let with_reason = Choice {
            message: ChatMessage::assistant(""),
            finish_reason: Some("tool_calls".to_string()),
        };
        assert!(with_reason.wants_tools());

        let mut with_calls =
            Choice { message: ChatMessage::assistant(""), finish_reason: Some("stop".to_string()) };
        with_calls.message.tool_calls = Some(vec![ToolCall {
            id: "call_1".to_string(),
            kind: "function".to_string(),
            function: FunctionCall { name: "view_cart".to_string(), arguments: "{}".to_string() },
        }]);
        assert!(with_calls.wants_tools());

        let plain = Choice {
            message: ChatMessage::assistant("hi"),
            finish_reason: Some("stop".to_string()),
        };
        assert!(!plain.wants_tools());
    }

    #[test]
    fn completion_response_deserializes_a_tool_call_payload() {
        let raw = r#"{
            "choices": [{
                "finish_reason": "tool_calls",
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_abc",
                        "type": "function",
                        "function": {"name": "search_products", "arguments": "{\"query\":\"apples\"}"}
                    }]
                }
            }]
        }"#;

        let response: super::CompletionResponse =
            serde_json::from_str(raw).expect("payload deserializes");
        let choice = &response.choices[0];
        assert!(choice.wants_tools());
        let calls = choice.message.tool_calls.as_ref().expect("calls present");
        assert_eq!(calls[0].function.name, "search_products");
    }
}
