//! Scripted completion-endpoint double for loop and adapter tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm::{
    ChatClient, ChatMessage, Choice, CompletionRequest, CompletionResponse, FunctionCall, LlmError,
    ToolCall,
};

/// Replays a fixed sequence of completion responses and records every
/// request it receives. In repeating mode the single scripted response is
/// served forever, which is how the round-cap property is exercised.
pub struct ScriptedChatClient {
    script: Mutex<VecDeque<CompletionResponse>>,
    repeated: Option<CompletionResponse>,
    requests: Mutex<Vec<CompletionRequest>>,
    completions: AtomicUsize,
}

impl ScriptedChatClient {
    pub fn new(responses: Vec<CompletionResponse>) -> Self {
        Self {
            script: Mutex::new(responses.into()),
            repeated: None,
            requests: Mutex::new(Vec::new()),
            completions: AtomicUsize::new(0),
        }
    }

    pub fn repeating(response: CompletionResponse) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            repeated: Some(response),
            requests: Mutex::new(Vec::new()),
            completions: AtomicUsize::new(0),
        }
    }

    /// Number of completion calls served so far.
    pub fn completions(&self) -> usize {
        self.completions.load(Ordering::SeqCst)
    }

    /// The `index`-th request observed, panicking when out of range.
    pub fn request(&self, index: usize) -> CompletionRequest {
        let requests = self.requests.lock().expect("request log lock poisoned");
        requests.get(index).cloned().expect("request index within observed calls")
    }
}

#[async_trait]
impl ChatClient for ScriptedChatClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.requests.lock().expect("request log lock poisoned").push(request);
        self.completions.fetch_add(1, Ordering::SeqCst);

        if let Some(response) = self.script.lock().expect("script lock poisoned").pop_front() {
            return Ok(response);
        }
        if let Some(response) = &self.repeated {
            return Ok(response.clone());
        }
        Err(LlmError::Api { status: 500, body: "scripted client exhausted".to_string() })
    }
}

/// A completion that ends the turn with a plain assistant answer.
pub fn final_answer(text: &str) -> CompletionResponse {
    CompletionResponse {
        choices: vec![Choice {
            message: ChatMessage::assistant(text),
            finish_reason: Some("stop".to_string()),
        }],
    }
}

/// A completion requesting a single tool call.
pub fn tool_call_response(id: &str, name: &str, arguments: &str) -> CompletionResponse {
    CompletionResponse {
        choices: vec![Choice {
            message: ChatMessage {
                role: "assistant".to_string(),
                content: None,
                tool_calls: Some(vec![ToolCall {
                    id: id.to_string(),
                    kind: "function".to_string(),
                    function: FunctionCall {
                        name: name.to_string(),
                        arguments: arguments.to_string(),
                    },
                }]),
                tool_call_id: None,
            },
            finish_reason: Some("tool_calls".to_string()),
        }],
    }
}
