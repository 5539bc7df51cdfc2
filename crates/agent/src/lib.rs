//! Agent runtime - the conversational layer of the panier system.
//!
//! This crate drives one conversation turn end to end:
//! 1. **Wire types & client** (`llm`) - chat-completions request/response
//!    shapes and the pluggable `ChatClient` trait
//! 2. **Tool surface** (`tools`) - the registry of schema-declared
//!    storefront operations the model may call
//! 3. **Orchestration loop** (`conversation`) - the bounded
//!    request/execute/feed-back loop producing the agent's reply
//! 4. **Sessions** (`session`) - per-channel transcript storage
//!
//! # Safety principle
//!
//! The model never touches the store directly. Every mutation flows
//! through a registered tool, and every business error is relayed back to
//! the model as data so the conversation can recover in natural language.

pub mod conversation;
pub mod llm;
pub mod session;
pub mod testing;
pub mod tools;

pub use conversation::{AgentError, SalesAgent, MAX_TOOL_ROUNDS};
pub use llm::{ChatClient, ChatMessage, CompletionRequest, CompletionResponse, LlmError, OpenAiClient};
pub use session::{Session, SessionStore, MAX_SESSION_MESSAGES};
pub use tools::{storefront_tools, Tool, ToolRegistry, ToolRegistryError};
