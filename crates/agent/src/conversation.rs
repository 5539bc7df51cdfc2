//! The tool-calling orchestration loop.
//!
//! One conversation turn is a bounded sequence of round trips to the
//! completion endpoint: while the model keeps requesting tool calls, each
//! requested call is executed locally and its result appended to the
//! transcript, until the model produces a final natural-language answer or
//! the round cap is hit. The loop mutates nothing itself; all side effects
//! happen inside the dispatched tools.

use std::sync::Arc;

use thiserror::Error;

use crate::llm::{ChatClient, ChatMessage, CompletionRequest, LlmError};
use crate::tools::ToolRegistry;

/// Hard cap on completion round trips per turn. Guarantees termination
/// even against a model that never stops requesting tools.
pub const MAX_TOOL_ROUNDS: usize = 10;

const SYSTEM_PROMPT: &str = "\
You are the virtual sales assistant of an online grocery store specializing \
in fresh, high-quality food products.

YOUR ROLE:
- Welcome customers warmly and professionally
- Help customers find the products they are looking for
- Provide detailed product information (price, description, allergens, nutrition)
- Manage shopping carts and orders
- Suggest complementary or similar products
- Answer questions about products, orders, and the service

YOUR BEHAVIOR:
- Be friendly, helpful, and professional
- Always use the available tools to search products, look up details, and manage the cart
- When a customer asks about a product, use search_products to find it
- When a customer wants to add something to the cart, use add_to_cart \
(generate a customer id such as \"client_001\" if none was provided)
- Proactively offer relevant recommendations
- Mention allergens and nutrition information when appropriate
- Always confirm important actions (adding to cart, placing an order)

IMPORTANT:
- Always use the tools to get exact information
- Never invent prices or product details
- Check stock before confirming availability
- Guide the customer step by step through the purchase";

#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error("completion response carried no choices")]
    EmptyCompletion,
}

pub struct SalesAgent {
    client: Arc<dyn ChatClient>,
    tools: ToolRegistry,
    model: String,
    temperature: f32,
}

impl SalesAgent {
    pub fn new(
        client: Arc<dyn ChatClient>,
        tools: ToolRegistry,
        model: impl Into<String>,
        temperature: f32,
    ) -> Self {
        Self { client, tools, model: model.into(), temperature }
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Runs one conversation turn and returns the agent's reply.
    ///
    /// `history` is the prior transcript for this session (user/assistant
    /// messages only); the system instructions and the customer-id
    /// directive are prepended fresh on every turn.
    pub async fn chat(
        &self,
        message: &str,
        history: &[ChatMessage],
        customer_id: &str,
    ) -> Result<String, AgentError> {
        let mut transcript = Vec::with_capacity(history.len() + 3);
        transcript.push(ChatMessage::system(SYSTEM_PROMPT));
        transcript.push(ChatMessage::system(format!(
            "Current customer id: {customer_id}. Use this id for every cart and order operation."
        )));
        transcript.extend_from_slice(history);
        transcript.push(ChatMessage::user(message));

        let declarations = self.tools.declarations();
        let mut last_content = String::new();

        for round in 1..=MAX_TOOL_ROUNDS {
            let response = self
                .client
                .complete(CompletionRequest {
                    model: self.model.clone(),
                    messages: transcript.clone(),
                    tools: declarations.clone(),
                    temperature: self.temperature,
                })
                .await?;

            let choice =
                response.choices.into_iter().next().ok_or(AgentError::EmptyCompletion)?;

            if !choice.wants_tools() {
                return Ok(choice.message.content.unwrap_or_default());
            }

            let calls = choice.message.tool_calls.clone().unwrap_or_default();
            last_content = choice.message.content.clone().unwrap_or_default();
            transcript.push(choice.message);

            for call in calls {
                tracing::debug!(
                    event_name = "agent.tool.dispatch",
                    tool = %call.function.name,
                    round,
                    "executing requested tool call"
                );
                let result = self.tools.dispatch(&call.function.name, &call.function.arguments).await;
                transcript.push(ChatMessage::tool(call.id, result.to_string()));
            }
        }

        tracing::warn!(
            event_name = "agent.loop.round_cap",
            max_rounds = MAX_TOOL_ROUNDS,
            "round cap reached before a final answer; relaying the last completion"
        );
        Ok(last_content)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use panier_core::catalog::Catalog;
    use panier_core::storefront::Storefront;

    use super::{SalesAgent, MAX_TOOL_ROUNDS};
    use crate::llm::ChatMessage;
    use crate::testing::{final_answer, tool_call_response, ScriptedChatClient};
    use crate::tools::storefront_tools;

    fn agent(client: Arc<ScriptedChatClient>) -> SalesAgent {
        let storefront = Arc::new(Storefront::new(Catalog::seed()));
        let tools = storefront_tools(storefront).expect("registry builds");
        SalesAgent::new(client, tools, "test-model", 0.7)
    }

    #[tokio::test]
    async fn final_answer_is_returned_verbatim() {
        let client = Arc::new(ScriptedChatClient::new(vec![final_answer("Welcome to the store!")]));
        let agent = agent(client.clone());

        let reply = agent.chat("hello", &[], "c1").await.expect("turn succeeds");
        assert_eq!(reply, "Welcome to the store!");
        assert_eq!(client.completions(), 1);
    }

    #[tokio::test]
    async fn tool_round_executes_and_feeds_back_before_the_final_answer() {
        let client = Arc::new(ScriptedChatClient::new(vec![
            tool_call_response("call_1", "search_products", r#"{"query":"apples"}"#),
            final_answer("We have Golden Apples at 3.50 per kg."),
        ]));
        let agent = agent(client.clone());

        let reply = agent.chat("do you have apples?", &[], "c1").await.expect("turn succeeds");
        assert_eq!(reply, "We have Golden Apples at 3.50 per kg.");
        assert_eq!(client.completions(), 2);

        // The second request must carry the assistant tool-call message and
        // the tagged tool result.
        let second = client.request(1);
        let tool_message = second.messages.last().expect("tool result appended");
        assert_eq!(tool_message.role, "tool");
        assert_eq!(tool_message.tool_call_id.as_deref(), Some("call_1"));
        let payload = tool_message.content.as_deref().expect("tool result has content");
        assert!(payload.contains("Golden Apples"));

        let assistant = &second.messages[second.messages.len() - 2];
        assert_eq!(assistant.role, "assistant");
        assert!(assistant.tool_calls.is_some());
    }

    #[tokio::test]
    async fn tool_side_effects_persist_across_rounds() {
        let client = Arc::new(ScriptedChatClient::new(vec![
            tool_call_response(
                "call_1",
                "add_to_cart",
                r#"{"product_id":"prod_001","quantity":2,"customer_id":"c1"}"#,
            ),
            tool_call_response("call_2", "view_cart", r#"{"customer_id":"c1"}"#),
            final_answer("Your cart total is 7.00."),
        ]));
        let agent = agent(client.clone());

        let reply = agent.chat("2kg of apples please", &[], "c1").await.expect("turn succeeds");
        assert_eq!(reply, "Your cart total is 7.00.");

        let third = client.request(2);
        let view_result = third.messages.last().expect("view_cart result");
        assert!(view_result.content.as_deref().expect("content").contains("\"item_count\":1"));
    }

    #[tokio::test]
    async fn unknown_tool_becomes_an_error_result_not_a_turn_failure() {
        let client = Arc::new(ScriptedChatClient::new(vec![
            tool_call_response("call_1", "warp_drive", "{}"),
            final_answer("Sorry, I cannot do that."),
        ]));
        let agent = agent(client.clone());

        let reply = agent.chat("engage", &[], "c1").await.expect("turn still succeeds");
        assert_eq!(reply, "Sorry, I cannot do that.");

        let second = client.request(1);
        let result = second.messages.last().expect("tool result appended");
        assert!(result.content.as_deref().expect("content").contains("unknown tool"));
    }

    #[tokio::test]
    async fn loop_terminates_at_exactly_the_round_cap() {
        let client = Arc::new(ScriptedChatClient::repeating(tool_call_response(
            "call_n",
            "get_categories",
            "{}",
        )));
        let agent = agent(client.clone());

        let reply = agent.chat("loop forever", &[], "c1").await.expect("turn terminates");
        assert_eq!(client.completions(), MAX_TOOL_ROUNDS);
        // The repeated completion carries no content, so the relay is empty.
        assert_eq!(reply, "");
    }

    #[tokio::test]
    async fn history_and_customer_directive_are_prepended() {
        let client = Arc::new(ScriptedChatClient::new(vec![final_answer("Noted.")]));
        let agent = agent(client.clone());

        let history =
            vec![ChatMessage::user("hi"), ChatMessage::assistant("hello, how can I help?")];
        agent.chat("thanks", &history, "client_web_42").await.expect("turn succeeds");

        let request = client.request(0);
        assert_eq!(request.messages[0].role, "system");
        assert!(request.messages[1]
            .content
            .as_deref()
            .expect("directive")
            .contains("client_web_42"));
        assert_eq!(request.messages[2].content.as_deref(), Some("hi"));
        assert_eq!(request.messages.last().expect("user message").content.as_deref(), Some("thanks"));
        assert_eq!(request.tools.len(), 9);
    }
}
