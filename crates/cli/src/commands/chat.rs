use std::sync::Arc;

use panier_agent::llm::OpenAiClient;
use panier_agent::tools::storefront_tools;
use panier_agent::{ChatClient, SalesAgent, SessionStore};
use panier_core::catalog::Catalog;
use panier_core::config::{AppConfig, LoadOptions};
use panier_core::storefront::Storefront;

use crate::commands::CommandResult;

/// One-shot conversation turn against a fresh in-memory storefront.
pub fn run(message: &str, user: &str) -> CommandResult {
    if message.trim().is_empty() {
        return CommandResult::failure("chat", "usage", "message must not be empty", 2);
    }

    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure("chat", "config_validation", error.to_string(), 2)
        }
    };

    let storefront = Arc::new(Storefront::new(Catalog::seed()));
    let tools = match storefront_tools(Arc::clone(&storefront)) {
        Ok(tools) => tools,
        Err(error) => return CommandResult::failure("chat", "tool_registry", error.to_string(), 1),
    };

    let client: Arc<dyn ChatClient> = match OpenAiClient::from_config(&config.llm) {
        Ok(client) => Arc::new(client),
        Err(error) => {
            return CommandResult::failure("chat", "config_validation", error.to_string(), 2)
        }
    };

    let agent = SalesAgent::new(client, tools, config.llm.model.clone(), config.llm.temperature);
    let customer_id = SessionStore::customer_id("cli", user);

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "chat",
                "runtime",
                format!("failed to initialize async runtime: {error}"),
                1,
            )
        }
    };

    match runtime.block_on(agent.chat(message, &[], &customer_id)) {
        Ok(reply) => CommandResult::success("chat", reply),
        Err(error) => CommandResult::failure("chat", "agent_failure", error.to_string(), 1),
    }
}
