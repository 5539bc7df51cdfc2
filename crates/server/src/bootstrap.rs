use std::sync::Arc;

use panier_agent::llm::{LlmError, OpenAiClient};
use panier_agent::{ChatClient, SalesAgent, SessionStore, ToolRegistryError};
use panier_agent::tools::storefront_tools;
use panier_core::catalog::Catalog;
use panier_core::config::{AppConfig, ConfigError};
use panier_core::storefront::Storefront;
use thiserror::Error;
use tracing::info;

use crate::routes::AppState;

pub struct Application {
    pub config: AppConfig,
    pub state: AppState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("tool registry construction failed: {0}")]
    Tools(#[from] ToolRegistryError),
    #[error("completion client construction failed: {0}")]
    Llm(#[from] LlmError),
}

/// Wires the seeded catalog, the tool registry, and the completion client
/// into the shared application state.
pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let storefront = Arc::new(Storefront::new(Catalog::seed()));
    info!(
        event_name = "system.bootstrap.catalog_seeded",
        correlation_id = "bootstrap",
        products = storefront.catalog().len(),
        "product catalog seeded"
    );

    let tools = storefront_tools(Arc::clone(&storefront))?;
    info!(
        event_name = "system.bootstrap.tools_registered",
        correlation_id = "bootstrap",
        tools = tools.len(),
        "storefront tools registered"
    );

    let client: Arc<dyn ChatClient> = Arc::new(OpenAiClient::from_config(&config.llm)?);
    let agent = Arc::new(SalesAgent::new(
        client,
        tools,
        config.llm.model.clone(),
        config.llm.temperature,
    ));

    let state = AppState {
        agent,
        storefront,
        sessions: Arc::new(SessionStore::new()),
    };

    Ok(Application { config, state })
}
