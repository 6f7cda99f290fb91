mod api;
mod proxy;
mod tools_api;

use std::future::IntoFuture;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use disruption_core::llm::HttpAgentRuntime;
use disruption_core::{Services, Settings};
use disruption_tools::SharedRng;

use crate::proxy::ProxyState;
use crate::tools_api::ToolsState;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Logging Setup
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    info!("Disruption Gateway Initializing...");

    // 2. Configuration, read once
    let settings = Settings::from_env();
    settings.log_summary();

    // 3. Tool Registry (what the agent runtime can call back into)
    let services = Services::from_settings(&settings).context("Failed to build service clients")?;
    let registry = Arc::new(disruption_tools::default_registry(&settings, &services));
    info!("Loaded {} tools: {}", registry.len(), registry.names().join(", "));

    // 4. Agent Runtime client (where chat requests go)
    let runtime = HttpAgentRuntime::from_settings(&settings)
        .context("Failed to build agent runtime client")?;
    let proxy_state = ProxyState {
        runtime: Arc::new(runtime),
        runtime_arn: settings.agent_runtime_arn.clone(),
        qualifier: settings.agent_runtime_qualifier.clone(),
    };

    // 5. Routers
    let chat_app = proxy::router(proxy_state);
    let tools_app = tools_api::router(ToolsState {
        registry,
        rng: SharedRng::from_entropy(),
    });

    // 6. Start Servers
    let chat_listener = TcpListener::bind(&settings.chat_bind_addr)
        .await
        .with_context(|| format!("Failed to bind chat proxy on {}", settings.chat_bind_addr))?;
    let tools_listener = TcpListener::bind(&settings.tools_bind_addr)
        .await
        .with_context(|| {
            format!("Failed to bind tool dispatcher on {}", settings.tools_bind_addr)
        })?;

    info!("Chat proxy listening on {}", settings.chat_bind_addr);
    info!("Tool dispatcher listening on {}", settings.tools_bind_addr);

    tokio::try_join!(
        axum::serve(chat_listener, chat_app).into_future(),
        axum::serve(tools_listener, tools_app).into_future(),
    )
    .context("Server error")?;

    Ok(())
}
