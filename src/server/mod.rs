//! Web server exposing the gateway over HTTP

pub mod http;

use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ServerConfig;
use crate::gateway::Gateway;

/// Shared server state
#[derive(Clone)]
pub struct ServerState {
    pub gateway: Arc<Gateway>,
}

/// Routes with CORS and request tracing
pub fn router(gateway: Arc<Gateway>) -> Router {
    let state = ServerState { gateway };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/status", get(http::status_handler))
        .route("/api/resources", get(http::list_resources_handler))
        .route("/api/resources/read", get(http::read_resource_handler))
        .route("/api/tools", get(http::list_tools_handler))
        .route("/api/tools/{name}", post(http::call_tool_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until Ctrl-C
pub async fn start(gateway: Arc<Gateway>, config: &ServerConfig) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.host, config.port))?;
    let status = gateway.status()?;
    let app = router(gateway);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("     Catalog Engine Server Starting");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!();
    println!("✓ Catalog items: {}", status.items);
    println!("✓ Resources: {}  Tools: {}", status.resources, status.tools);
    println!();
    println!("🚀 Listening on http://{}", addr);
    println!();
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await
        .context("Server error")?;
    Ok(())
}
