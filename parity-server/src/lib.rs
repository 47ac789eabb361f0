//! Parity Server - HTTP surfaces for every league role
//!
//! This crate provides the web backends:
//! - League manager: registration, standings, history, start
//! - Referee agent: `/mcp` with `run_match` and `ping`
//! - Player agent: `/mcp` with the three match calls
//! - Background registration with the league manager

pub mod registration;
pub mod rpc;
mod routes;
mod state;

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use parity_core::{Agent, AgentKind};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use registration::{spawn_registration, RegistrationConfig, RegistrationError};
pub use rpc::{HandlerError, RpcHandler};
pub use state::{LeagueState, PlayerContext, RefereeState};

/// Server configuration
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9000,
        }
    }
}

impl ServerConfig {
    pub fn new(port: u16) -> Self {
        Self {
            port,
            ..Default::default()
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// JSON-RPC endpoint other agents should call
    pub fn mcp_endpoint(&self) -> String {
        format!("{}/mcp", self.base_url())
    }
}

/// Create the league manager router
pub fn create_league_router(state: Arc<LeagueState>) -> Router {
    Router::new()
        .route("/health", get(routes::league::health_handler))
        .route("/register", post(routes::league::register_handler))
        .route("/agents", get(routes::league::agents_handler))
        .route("/standings", get(routes::league::standings_handler))
        .route("/history", get(routes::league::history_handler))
        .route("/start", post(routes::league::start_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Create the referee agent router
pub fn create_referee_router(state: Arc<RefereeState>) -> Router {
    Router::new()
        .route("/health", get(routes::referee::health_handler))
        .route("/mcp", post(routes::referee::mcp_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Create the player agent router
pub fn create_player_router(context: Arc<PlayerContext>) -> Router {
    Router::new()
        .route("/health", get(routes::player::health_handler))
        .route("/mcp", post(routes::player::mcp_handler))
        .with_state(context)
        .layer(TraceLayer::new_for_http())
}

/// Bind the configured address
pub async fn bind(config: &ServerConfig) -> anyhow::Result<TcpListener> {
    let addr = format!("{}:{}", config.host, config.port);
    TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))
}

/// Serve a router until the process exits
pub async fn serve(listener: TcpListener, router: Router) -> anyhow::Result<()> {
    axum::serve(listener, router).await.context("server error")
}

/// Start the league manager
pub async fn run_league_server(config: ServerConfig, state: Arc<LeagueState>) -> anyhow::Result<()> {
    let listener = bind(&config).await?;
    tracing::info!("League manager listening on {}", config.base_url());
    serve(listener, create_league_router(state)).await
}

/// Start the referee agent, registering it with the league manager if asked
pub async fn run_referee_server(
    config: ServerConfig,
    state: Arc<RefereeState>,
    display_name: String,
    registration: Option<RegistrationConfig>,
) -> anyhow::Result<()> {
    let listener = bind(&config).await?;
    tracing::info!("Referee listening on {}", config.mcp_endpoint());

    if let Some(registration) = registration {
        let identity = Agent::new(display_name, state.version.as_str(), config.mcp_endpoint())?;
        spawn_registration(registration, identity, AgentKind::Referee);
    }

    serve(listener, create_referee_router(state)).await
}

/// Start a player agent, registering it with the league manager if asked
pub async fn run_player_server(
    config: ServerConfig,
    context: Arc<PlayerContext>,
    version: String,
    registration: Option<RegistrationConfig>,
) -> anyhow::Result<()> {
    let listener = bind(&config).await?;
    tracing::info!(
        "Player {} ({}) listening on {}",
        context.display_name(),
        context.strategy_name(),
        config.mcp_endpoint()
    );

    if let Some(registration) = registration {
        let identity = Agent::new(context.display_name(), version, config.mcp_endpoint())?;
        spawn_registration(registration, identity, AgentKind::Player);
    }

    serve(listener, create_player_router(context)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config() {
        let config = ServerConfig::new(8001);
        assert_eq!(config.base_url(), "http://127.0.0.1:8001");
        assert_eq!(config.mcp_endpoint(), "http://127.0.0.1:8001/mcp");
        assert_eq!(ServerConfig::default().with_host("0.0.0.0").port, 9000);
    }
}
