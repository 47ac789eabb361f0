//! Remote referee bridge
//!
//! Level 2 - delegates a whole match to the external referee registered in
//! the agent registry through a single `run_match` call.

use async_trait::async_trait;
use parity_core::rpc::Request;
use parity_core::{Agent, Choice, GameResult, MatchReport};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info};

use crate::config::RemoteRefereeConfig;
use crate::error::{MatchError, TransportError};
use crate::referee::short_id;
use crate::registry::SharedRegistry;
use crate::runner::MatchRunner;
use crate::transport::{call_with_timeout, RpcTransport};

const RUN_MATCH_ID: i64 = 1;

/// Match runner backed by the registered external referee
pub struct RemoteReferee {
    transport: Arc<dyn RpcTransport>,
    registry: SharedRegistry,
    config: RemoteRefereeConfig,
}

impl RemoteReferee {
    pub fn new(
        transport: Arc<dyn RpcTransport>,
        registry: SharedRegistry,
        config: RemoteRefereeConfig,
    ) -> Self {
        Self {
            transport,
            registry,
            config,
        }
    }

    /// Endpoint of the referee registered right now
    fn referee_endpoint(&self) -> Result<String, MatchError> {
        let registry = self.registry.read().expect("registry lock poisoned");
        registry
            .referee()
            .map(|referee| referee.endpoint.clone())
            .ok_or(MatchError::NoReferee)
    }

    async fn request_match(
        &self,
        endpoint: &str,
        match_id: &str,
        player1: &Agent,
        player2: &Agent,
    ) -> Result<GameResult, TransportError> {
        let request = Request::call(
            "run_match",
            RUN_MATCH_ID,
            json!({
                "match_id": match_id,
                "player1": player1,
                "player2": player2,
            }),
        );

        let reply = call_with_timeout(self.transport.as_ref(), endpoint, request, self.config.timeout).await?;
        parse_report(reply, player1, player2)
    }
}

#[async_trait]
impl MatchRunner for RemoteReferee {
    fn check_ready(&self) -> Result<(), MatchError> {
        self.referee_endpoint().map(|_| ())
    }

    async fn run_match(&self, player1: &Agent, player2: &Agent) -> Result<GameResult, MatchError> {
        let endpoint = self.referee_endpoint()?;
        let match_id = format!("match_{}", short_id());

        info!(
            "Delegating {} to referee at {}: {} vs {}",
            match_id, endpoint, player1.display_name, player2.display_name
        );

        match self.request_match(&endpoint, &match_id, player1, player2).await {
            Ok(result) => Ok(result),
            Err(e) => {
                error!("Remote referee failed for {}: {}", match_id, e);
                Ok(GameResult::degraded(
                    match_id,
                    &player1.display_name,
                    &player2.display_name,
                    Choice::Error,
                    Choice::Error,
                ))
            }
        }
    }

    fn kind(&self) -> &'static str {
        "remote"
    }
}

/// Translate a `run_match` reply, checking it describes the requested pairing
fn parse_report(reply: Value, player1: &Agent, player2: &Agent) -> Result<GameResult, TransportError> {
    let report: MatchReport =
        serde_json::from_value(reply).map_err(|e| TransportError::Malformed(e.to_string()))?;

    if report.player1 != player1.display_name || report.player2 != player2.display_name {
        return Err(TransportError::Malformed(format!(
            "report for {} vs {}, expected {} vs {}",
            report.player1, report.player2, player1.display_name, player2.display_name
        )));
    }

    Ok(report.into_result())
}
