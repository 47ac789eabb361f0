//! Referee agent endpoints
//!
//! `/mcp` runs whole matches on behalf of a league manager.

use async_trait::async_trait;
use axum::{body::Bytes, extract::State, response::Response, Json};
use parity_core::rpc::Params;
use parity_core::{Agent, MatchReport};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::info;

use crate::rpc::{dispatch, object_params, str_param, HandlerError, RpcHandler};
use crate::state::RefereeState;

/// JSON-RPC endpoint
pub async fn mcp_handler(State(state): State<Arc<RefereeState>>, body: Bytes) -> Response {
    dispatch(state.as_ref(), &body).await
}

/// Liveness probe
pub async fn health_handler(State(state): State<Arc<RefereeState>>) -> Json<Value> {
    Json(json!({
        "ok": true,
        "service": "referee",
        "version": state.version,
    }))
}

#[async_trait]
impl RpcHandler for RefereeState {
    async fn handle(&self, method: &str, params: Option<&Params>) -> Result<Value, HandlerError> {
        match method {
            "ping" => Ok(json!({ "ok": true, "message": "pong" })),
            "run_match" => self.run_match(object_params(params)?).await,
            other => Err(HandlerError::MethodNotFound(other.to_string())),
        }
    }
}

impl RefereeState {
    async fn run_match(&self, params: &Map<String, Value>) -> Result<Value, HandlerError> {
        let player1 = agent_param(params, "player1")?;
        let player2 = agent_param(params, "player2")?;
        let match_id = str_param(params, "match_id").unwrap_or_else(|| "unknown".to_string());

        info!(
            "Running {}: {} vs {}",
            match_id, player1.display_name, player2.display_name
        );

        let result = self.referee.run_game(&player1, &player2).await;
        let report = MatchReport::from_result(match_id, &result);
        serde_json::to_value(&report).map_err(|e| HandlerError::internal("SerializationError", e))
    }
}

/// Version assumed when an agent object omits it
const DEFAULT_AGENT_VERSION: &str = "1.0.0";

/// Required agent object `{display_name, version?, endpoint}`
fn agent_param(params: &Map<String, Value>, key: &str) -> Result<Agent, HandlerError> {
    let mut value = params
        .get(key)
        .and_then(Value::as_object)
        .cloned()
        .ok_or_else(|| HandlerError::InvalidParams(format!("'{}' must be an agent object", key)))?;
    value
        .entry("version")
        .or_insert_with(|| json!(DEFAULT_AGENT_VERSION));

    let agent: Agent = serde_json::from_value(Value::Object(value))
        .map_err(|e| HandlerError::InvalidParams(format!("'{}': {}", key, e)))?;
    agent
        .validate()
        .map_err(|e| HandlerError::InvalidParams(format!("'{}': {}", key, e)))?;
    Ok(agent)
}
