//! Player agent endpoints
//!
//! `/mcp` answers the three calls a referee makes during a match.

use async_trait::async_trait;
use axum::{body::Bytes, extract::State, response::Response, Json};
use parity_core::rpc::Params;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, info};

use crate::rpc::{dispatch, object_params, str_param, HandlerError, RpcHandler};
use crate::state::PlayerContext;

/// JSON-RPC endpoint
pub async fn mcp_handler(State(context): State<Arc<PlayerContext>>, body: Bytes) -> Response {
    dispatch(context.as_ref(), &body).await
}

/// Liveness probe
pub async fn health_handler() -> Json<Value> {
    Json(json!({ "ok": true }))
}

#[async_trait]
impl RpcHandler for PlayerContext {
    async fn handle(&self, method: &str, params: Option<&Params>) -> Result<Value, HandlerError> {
        match method {
            "handle_game_invitation" => handle_game_invitation(self, object_params(params)?),
            "parity_choose" => parity_choose(self, object_params(params)?),
            "notify_match_result" => notify_match_result(self, object_params(params)?),
            other => Err(HandlerError::MethodNotFound(other.to_string())),
        }
    }
}

/// Always accept; echo the identifiers we were given
fn handle_game_invitation(
    context: &PlayerContext,
    params: &Map<String, Value>,
) -> Result<Value, HandlerError> {
    let game_id = str_param(params, "game_id");
    let invitation_id = str_param(params, "invitation_id");
    let from_player = str_param(params, "from_player");

    info!(
        "{}: invitation game_id={:?} invitation_id={:?} from={:?}",
        context.display_name(),
        game_id,
        invitation_id,
        from_player
    );

    let mut response = Map::new();
    response.insert("type".into(), json!("GAME_JOIN_ACK"));
    response.insert("accepted".into(), json!(true));
    if let Some(id) = &game_id {
        response.insert("game_id".into(), json!(id));
    }
    if let Some(id) = &invitation_id {
        response.insert("invitation_id".into(), json!(id));
    }

    context.accept_invitation(game_id, invitation_id, from_player);
    Ok(Value::Object(response))
}

fn parity_choose(context: &PlayerContext, params: &Map<String, Value>) -> Result<Value, HandlerError> {
    let game_id = str_param(params, "game_id");
    let choice = context.choose(game_id.as_deref());

    info!("{}: chose {} for game_id={:?}", context.display_name(), choice, game_id);

    let mut response = Map::new();
    response.insert("type".into(), json!("RESPONSE_PARITY_CHOOSE"));
    response.insert("choice".into(), json!(choice.as_str()));
    if let Some(id) = game_id {
        response.insert("game_id".into(), json!(id));
    }
    Ok(Value::Object(response))
}

fn notify_match_result(
    context: &PlayerContext,
    params: &Map<String, Value>,
) -> Result<Value, HandlerError> {
    let game_id = str_param(params, "game_id");
    let winner = str_param(params, "winner");
    let details = params.get("details").cloned().unwrap_or_else(|| json!({}));

    debug!("{}: result details {}", context.display_name(), details);
    let outcome = context.record_result(game_id.clone(), winner, details);

    let stats = context.stats();
    info!(
        "{}: game_id={:?} {:?}; games={} W={} L={} D={} win_rate={:.1}%",
        context.display_name(),
        game_id,
        outcome,
        stats.games_played,
        stats.wins,
        stats.losses,
        stats.draws,
        stats.win_rate() * 100.0
    );

    Ok(json!({ "ok": true }))
}
