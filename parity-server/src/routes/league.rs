//! League manager endpoints
//!
//! Registration plus the informational query surface.

use axum::{body::Bytes, extract::State, http::StatusCode, response::IntoResponse, Json};
use parity_core::{Agent, AgentKind};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{info, warn};

use crate::state::LeagueState;

const REQUIRED_FIELDS: [&str; 3] = ["display_name", "version", "endpoint"];

fn bad_request(message: impl Into<String>) -> (StatusCode, Json<Value>) {
    let message = message.into();
    warn!("Registration rejected: {}", message);
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}

/// Register a player or the referee
///
/// The body is validated by hand so each rejection carries a precise reason.
pub async fn register_handler(
    State(state): State<Arc<LeagueState>>,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let data: Value = match serde_json::from_slice(&body) {
        Ok(data) => data,
        Err(_) => return bad_request("Invalid JSON"),
    };
    let Some(fields) = data.as_object() else {
        return bad_request("Request body must be a JSON object");
    };

    let missing: Vec<&str> = REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|key| !fields.contains_key(*key))
        .collect();
    if !missing.is_empty() {
        return bad_request(format!("Missing required fields: {:?}", missing));
    }

    let (display_name, version, endpoint) = match (
        string_field(fields, "display_name"),
        string_field(fields, "version"),
        string_field(fields, "endpoint"),
    ) {
        (Some(name), Some(version), Some(endpoint)) => (name, version, endpoint),
        _ => return bad_request("display_name, version and endpoint must be strings"),
    };

    let kind = match fields.get("agent_type") {
        None | Some(Value::Null) => AgentKind::Player,
        Some(Value::String(kind)) => match kind.parse::<AgentKind>() {
            Ok(kind) => kind,
            Err(e) => return bad_request(e.to_string()),
        },
        Some(_) => return bad_request("agent_type must be a string"),
    };

    let agent = Agent {
        display_name: display_name.clone(),
        version,
        endpoint,
    };
    if let Err(e) = state.scheduler.register(agent, kind) {
        return bad_request(e.to_string());
    }

    (
        StatusCode::OK,
        Json(json!({
            "status": "registered",
            "agent_id": format!("agent_{}", display_name),
            "agent_type": kind,
            "message": format!("Welcome to the league, {}!", display_name),
        })),
    )
}

fn string_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Registered players and the referee, if any
pub async fn agents_handler(State(state): State<Arc<LeagueState>>) -> Json<Value> {
    let registry = state.scheduler.registry();
    let registry = registry.read().expect("registry lock poisoned");
    Json(json!({
        "agents": registry.players(),
        "referee": registry.referee(),
    }))
}

/// Ranked table
pub async fn standings_handler(State(state): State<Arc<LeagueState>>) -> Json<Value> {
    let snapshot = state.scheduler.snapshot();
    Json(json!({
        "standings": snapshot.standings,
        "total_games": snapshot.total_games,
        "rounds_completed": snapshot.rounds_completed,
        "phase": snapshot.phase,
    }))
}

/// Every recorded match in order
pub async fn history_handler(State(state): State<Arc<LeagueState>>) -> Json<Value> {
    let games = state.scheduler.history();
    Json(json!({
        "total_games": games.len(),
        "games": games,
    }))
}

/// Start the league in the background
pub async fn start_handler(State(state): State<Arc<LeagueState>>) -> impl IntoResponse {
    match state.scheduler.start() {
        Ok(started) => {
            info!(
                "League started via API: {} players, {} matches",
                started.players, started.matches
            );
            (
                StatusCode::OK,
                Json(json!({
                    "status": "started",
                    "players": started.players,
                    "matches": started.matches,
                })),
            )
        }
        Err(e) => {
            warn!("League start rejected: {}", e);
            (StatusCode::CONFLICT, Json(json!({ "error": e.to_string() })))
        }
    }
}

/// Liveness probe with headline numbers
pub async fn health_handler(State(state): State<Arc<LeagueState>>) -> Json<Value> {
    let snapshot = state.scheduler.snapshot();
    Json(json!({
        "ok": true,
        "registered_agents": snapshot.registered_agents,
        "total_games": snapshot.total_games,
        "phase": snapshot.phase,
    }))
}
