//! Scripted in-memory agents for tests

use async_trait::async_trait;
use parity_core::rpc::{Request, RpcError};
use parity_core::{Agent, Parity};
use rustc_hash::FxHashMap;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::TransportError;
use crate::transport::RpcTransport;

type Handler = Arc<dyn Fn(&Request) -> Result<Value, TransportError> + Send + Sync>;

/// Scripted player behaviour
#[derive(Clone, Debug)]
pub(crate) struct MockPlayer {
    pub accept: bool,
    pub choice: Value,
    pub fail_notify: bool,
    pub stall_on: Option<&'static str>,
}

impl MockPlayer {
    pub fn cooperative(parity: Parity) -> Self {
        Self {
            accept: true,
            choice: json!(parity.as_str()),
            fail_notify: false,
            stall_on: None,
        }
    }

    pub fn declining() -> Self {
        Self {
            accept: false,
            ..Self::cooperative(Parity::Even)
        }
    }

    pub fn invalid_choice(choice: Value) -> Self {
        Self {
            choice,
            ..Self::cooperative(Parity::Even)
        }
    }

    pub fn failing_notify(parity: Parity) -> Self {
        Self {
            fail_notify: true,
            ..Self::cooperative(parity)
        }
    }

    pub fn stalls_on(method: &'static str) -> Self {
        Self {
            stall_on: Some(method),
            ..Self::cooperative(Parity::Even)
        }
    }

    fn reply(&self, request: &Request) -> Result<Value, TransportError> {
        match request.method.as_str() {
            "handle_game_invitation" => Ok(json!({
                "type": "GAME_JOIN_ACK",
                "accepted": self.accept,
            })),
            "parity_choose" => Ok(json!({
                "type": "RESPONSE_PARITY_CHOOSE",
                "choice": self.choice,
            })),
            "notify_match_result" if self.fail_notify => {
                Err(RpcError::internal("ValueError", "cannot record result").into())
            }
            "notify_match_result" => Ok(json!({ "ok": true })),
            other => Err(RpcError::method_not_found(other).into()),
        }
    }
}

/// One recorded outbound call
#[derive(Clone, Debug)]
pub(crate) struct RecordedCall {
    pub endpoint: String,
    pub method: String,
    pub params: Value,
}

/// Transport that routes calls to scripted agents by endpoint
///
/// Endpoints without a script behave as unreachable.
#[derive(Default)]
pub(crate) struct MockTransport {
    players: Mutex<FxHashMap<String, MockPlayer>>,
    handlers: Mutex<FxHashMap<String, Handler>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn player(self, endpoint: &str, player: MockPlayer) -> Self {
        self.players
            .lock()
            .unwrap()
            .insert(endpoint.to_string(), player);
        self
    }

    pub fn handler<F>(self, endpoint: &str, handler: F) -> Self
    where
        F: Fn(&Request) -> Result<Value, TransportError> + Send + Sync + 'static,
    {
        self.handlers
            .lock()
            .unwrap()
            .insert(endpoint.to_string(), Arc::new(handler));
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// `(endpoint, method)` pairs in call order
    pub fn sequence(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .map(|c| (c.endpoint, c.method))
            .collect()
    }
}

#[async_trait]
impl RpcTransport for MockTransport {
    async fn call(&self, endpoint: &str, request: Request) -> Result<Value, TransportError> {
        self.calls.lock().unwrap().push(RecordedCall {
            endpoint: endpoint.to_string(),
            method: request.method.clone(),
            params: request
                .params
                .as_ref()
                .and_then(|p| serde_json::to_value(p).ok())
                .unwrap_or(Value::Null),
        });

        let handler = self.handlers.lock().unwrap().get(endpoint).cloned();
        if let Some(handler) = handler {
            return handler(&request);
        }

        let player = self.players.lock().unwrap().get(endpoint).cloned();
        let Some(player) = player else {
            return Err(TransportError::Network(format!("connection refused: {}", endpoint)));
        };

        if player.stall_on == Some(request.method.as_str()) {
            tokio::time::sleep(Duration::from_secs(10)).await;
        }
        player.reply(&request)
    }
}

pub(crate) fn agent(name: &str) -> Agent {
    Agent::new(name, "1.0.0", endpoint(name)).unwrap()
}

pub(crate) fn endpoint(name: &str) -> String {
    format!("http://{}.test/mcp", name.to_lowercase())
}
