//! Match referee - drives one game over JSON-RPC
//!
//! Level 2 - Phase: invite, collect choices, draw, notify
//! Level 3 - Steps: the individual calls to each participant
//!
//! Every step is bounded by the per-call timeout and every failure ends in a
//! degraded [`GameResult`]; `run_game` never fails.

use async_trait::async_trait;
use parity_core::parity::roll;
use parity_core::rpc::Request;
use parity_core::{Agent, Choice, GameResult, Parity};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, warn};

use crate::config::RefereeConfig;
use crate::error::{MatchError, TransportError};
use crate::runner::MatchRunner;
use crate::transport::{call_with_timeout, RpcTransport};

/// Request ids used for the three player calls
const INVITE_ID: i64 = 1;
const CHOOSE_ID: i64 = 2;
const NOTIFY_ID: i64 = 3;

/// Runs parity games between two agents
pub struct Referee {
    transport: Arc<dyn RpcTransport>,
    config: RefereeConfig,
    rng: Mutex<ChaCha8Rng>,
}

impl Referee {
    pub fn new(transport: Arc<dyn RpcTransport>, config: RefereeConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            transport,
            config,
            rng: Mutex::new(rng),
        }
    }

    pub fn config(&self) -> &RefereeConfig {
        &self.config
    }

    // ========================================================================
    // Level 2 - Phase
    // ========================================================================

    /// Run one game between `player1` and `player2`
    pub async fn run_game(&self, player1: &Agent, player2: &Agent) -> GameResult {
        let token = short_id();
        let game_id = format!("game_{}", token);

        info!(
            "Starting game {}: {} vs {}",
            game_id, player1.display_name, player2.display_name
        );

        let accepted1 = self.send_invitation(player1, &game_id, &format!("inv_{}_1", token)).await;
        let accepted2 = self.send_invitation(player2, &game_id, &format!("inv_{}_2", token)).await;

        if !accepted1 || !accepted2 {
            error!("Game {}: invitation failed", game_id);
            return GameResult::degraded(
                game_id,
                &player1.display_name,
                &player2.display_name,
                Choice::None,
                Choice::None,
            );
        }

        let choice1 = self.request_choice(player1, &game_id).await;
        let choice2 = self.request_choice(player2, &game_id).await;

        let (choice1, choice2) = match (choice1, choice2) {
            (Some(c1), Some(c2)) => (c1, c2),
            (c1, c2) => {
                error!("Game {}: failed to get parity choices", game_id);
                return GameResult::degraded(
                    game_id,
                    &player1.display_name,
                    &player2.display_name,
                    c1.into(),
                    c2.into(),
                );
            }
        };

        let dice_roll = self.draw();
        let result = GameResult::decided(
            game_id,
            &player1.display_name,
            &player2.display_name,
            choice1,
            choice2,
            dice_roll,
        );

        info!(
            "Game {}: {} chose {}, {} chose {}, rolled {} ({})",
            result.game_id,
            result.player1,
            choice1,
            result.player2,
            choice2,
            dice_roll,
            Parity::of(dice_roll)
        );
        match &result.winner {
            Some(winner) => info!("Game {}: winner {}", result.game_id, winner),
            None if choice1 == choice2 => {
                info!("Game {}: draw (same choice)", result.game_id)
            }
            None => info!("Game {}: draw", result.game_id),
        }

        self.notify_result(player1, &result).await;
        self.notify_result(player2, &result).await;

        result
    }

    fn draw(&self) -> u32 {
        let mut rng = self.rng.lock().expect("referee rng lock poisoned");
        roll(&mut *rng)
    }

    // ========================================================================
    // Level 3 - Steps
    // ========================================================================

    /// Invite one participant; true only on an explicit acceptance
    async fn send_invitation(&self, player: &Agent, game_id: &str, invitation_id: &str) -> bool {
        let request = Request::call(
            "handle_game_invitation",
            INVITE_ID,
            json!({
                "game_id": game_id,
                "invitation_id": invitation_id,
                "from_player": self.config.inviter,
            }),
        );

        match self.call(player, request).await {
            Ok(reply) if is_acceptance(&reply) => {
                debug!("Invitation accepted by {}", player.display_name);
                true
            }
            Ok(reply) => {
                warn!("Invitation not accepted by {}: {}", player.display_name, reply);
                false
            }
            Err(e) => {
                error!("Error sending invitation to {}: {}", player.display_name, e);
                false
            }
        }
    }

    /// Ask one participant for a parity; anything but "even" / "odd" is missing
    async fn request_choice(&self, player: &Agent, game_id: &str) -> Option<Parity> {
        let request = Request::call("parity_choose", CHOOSE_ID, json!({ "game_id": game_id }));

        match self.call(player, request).await {
            Ok(reply) => {
                let choice = reply.get("choice").and_then(Value::as_str).and_then(Parity::from_wire);
                if choice.is_none() {
                    let raw = reply.get("choice").cloned().unwrap_or_default();
                    warn!("Invalid choice from {}: {}", player.display_name, raw);
                }
                choice
            }
            Err(e) => {
                error!("Error getting parity choice from {}: {}", player.display_name, e);
                None
            }
        }
    }

    /// Best-effort result notification
    async fn notify_result(&self, player: &Agent, result: &GameResult) {
        let opponent = result.opponent_of(&player.display_name).unwrap_or_default();
        let request = Request::call(
            "notify_match_result",
            NOTIFY_ID,
            json!({
                "game_id": result.game_id,
                "winner": result.winner,
                "details": {
                    "dice_roll": result.dice_roll,
                    "dice_parity": result.dice_parity,
                    "your_opponent": opponent,
                    "player1": result.player1,
                    "player2": result.player2,
                    "player1_choice": result.player1_choice,
                    "player2_choice": result.player2_choice,
                },
            }),
        );

        match self.call(player, request).await {
            Ok(reply) if reply.get("ok").and_then(Value::as_bool) == Some(true) => {
                debug!("Result acknowledged by {}", player.display_name);
            }
            Ok(_) => warn!("Result not acknowledged by {}", player.display_name),
            Err(e) => warn!("Error notifying {}: {}", player.display_name, e),
        }
    }

    async fn call(&self, player: &Agent, request: Request) -> Result<Value, TransportError> {
        call_with_timeout(
            self.transport.as_ref(),
            &player.endpoint,
            request,
            self.config.call_timeout,
        )
        .await
    }
}

#[async_trait]
impl MatchRunner for Referee {
    async fn run_match(&self, player1: &Agent, player2: &Agent) -> Result<GameResult, MatchError> {
        Ok(self.run_game(player1, player2).await)
    }

    fn kind(&self) -> &'static str {
        "embedded"
    }
}

fn is_acceptance(reply: &Value) -> bool {
    reply.get("type").and_then(Value::as_str) == Some("GAME_JOIN_ACK")
        && reply.get("accepted").and_then(Value::as_bool) == Some(true)
}

/// Random 8-character token for match and invitation ids
pub(crate) fn short_id() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}
