//! Shared state for the three agent roles
//!
//! Each is built once at startup and handed to its router.

use parity_core::{Outcome, Parity, ParityStrategy, PlayerState, PlayerStats};
use parity_league::{LeagueScheduler, Referee};
use serde_json::Value;
use std::sync::{Arc, Mutex};

/// League manager state
pub struct LeagueState {
    pub scheduler: Arc<LeagueScheduler>,
}

impl LeagueState {
    pub fn new(scheduler: Arc<LeagueScheduler>) -> Self {
        Self { scheduler }
    }
}

/// Referee agent state
pub struct RefereeState {
    pub referee: Referee,
    pub version: String,
}

impl RefereeState {
    pub fn new(referee: Referee, version: impl Into<String>) -> Self {
        Self {
            referee,
            version: version.into(),
        }
    }
}

/// Player agent state: bookkeeping plus the choice strategy
pub struct PlayerContext {
    display_name: String,
    state: Mutex<PlayerState>,
    strategy: Mutex<Box<dyn ParityStrategy>>,
}

impl PlayerContext {
    pub fn new(display_name: impl Into<String>, strategy: Box<dyn ParityStrategy>) -> Self {
        let display_name = display_name.into();
        Self {
            state: Mutex::new(PlayerState::new(display_name.clone())),
            display_name,
            strategy: Mutex::new(strategy),
        }
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn strategy_name(&self) -> String {
        self.lock_strategy().name().to_string()
    }

    pub fn stats(&self) -> PlayerStats {
        self.lock_state().stats()
    }

    /// Snapshot of the bookkeeping
    pub fn snapshot(&self) -> PlayerState {
        self.lock_state().clone()
    }

    pub fn accept_invitation(
        &self,
        game_id: Option<String>,
        invitation_id: Option<String>,
        from_player: Option<String>,
    ) {
        self.lock_state()
            .record_invitation(game_id, invitation_id, from_player);
    }

    /// Ask the strategy and remember the answer
    pub fn choose(&self, game_id: Option<&str>) -> Parity {
        let mut state = self.lock_state();
        let choice = self.lock_strategy().choose(
            game_id.unwrap_or_default(),
            state.history(),
            &state.stats(),
        );
        state.record_choice(game_id, choice);
        choice
    }

    pub fn record_result(
        &self,
        game_id: Option<String>,
        winner: Option<String>,
        details: Value,
    ) -> Outcome {
        self.lock_state().record_result(game_id, winner, details)
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, PlayerState> {
        self.state.lock().expect("player state lock poisoned")
    }

    fn lock_strategy(&self) -> std::sync::MutexGuard<'_, Box<dyn ParityStrategy>> {
        self.strategy.lock().expect("strategy lock poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parity_core::StrategyRegistry;
    use serde_json::json;

    fn context(strategy: &str) -> PlayerContext {
        let strategy = StrategyRegistry::builtin().create(strategy).ok().unwrap();
        PlayerContext::new("Alice", strategy)
    }

    #[test]
    fn test_choose_records_choice() {
        let ctx = context("always_odd");
        assert_eq!(ctx.choose(Some("g1")), Parity::Odd);
        assert_eq!(ctx.snapshot().choice_for("g1"), Some(Parity::Odd));
        assert_eq!(ctx.strategy_name(), "always_odd");
    }

    #[test]
    fn test_result_updates_stats() {
        let ctx = context("random");
        ctx.accept_invitation(Some("g1".into()), Some("inv_1".into()), None);
        ctx.record_result(Some("g1".into()), Some("Alice".into()), json!({}));
        ctx.record_result(Some("g2".into()), None, json!({}));

        let stats = ctx.stats();
        assert_eq!(stats.games_invited, 1);
        assert_eq!((stats.wins, stats.draws, stats.games_played), (1, 1, 2));
    }
}
