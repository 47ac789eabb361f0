//! Player-side bookkeeping
//!
//! What a player agent remembers about the games it has been invited to:
//! invitations, its own choices, announced results, and running statistics
//! that strategies may consult.

use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::parity::Parity;

/// How a game ended from this player's point of view
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Win,
    Loss,
    Draw,
}

/// Running statistics
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub games_invited: u32,
    pub games_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
}

impl PlayerStats {
    /// Win rate, 0 before the first game
    pub fn win_rate(&self) -> f64 {
        if self.games_played == 0 {
            0.0
        } else {
            self.wins as f64 / self.games_played as f64
        }
    }
}

/// One concluded game, as seen by the player
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub game_id: Option<String>,
    pub winner: Option<String>,
    pub outcome: Outcome,
    /// What this player chose for the game, if it was asked
    pub choice: Option<Parity>,
    pub details: Value,
    pub recorded_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn won(&self) -> bool {
        self.outcome == Outcome::Win
    }
}

/// An accepted invitation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Invitation {
    pub game_id: Option<String>,
    pub invitation_id: Option<String>,
    pub from_player: Option<String>,
    pub received_at: DateTime<Utc>,
}

/// Everything a player tracks between calls
#[derive(Clone, Debug)]
pub struct PlayerState {
    display_name: String,
    invitations: FxHashMap<String, Invitation>,
    choices: FxHashMap<String, Parity>,
    history: Vec<HistoryEntry>,
    stats: PlayerStats,
}

impl PlayerState {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            invitations: FxHashMap::default(),
            choices: FxHashMap::default(),
            history: Vec::new(),
            stats: PlayerStats::default(),
        }
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn stats(&self) -> PlayerStats {
        self.stats
    }

    /// Concluded games in the order they were announced
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn invitation(&self, game_id: &str) -> Option<&Invitation> {
        self.invitations.get(game_id)
    }

    pub fn choice_for(&self, game_id: &str) -> Option<Parity> {
        self.choices.get(game_id).copied()
    }

    pub fn record_invitation(
        &mut self,
        game_id: Option<String>,
        invitation_id: Option<String>,
        from_player: Option<String>,
    ) {
        let key = game_id
            .clone()
            .or_else(|| invitation_id.clone())
            .unwrap_or_else(|| format!("unknown_{}", self.invitations.len()));

        self.invitations.insert(
            key,
            Invitation {
                game_id,
                invitation_id,
                from_player,
                received_at: Utc::now(),
            },
        );
        self.stats.games_invited += 1;
    }

    pub fn record_choice(&mut self, game_id: Option<&str>, choice: Parity) {
        let key = game_id
            .map(str::to_string)
            .unwrap_or_else(|| format!("unknown_{}", self.choices.len()));
        self.choices.insert(key, choice);
    }

    /// Record an announced result and classify it for this player
    pub fn record_result(
        &mut self,
        game_id: Option<String>,
        winner: Option<String>,
        details: Value,
    ) -> Outcome {
        let outcome = match winner.as_deref() {
            None | Some("") => Outcome::Draw,
            Some(name) if name == self.display_name => Outcome::Win,
            Some(_) => Outcome::Loss,
        };

        self.stats.games_played += 1;
        match outcome {
            Outcome::Win => self.stats.wins += 1,
            Outcome::Loss => self.stats.losses += 1,
            Outcome::Draw => self.stats.draws += 1,
        }

        let choice = game_id.as_deref().and_then(|id| self.choice_for(id));
        self.history.push(HistoryEntry {
            game_id,
            winner,
            outcome,
            choice,
            details,
            recorded_at: Utc::now(),
        });

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_result_classification() {
        let mut state = PlayerState::new("Alice");

        assert_eq!(state.record_result(Some("g1".into()), Some("Alice".into()), json!({})), Outcome::Win);
        assert_eq!(state.record_result(Some("g2".into()), Some("Bob".into()), json!({})), Outcome::Loss);
        assert_eq!(state.record_result(Some("g3".into()), None, json!({})), Outcome::Draw);
        assert_eq!(state.record_result(Some("g4".into()), Some(String::new()), json!({})), Outcome::Draw);

        let stats = state.stats();
        assert_eq!(stats.games_played, 4);
        assert_eq!((stats.wins, stats.losses, stats.draws), (1, 1, 2));
        assert_eq!(stats.win_rate(), 0.25);
    }

    #[test]
    fn test_history_links_choice() {
        let mut state = PlayerState::new("Alice");
        state.record_invitation(Some("g1".into()), Some("inv_1".into()), Some("LeagueManager".into()));
        state.record_choice(Some("g1"), Parity::Odd);
        state.record_result(Some("g1".into()), Some("Alice".into()), json!({"dice_roll": 3}));

        let entry = &state.history()[0];
        assert_eq!(entry.choice, Some(Parity::Odd));
        assert!(entry.won());
        assert_eq!(state.stats().games_invited, 1);
        assert!(state.invitation("g1").is_some());
    }

    #[test]
    fn test_win_rate_zero_games() {
        assert_eq!(PlayerStats::default().win_rate(), 0.0);
    }
}
