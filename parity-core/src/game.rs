//! Game results
//!
//! A `GameResult` is produced once per match by whichever referee ran it and
//! is never mutated afterwards. `MatchReport` is the same record as it
//! travels back from an external referee's `run_match` call.

use serde::{Deserialize, Serialize};

use crate::parity::{decide, Choice, Parity, Verdict};

/// Immutable record of one concluded match
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    pub game_id: String,
    pub player1: String,
    pub player2: String,
    pub player1_choice: Choice,
    pub player2_choice: Choice,
    /// Drawn value, 0 when the match never got that far
    pub dice_roll: u32,
    pub dice_parity: Choice,
    /// Winner's display name; `None` for a draw or an unresolved match
    pub winner: Option<String>,
}

impl GameResult {
    /// Build a completed result, applying the winner rule
    pub fn decided(
        game_id: impl Into<String>,
        player1: impl Into<String>,
        player2: impl Into<String>,
        choice1: Parity,
        choice2: Parity,
        dice_roll: u32,
    ) -> Self {
        let player1 = player1.into();
        let player2 = player2.into();
        let drawn = Parity::of(dice_roll);

        let winner = match decide(choice1, choice2, drawn) {
            Verdict::FirstWins => Some(player1.clone()),
            Verdict::SecondWins => Some(player2.clone()),
            Verdict::Draw => None,
        };

        Self {
            game_id: game_id.into(),
            player1,
            player2,
            player1_choice: choice1.into(),
            player2_choice: choice2.into(),
            dice_roll,
            dice_parity: drawn.into(),
            winner,
        }
    }

    /// Build a result for a match that could not complete
    pub fn degraded(
        game_id: impl Into<String>,
        player1: impl Into<String>,
        player2: impl Into<String>,
        choice1: Choice,
        choice2: Choice,
    ) -> Self {
        Self {
            game_id: game_id.into(),
            player1: player1.into(),
            player2: player2.into(),
            player1_choice: choice1,
            player2_choice: choice2,
            dice_roll: 0,
            dice_parity: Choice::None,
            winner: None,
        }
    }

    /// No winner was declared
    pub fn is_draw(&self) -> bool {
        self.winner.is_none()
    }

    /// The protocol did not reach the draw
    pub fn is_degraded(&self) -> bool {
        self.dice_parity.parity().is_none()
    }

    /// The other participant, if `name` took part
    pub fn opponent_of(&self, name: &str) -> Option<&str> {
        if name == self.player1 {
            Some(&self.player2)
        } else if name == self.player2 {
            Some(&self.player1)
        } else {
            None
        }
    }

    /// Whether `name` is the declared winner
    pub fn is_winner(&self, name: &str) -> bool {
        self.winner.as_deref() == Some(name)
    }
}

/// Reply to a remote `run_match` call
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchReport {
    pub match_id: String,
    pub game_id: String,
    pub player1: String,
    pub player2: String,
    pub player1_choice: Choice,
    pub player2_choice: Choice,
    pub dice_roll: u32,
    pub dice_parity: Choice,
    pub winner: Option<String>,
    pub is_draw: bool,
}

impl MatchReport {
    pub fn from_result(match_id: impl Into<String>, result: &GameResult) -> Self {
        Self {
            match_id: match_id.into(),
            game_id: result.game_id.clone(),
            player1: result.player1.clone(),
            player2: result.player2.clone(),
            player1_choice: result.player1_choice,
            player2_choice: result.player2_choice,
            dice_roll: result.dice_roll,
            dice_parity: result.dice_parity,
            winner: result.winner.clone(),
            is_draw: result.is_draw(),
        }
    }

    pub fn into_result(self) -> GameResult {
        GameResult {
            game_id: self.game_id,
            player1: self.player1,
            player2: self.player2,
            player1_choice: self.player1_choice,
            player2_choice: self.player2_choice,
            dice_roll: self.dice_roll,
            dice_parity: self.dice_parity,
            winner: self.winner,
        }
    }
}
