//! Match runner capability
//!
//! Level 2 - one match between two agents. The scheduler holds a single
//! `MatchRunner` chosen at construction time: the embedded [`Referee`] or
//! the [`RemoteReferee`] bridge.
//!
//! [`Referee`]: crate::Referee
//! [`RemoteReferee`]: crate::RemoteReferee

use async_trait::async_trait;
use parity_core::{Agent, GameResult};

use crate::error::MatchError;

/// Runs one match to a terminal [`GameResult`]
///
/// Participant failures are absorbed into a degraded result. `Err` is only
/// returned when the match cannot be attempted at all.
#[async_trait]
pub trait MatchRunner: Send + Sync {
    /// Precondition checked before a league starts
    fn check_ready(&self) -> Result<(), MatchError> {
        Ok(())
    }

    /// Play `player1` against `player2`
    async fn run_match(&self, player1: &Agent, player2: &Agent) -> Result<GameResult, MatchError>;

    /// Short label for logs
    fn kind(&self) -> &'static str;
}
