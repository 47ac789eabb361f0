//! Standings and league statistics
//!
//! Level 4 - cumulative per-agent records, the match history, and ranking.

use parity_core::GameResult;
use rustc_hash::FxHashMap;
use serde::Serialize;

/// Points for a win
pub const WIN_POINTS: u32 = 3;
/// Points for a draw
pub const DRAW_POINTS: u32 = 1;

/// Cumulative record of one agent
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Standing {
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub games_played: u32,
}

impl Standing {
    /// 3 per win, 1 per draw
    pub fn points(&self) -> u32 {
        WIN_POINTS * self.wins + DRAW_POINTS * self.draws
    }

    /// Win rate
    pub fn win_rate(&self) -> f64 {
        if self.games_played == 0 {
            0.0
        } else {
            self.wins as f64 / self.games_played as f64
        }
    }

    fn add_win(&mut self) {
        self.wins += 1;
        self.games_played += 1;
    }

    fn add_loss(&mut self) {
        self.losses += 1;
        self.games_played += 1;
    }

    fn add_draw(&mut self) {
        self.draws += 1;
        self.games_played += 1;
    }
}

/// One row of the ranked table
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RankedStanding {
    pub rank: usize,
    pub agent: String,
    pub points: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub games_played: u32,
    pub win_rate: f64,
}

/// Aggregate league state
#[derive(Clone, Debug, Default)]
pub struct LeagueStats {
    total_games: u64,
    total_rounds_completed: u32,
    standings: Vec<(String, Standing)>,
    index: FxHashMap<String, usize>,
    history: Vec<GameResult>,
}

impl LeagueStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty standing for `name` if it has none
    pub fn ensure(&mut self, name: &str) -> &mut Standing {
        let slot = match self.index.get(name) {
            Some(&slot) => slot,
            None => {
                self.index.insert(name.to_string(), self.standings.len());
                self.standings.push((name.to_string(), Standing::default()));
                self.standings.len() - 1
            }
        };
        &mut self.standings[slot].1
    }

    /// Apply one concluded match
    ///
    /// A result without a recognised winner counts as a draw for both sides.
    pub fn record(&mut self, result: &GameResult) {
        let winner = result.winner.as_deref();

        if winner == Some(result.player1.as_str()) {
            self.ensure(&result.player1).add_win();
            self.ensure(&result.player2).add_loss();
        } else if winner == Some(result.player2.as_str()) {
            self.ensure(&result.player1).add_loss();
            self.ensure(&result.player2).add_win();
        } else {
            self.ensure(&result.player1).add_draw();
            self.ensure(&result.player2).add_draw();
        }

        self.history.push(result.clone());
        self.total_games += 1;
    }

    /// Mark a round as finished
    pub fn complete_round(&mut self) {
        self.total_rounds_completed += 1;
    }

    pub fn total_games(&self) -> u64 {
        self.total_games
    }

    pub fn total_rounds_completed(&self) -> u32 {
        self.total_rounds_completed
    }

    pub fn standing(&self, name: &str) -> Option<Standing> {
        self.index.get(name).map(|&slot| self.standings[slot].1)
    }

    /// Match history in recording order
    pub fn history(&self) -> &[GameResult] {
        &self.history
    }

    /// Standings sorted by points, then wins (descending), then losses (ascending)
    ///
    /// The sort is stable, so remaining ties keep registration order.
    pub fn ranked(&self) -> Vec<RankedStanding> {
        let mut rows: Vec<&(String, Standing)> = self.standings.iter().collect();
        rows.sort_by(|(_, a), (_, b)| {
            b.points()
                .cmp(&a.points())
                .then_with(|| b.wins.cmp(&a.wins))
                .then_with(|| a.losses.cmp(&b.losses))
        });

        rows.into_iter()
            .enumerate()
            .map(|(i, (name, standing))| RankedStanding {
                rank: i + 1,
                agent: name.clone(),
                points: standing.points(),
                wins: standing.wins,
                losses: standing.losses,
                draws: standing.draws,
                games_played: standing.games_played,
                win_rate: standing.win_rate(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parity_core::{Choice, Parity};

    fn win(game: &str, p1: &str, p2: &str, winner_first: bool) -> GameResult {
        // Player 1 picks even; roll 2 is even, roll 1 is odd
        let roll = if winner_first { 2 } else { 1 };
        GameResult::decided(game, p1, p2, Parity::Even, Parity::Odd, roll)
    }

    fn assert_invariants(stats: &LeagueStats) {
        for (name, standing) in &stats.standings {
            assert_eq!(
                standing.games_played,
                standing.wins + standing.losses + standing.draws,
                "games_played invariant for {}",
                name
            );
            assert_eq!(standing.points(), 3 * standing.wins + standing.draws);
        }
    }

    #[test]
    fn test_standing_calculations() {
        let standing = Standing {
            wins: 6,
            losses: 2,
            draws: 2,
            games_played: 10,
        };
        assert_eq!(standing.points(), 20);
        assert_eq!(standing.win_rate(), 0.6);
        assert_eq!(Standing::default().win_rate(), 0.0);
    }

    #[test]
    fn test_record_win_and_loss() {
        let mut stats = LeagueStats::new();
        stats.record(&win("g1", "Alice", "Bob", true));

        let alice = stats.standing("Alice").unwrap();
        let bob = stats.standing("Bob").unwrap();
        assert_eq!((alice.wins, alice.losses, alice.games_played), (1, 0, 1));
        assert_eq!((bob.wins, bob.losses, bob.games_played), (0, 1, 1));
        assert_eq!(stats.total_games(), 1);
        assert_eq!(stats.history().len(), 1);
        assert_invariants(&stats);
    }

    #[test]
    fn test_degraded_counts_as_draw() {
        let mut stats = LeagueStats::new();
        stats.record(&GameResult::degraded("g1", "Alice", "Bob", Choice::None, Choice::None));

        assert_eq!(stats.standing("Alice").unwrap().draws, 1);
        assert_eq!(stats.standing("Bob").unwrap().draws, 1);
        assert_eq!(stats.standing("Bob").unwrap().games_played, 1);
        assert_invariants(&stats);
    }

    #[test]
    fn test_ranking_order() {
        let mut stats = LeagueStats::new();
        for name in ["Alice", "Bob", "Carol", "Dave"] {
            stats.ensure(name);
        }
        // Carol: 1 win; Bob: 1 win + 1 loss; Alice: 2 losses; Dave: 1 win
        stats.record(&win("g1", "Carol", "Alice", true));
        stats.record(&win("g2", "Bob", "Alice", true));
        stats.record(&win("g3", "Dave", "Bob", true));

        let ranked = stats.ranked();
        let names: Vec<&str> = ranked.iter().map(|r| r.agent.as_str()).collect();
        // Carol and Dave tie on points, wins and losses; registration order decides
        assert_eq!(names, vec!["Carol", "Dave", "Bob", "Alice"]);
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[3].rank, 4);
        assert_invariants(&stats);
    }

    #[test]
    fn test_draws_outrank_nothing() {
        let mut stats = LeagueStats::new();
        stats.ensure("Idle");
        stats.record(&GameResult::degraded("g1", "Alice", "Bob", Choice::None, Choice::None));

        let ranked = stats.ranked();
        assert_eq!(ranked.last().unwrap().agent, "Idle");
        assert_eq!(ranked[0].points, 1);
    }

    #[test]
    fn test_complete_round() {
        let mut stats = LeagueStats::new();
        stats.complete_round();
        stats.complete_round();
        assert_eq!(stats.total_rounds_completed(), 2);
    }
}
