//! League scheduler - round-robin play and standings
//!
//! Level 1 - Orchestration: validate, pair, play every round
//! Level 2 - Phases: one round (sequential or concurrent)
//! Level 3 - Steps: pairing generation, recording one match

use parity_core::{Agent, AgentKind, Choice, GameResult};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{error, info, warn};

use crate::config::{LeagueConfig, RefereeMode};
use crate::error::{MatchError, RegistryError, ScheduleError};
use crate::referee::{short_id, Referee};
use crate::registry::{AgentRegistry, Registration, SharedRegistry};
use crate::remote::RemoteReferee;
use crate::runner::MatchRunner;
use crate::standings::{LeagueStats, RankedStanding, Standing};
use crate::transport::RpcTransport;

/// Registry polling interval for [`LeagueScheduler::wait_for_players`]
const PLAYER_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Lifecycle of a scheduler; it never leaves `Complete`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaguePhase {
    #[default]
    Idle,
    Running,
    Complete,
}

/// Point-in-time view for the query surface
#[derive(Clone, Debug, Serialize)]
pub struct LeagueSnapshot {
    pub phase: LeaguePhase,
    pub registered_agents: usize,
    pub total_games: u64,
    pub rounds_completed: u32,
    pub standings: Vec<RankedStanding>,
}

/// Outcome of a finished league
#[derive(Clone, Debug, Serialize)]
pub struct LeagueSummary {
    pub standings: Vec<RankedStanding>,
    pub total_games: u64,
    pub rounds_completed: u32,
    /// Top of the table, if any match was played
    pub champion: Option<String>,
}

/// A league started in the background
pub struct LeagueStart {
    pub players: usize,
    pub matches: usize,
    pub handle: JoinHandle<Result<LeagueSummary, ScheduleError>>,
}

/// Runs a round-robin league over the registered players
pub struct LeagueScheduler {
    config: LeagueConfig,
    registry: SharedRegistry,
    stats: Arc<Mutex<LeagueStats>>,
    runner: Arc<dyn MatchRunner>,
    phase: Mutex<LeaguePhase>,
}

impl LeagueScheduler {
    /// Create a scheduler with an explicit match runner
    pub fn new(config: LeagueConfig, registry: SharedRegistry, runner: Arc<dyn MatchRunner>) -> Self {
        Self {
            config,
            registry,
            stats: Arc::new(Mutex::new(LeagueStats::new())),
            runner,
            phase: Mutex::new(LeaguePhase::Idle),
        }
    }

    /// Create a scheduler with a fresh registry, choosing the runner from the
    /// configured referee mode
    pub fn with_transport(config: LeagueConfig, transport: Arc<dyn RpcTransport>) -> Self {
        let registry = AgentRegistry::new().shared();
        let runner: Arc<dyn MatchRunner> = match config.referee_mode {
            RefereeMode::Embedded => Arc::new(Referee::new(transport, config.referee.clone())),
            RefereeMode::External => Arc::new(RemoteReferee::new(
                transport,
                registry.clone(),
                config.remote.clone(),
            )),
        };
        Self::new(config, registry, runner)
    }

    pub fn config(&self) -> &LeagueConfig {
        &self.config
    }

    pub fn registry(&self) -> SharedRegistry {
        self.registry.clone()
    }

    pub fn runner_kind(&self) -> &'static str {
        self.runner.kind()
    }

    /// Register an agent; players also get a standing if they had none
    pub fn register(&self, agent: Agent, kind: AgentKind) -> Result<Registration, RegistryError> {
        let mut registry = self.registry.write().expect("registry lock poisoned");
        let name = agent.display_name.clone();
        let outcome = registry.register(agent, kind)?;
        if kind == AgentKind::Player {
            self.lock_stats().ensure(&name);
        }
        Ok(outcome)
    }

    pub fn phase(&self) -> LeaguePhase {
        *self.phase.lock().expect("phase lock poisoned")
    }

    pub fn snapshot(&self) -> LeagueSnapshot {
        let phase = self.phase();
        let registered_agents = self.player_count();
        let stats = self.lock_stats();
        LeagueSnapshot {
            phase,
            registered_agents,
            total_games: stats.total_games(),
            rounds_completed: stats.total_rounds_completed(),
            standings: stats.ranked(),
        }
    }

    pub fn ranked_standings(&self) -> Vec<RankedStanding> {
        self.lock_stats().ranked()
    }

    pub fn standing(&self, name: &str) -> Option<Standing> {
        self.lock_stats().standing(name)
    }

    pub fn history(&self) -> Vec<GameResult> {
        self.lock_stats().history().to_vec()
    }

    fn player_count(&self) -> usize {
        self.registry.read().expect("registry lock poisoned").player_count()
    }

    fn lock_stats(&self) -> std::sync::MutexGuard<'_, LeagueStats> {
        self.stats.lock().expect("stats lock poisoned")
    }

    // ========================================================================
    // Level 1 - Orchestration
    // ========================================================================

    /// Play the whole league and return the final table
    pub async fn run(&self) -> Result<LeagueSummary, ScheduleError> {
        let pairings = self.begin()?;
        self.execute(pairings).await
    }

    /// Validate and move to `Running` now, play in a background task
    pub fn start(self: &Arc<Self>) -> Result<LeagueStart, ScheduleError> {
        let pairings = self.begin()?;
        let players = self.player_count();
        let matches = pairings.len() * self.config.rounds as usize;

        let scheduler = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let outcome = scheduler.execute(pairings).await;
            if let Err(e) = &outcome {
                error!("League aborted: {}", e);
            }
            outcome
        });

        Ok(LeagueStart {
            players,
            matches,
            handle,
        })
    }

    /// Wait until at least `min` players registered; false on timeout
    pub async fn wait_for_players(&self, min: usize, timeout: Duration) -> bool {
        let started = Instant::now();
        loop {
            let count = self.player_count();
            if count >= min {
                info!("{} players registered", count);
                return true;
            }

            let elapsed = started.elapsed();
            if elapsed >= timeout {
                warn!(
                    "Only {} of {} players registered after {:?}",
                    count, min, timeout
                );
                return false;
            }
            tokio::time::sleep(PLAYER_POLL_INTERVAL.min(timeout - elapsed)).await;
        }
    }

    /// Check preconditions, fix the pairing set and enter `Running`
    fn begin(&self) -> Result<Vec<(Agent, Agent)>, ScheduleError> {
        let mut phase = self.phase.lock().expect("phase lock poisoned");
        match *phase {
            LeaguePhase::Running => return Err(ScheduleError::AlreadyRunning),
            LeaguePhase::Complete => return Err(ScheduleError::AlreadyComplete),
            LeaguePhase::Idle => {}
        }

        let players = self.registry.read().expect("registry lock poisoned").players();
        if players.len() < 2 {
            warn!("Not enough agents to start: {} registered", players.len());
            return Err(ScheduleError::NotEnoughAgents {
                registered: players.len(),
            });
        }
        self.runner.check_ready()?;

        let pairings = generate_round_robin_pairings(players.len())
            .into_iter()
            .map(|(i, j)| (players[i].clone(), players[j].clone()))
            .collect();

        *phase = LeaguePhase::Running;
        Ok(pairings)
    }

    /// Play every round over a fixed pairing set
    async fn execute(&self, pairings: Vec<(Agent, Agent)>) -> Result<LeagueSummary, ScheduleError> {
        info!(
            "Starting league: {} matches per round, {} rounds, {} referee{}",
            pairings.len(),
            self.config.rounds,
            self.runner.kind(),
            if self.config.parallel { ", parallel" } else { "" }
        );

        let outcome = self.play_rounds(&pairings).await;
        *self.phase.lock().expect("phase lock poisoned") = LeaguePhase::Complete;
        outcome?;

        let summary = self.summary();
        match &summary.champion {
            Some(champion) => info!(
                "League complete: {} games over {} rounds, champion {}",
                summary.total_games, summary.rounds_completed, champion
            ),
            None => info!("League complete: no games played"),
        }
        Ok(summary)
    }

    async fn play_rounds(&self, pairings: &[(Agent, Agent)]) -> Result<(), ScheduleError> {
        for round in 1..=self.config.rounds {
            info!("=== Round {}/{} ===", round, self.config.rounds);

            if self.config.parallel {
                self.play_round_parallel(pairings).await?;
            } else {
                self.play_round_sequential(pairings).await?;
            }

            self.lock_stats().complete_round();
            self.log_standings(round);
        }
        Ok(())
    }

    fn summary(&self) -> LeagueSummary {
        let stats = self.lock_stats();
        let standings = stats.ranked();
        let champion = if stats.total_games() > 0 {
            standings.first().map(|row| row.agent.clone())
        } else {
            None
        };
        LeagueSummary {
            total_games: stats.total_games(),
            rounds_completed: stats.total_rounds_completed(),
            standings,
            champion,
        }
    }

    // ========================================================================
    // Level 2 - Phases
    // ========================================================================

    /// One match at a time, in pairing order
    async fn play_round_sequential(&self, pairings: &[(Agent, Agent)]) -> Result<(), MatchError> {
        for (player1, player2) in pairings {
            let result = self.runner.run_match(player1, player2).await?;
            record(&self.stats, &result);

            if !self.config.match_pause.is_zero() {
                tokio::time::sleep(self.config.match_pause).await;
            }
        }
        Ok(())
    }

    /// All matches of the round at once; returns after every one is recorded
    async fn play_round_parallel(&self, pairings: &[(Agent, Agent)]) -> Result<(), MatchError> {
        let mut tasks = JoinSet::new();
        for (player1, player2) in pairings.iter().cloned() {
            let runner = Arc::clone(&self.runner);
            let stats = Arc::clone(&self.stats);
            tasks.spawn(async move {
                let result = run_isolated(runner, player1, player2).await?;
                record(&stats, &result);
                Ok::<(), MatchError>(())
            });
        }

        let mut failure = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(e)) => failure = Some(e),
                Err(e) => error!("Match task failed: {}", e),
            }
        }
        failure.map_or(Ok(()), Err)
    }

    fn log_standings(&self, round: u32) {
        info!("Standings after round {}:", round);
        for row in self.ranked_standings() {
            info!(
                "  {:>2}. {:<20} {:>3} pts  {}W {}L {}D  ({:.1}%)",
                row.rank,
                row.agent,
                row.points,
                row.wins,
                row.losses,
                row.draws,
                row.win_rate * 100.0
            );
        }
    }
}

// ============================================================================
// Level 3 - Steps
// ============================================================================

/// Generate all pairings for round-robin
fn generate_round_robin_pairings(n: usize) -> Vec<(usize, usize)> {
    let mut pairings = Vec::new();
    for i in 0..n {
        for j in (i + 1)..n {
            pairings.push((i, j));
        }
    }
    pairings
}

/// Run one match in its own task; a panic degrades the match instead of
/// losing it
async fn run_isolated(
    runner: Arc<dyn MatchRunner>,
    player1: Agent,
    player2: Agent,
) -> Result<GameResult, MatchError> {
    let (p1, p2) = (player1.clone(), player2.clone());
    match tokio::spawn(async move { runner.run_match(&p1, &p2).await }).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(
                "Match {} vs {} failed: {}",
                player1.display_name, player2.display_name, e
            );
            Ok(GameResult::degraded(
                format!("game_{}", short_id()),
                player1.display_name,
                player2.display_name,
                Choice::Error,
                Choice::Error,
            ))
        }
    }
}

/// Apply one result under a single lock
fn record(stats: &Mutex<LeagueStats>, result: &GameResult) {
    stats.lock().expect("stats lock poisoned").record(result);
}
