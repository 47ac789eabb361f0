//! League command - run the league manager
//!
//! Without `--server-only` the command also hosts the player agents (and the
//! referee, in external mode) inside this process, waits for them to
//! register over HTTP and plays a full league.
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: start_manager(), spawn_agents(), play_league(), report_results()
//! - Level 3: agent_roster(), wait_for_referee()
//! - Level 4: configuration

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::Args;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use parity_core::StrategyRegistry;
use parity_league::{
    HttpTransport, LeagueConfig, LeagueScheduler, LeagueSummary, Referee, RefereeConfig,
};
use parity_server::{
    bind, create_league_router, run_player_server, run_referee_server, serve, LeagueState,
    PlayerContext, RefereeState, RegistrationConfig, ServerConfig,
};

const AGENT_NAMES: [&str; 8] = [
    "Alpha", "Beta", "Gamma", "Delta", "Epsilon", "Zeta", "Eta", "Theta",
];

/// Rotated across the hosted agents so games are not all alike
const AGENT_STRATEGIES: [&str; 8] = [
    "random",
    "always_even",
    "always_odd",
    "alternating",
    "adaptive",
    "deterministic",
    "biased_random_70",
    "counter",
];

const AGENT_VERSION: &str = "1.0.0";
const REFEREE_POLL_INTERVAL: Duration = Duration::from_millis(500);

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct LeagueArgs {
    /// League manager port
    #[arg(long, env = "LEAGUE_PORT", default_value = "9000")]
    pub port: u16,

    /// Address to bind and advertise
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Rounds; every pair meets once per round
    #[arg(long, env = "ROUNDS", default_value = "3")]
    pub rounds: u32,

    /// Player agents to host in this process
    #[arg(long, env = "NUM_AGENTS", default_value = "4")]
    pub num_agents: usize,

    /// Port of the first hosted agent; the rest use consecutive ports
    #[arg(long, env = "BASE_AGENT_PORT", default_value = "8001")]
    pub base_agent_port: u16,

    /// Only serve the manager; agents register themselves and POST /start runs the league
    #[arg(long)]
    pub server_only: bool,

    /// Delegate matches to a registered external referee
    #[arg(long)]
    pub use_external_referee: bool,

    /// Port of the hosted referee in external mode
    #[arg(long, default_value = "8000")]
    pub referee_port: u16,

    /// Run each round's matches concurrently
    #[arg(long)]
    pub parallel: bool,

    /// Pause after each match, in milliseconds
    #[arg(long, default_value = "100")]
    pub pause_ms: u64,

    /// How long to wait for agents to register, in seconds
    #[arg(long, default_value = "15")]
    pub registration_timeout_secs: u64,

    /// Seed for the dice (random when absent)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Print the final summary as JSON
    #[arg(long)]
    pub json: bool,
}

impl LeagueArgs {
    fn league_config(&self) -> LeagueConfig {
        let mut referee = RefereeConfig::default();
        if let Some(seed) = self.seed {
            referee = referee.with_seed(seed);
        }

        let config = LeagueConfig::new(self.rounds)
            .with_pause(Duration::from_millis(self.pause_ms))
            .with_parallel(self.parallel)
            .with_referee(referee);
        if self.use_external_referee {
            config.with_external_referee()
        } else {
            config
        }
    }

    /// Settings for the referee hosted in external mode
    fn hosted_referee_config(&self) -> RefereeConfig {
        let config = RefereeConfig::hosted();
        match self.seed {
            Some(seed) => config.with_seed(seed),
            None => config,
        }
    }

    fn registration_timeout(&self) -> Duration {
        Duration::from_secs(self.registration_timeout_secs)
    }
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run league command
///
/// 1. Start the league manager
/// 2. Host the agents and wait for them to register
/// 3. Play every round and report the final table
pub fn run(args: LeagueArgs) -> Result<()> {
    if !args.server_only && args.num_agents < 2 {
        bail!("--num-agents must be at least 2, got {}", args.num_agents);
    }

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let scheduler = Arc::new(LeagueScheduler::with_transport(
            args.league_config(),
            Arc::new(HttpTransport::new()),
        ));
        let (server, league_url) = start_manager(&args, scheduler.clone()).await?;

        if args.server_only {
            log_endpoints(&league_url, &args);
            return server.await.context("league manager task failed")?;
        }

        spawn_agents(&args, &league_url);
        let summary = play_league(&args, &scheduler).await?;
        report_results(&summary, args.json)
    })
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

/// Bind the manager up front so a port conflict fails fast, then serve in the background
async fn start_manager(
    args: &LeagueArgs,
    scheduler: Arc<LeagueScheduler>,
) -> Result<(JoinHandle<Result<()>>, String)> {
    let config = ServerConfig::new(args.port).with_host(args.host.as_str());
    let listener = bind(&config).await?;
    let router = create_league_router(Arc::new(LeagueState::new(scheduler.clone())));

    info!(
        "League manager ready on {} ({} referee, {} rounds)",
        config.base_url(),
        scheduler.runner_kind(),
        args.rounds
    );
    Ok((tokio::spawn(serve(listener, router)), config.base_url()))
}

/// Host the player agents, plus the referee in external mode
fn spawn_agents(args: &LeagueArgs, league_url: &str) {
    let registration = RegistrationConfig::new(league_url);

    if args.use_external_referee {
        let config = ServerConfig::new(args.referee_port).with_host(args.host.as_str());
        let referee = Referee::new(Arc::new(HttpTransport::new()), args.hosted_referee_config());
        let state = Arc::new(RefereeState::new(referee, AGENT_VERSION));
        supervise(
            "Referee".to_string(),
            run_referee_server(config, state, "Referee".to_string(), Some(registration.clone())),
        );
    }

    let registry = StrategyRegistry::builtin();
    for (name, strategy, port) in agent_roster(args.num_agents, args.base_agent_port) {
        let strategy = match registry.create(strategy) {
            Ok(strategy) => strategy,
            Err(e) => {
                error!("Cannot host {}: {}", name, e);
                continue;
            }
        };
        info!("Hosting {} on port {} with strategy {}", name, port, strategy.name());

        let context = Arc::new(PlayerContext::new(name.as_str(), strategy));
        let config = ServerConfig::new(port).with_host(args.host.as_str());
        supervise(
            name,
            run_player_server(config, context, AGENT_VERSION.to_string(), Some(registration.clone())),
        );
    }
}

/// Wait for registrations and play the league
async fn play_league(args: &LeagueArgs, scheduler: &LeagueScheduler) -> Result<LeagueSummary> {
    let timeout = args.registration_timeout();
    if !scheduler.wait_for_players(args.num_agents, timeout).await {
        warn!("Starting with the players that did register");
    }
    if args.use_external_referee && !wait_for_referee(scheduler, timeout).await {
        warn!("No referee registered within {:?}", timeout);
    }

    scheduler.run().await.context("league failed")
}

/// Print the final table
fn report_results(summary: &LeagueSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    println!("\n=== Final Standings ===");
    println!("Games played:     {}", summary.total_games);
    println!("Rounds completed: {}", summary.rounds_completed);
    println!();
    println!("{:>4}  {:<12} {:>6} {:>4} {:>4} {:>4} {:>8}", "Rank", "Agent", "Points", "W", "L", "D", "Win %");
    for row in &summary.standings {
        println!(
            "{:>4}  {:<12} {:>6} {:>4} {:>4} {:>4} {:>7.1}%",
            row.rank,
            row.agent,
            row.points,
            row.wins,
            row.losses,
            row.draws,
            row.win_rate * 100.0
        );
    }
    if let Some(champion) = &summary.champion {
        println!("\nChampion: {}", champion);
    }
    Ok(())
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

/// Name, strategy and port for each hosted agent
fn agent_roster(count: usize, base_port: u16) -> Vec<(String, &'static str, u16)> {
    (0..count)
        .map(|i| {
            let name = AGENT_NAMES
                .get(i)
                .map(|name| name.to_string())
                .unwrap_or_else(|| format!("Agent{}", i + 1));
            let strategy = AGENT_STRATEGIES[i % AGENT_STRATEGIES.len()];
            (name, strategy, base_port.saturating_add(i as u16))
        })
        .collect()
}

/// Poll the registry until a referee registers; false on timeout
async fn wait_for_referee(scheduler: &LeagueScheduler, timeout: Duration) -> bool {
    let started = Instant::now();
    loop {
        let registered = scheduler
            .registry()
            .read()
            .expect("registry lock poisoned")
            .referee()
            .is_some();
        if registered {
            return true;
        }
        if started.elapsed() >= timeout {
            return false;
        }
        tokio::time::sleep(REFEREE_POLL_INTERVAL).await;
    }
}

/// Run a hosted agent, logging if it stops
fn supervise<F>(name: String, server: F)
where
    F: std::future::Future<Output = Result<()>> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = server.await {
            error!("{} stopped: {:#}", name, e);
        }
    });
}

fn log_endpoints(league_url: &str, args: &LeagueArgs) {
    info!("Server-only mode; agents register themselves");
    for path in ["/health", "/register", "/agents", "/standings", "/history", "/start"] {
        info!("  {}{}", league_url, path);
    }
    info!(
        "Accepting registrations from player agents and the {} referee",
        if args.use_external_referee { "external" } else { "embedded" }
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use parity_league::RefereeMode;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: LeagueArgs,
    }

    fn parse(argv: &[&str]) -> LeagueArgs {
        TestCli::try_parse_from(std::iter::once("league").chain(argv.iter().copied()))
            .unwrap()
            .args
    }

    #[test]
    fn test_agent_roster() {
        let roster = agent_roster(10, 8001);
        assert_eq!(roster.len(), 10);
        assert_eq!(roster[0], ("Alpha".to_string(), "random", 8001));
        assert_eq!(roster[7], ("Theta".to_string(), "counter", 8008));
        assert_eq!(roster[8], ("Agent9".to_string(), "random", 8009));
        assert_eq!(roster[9].1, "always_even");
    }

    #[test]
    fn test_roster_strategies_exist() {
        let registry = StrategyRegistry::builtin();
        for strategy in AGENT_STRATEGIES {
            assert!(registry.create(strategy).is_ok(), "{}", strategy);
        }
    }

    #[test]
    fn test_league_config_from_args() {
        let args = parse(&[
            "--rounds", "5", "--parallel", "--pause-ms", "0", "--use-external-referee", "--seed", "3",
        ]);
        let config = args.league_config();
        assert_eq!(config.rounds, 5);
        assert!(config.parallel);
        assert!(config.match_pause.is_zero());
        assert_eq!(config.referee_mode, RefereeMode::External);
        assert_eq!(config.referee.seed, Some(3));
    }

    #[test]
    fn test_hosted_referee_gets_seed() {
        let args = parse(&["--use-external-referee", "--seed", "3"]);
        let config = args.hosted_referee_config();
        assert_eq!(config.seed, Some(3));
        assert_eq!(config.call_timeout, Duration::from_secs(30));

        assert!(parse(&[]).hosted_referee_config().seed.is_none());
    }

    #[test]
    fn test_too_few_agents_rejected() {
        let args = parse(&["--num-agents", "1"]);
        assert!(run(args).is_err());
    }
}
