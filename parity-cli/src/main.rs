//! Parity CLI - Command-line interface
//!
//! Commands:
//! - league: Run the league manager, optionally with in-process agents
//! - referee: Serve the referee agent
//! - player: Serve a player agent

mod league_cmd;
mod player_cmd;
mod referee_cmd;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use league_cmd::LeagueArgs;
use player_cmd::PlayerArgs;
use referee_cmd::RefereeArgs;

#[derive(Parser)]
#[command(name = "parity")]
#[command(about = "Parity game league: manager, referee and player agents")]
struct Cli {
    /// Log level (debug, info, warning, error); RUST_LOG overrides it
    #[arg(long, env = "LOG_LEVEL", default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the league manager and a full round-robin league
    League(LeagueArgs),
    /// Serve the referee agent
    Referee(RefereeArgs),
    /// Serve a player agent
    Player(PlayerArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match cli.command {
        Commands::League(args) => league_cmd::run(args),
        Commands::Referee(args) => referee_cmd::run(args),
        Commands::Player(args) => player_cmd::run(args),
    }
}

/// Install the global subscriber; `RUST_LOG` wins over `--log-level`
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(level)));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Map a user-facing level name onto a filter directive
fn filter_directive(level: &str) -> String {
    match level.to_ascii_lowercase().as_str() {
        "warning" => "warn".to_string(),
        "critical" => "error".to_string(),
        other => other.to_string(),
    }
}
