//! Player command - serve one player agent
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: build_context(), start_server()
//! - Level 3: (delegated to parity-server crate)
//! - Level 4: configuration

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use parity_core::{StrategyRegistry, DEFAULT_STRATEGY};
use parity_server::{run_player_server, PlayerContext, RegistrationConfig, ServerConfig};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct PlayerArgs {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value = "8001")]
    pub port: u16,

    /// Address to bind and advertise
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Name used in the league
    #[arg(long, env = "DISPLAY_NAME", default_value = "Player")]
    pub display_name: String,

    /// Version reported at registration
    #[arg(long, env = "VERSION", default_value = "1.0.0")]
    pub version: String,

    /// League manager base URL
    #[arg(long, env = "LEAGUE_URL", default_value = "http://127.0.0.1:9000")]
    pub league_url: String,

    /// Choice strategy
    #[arg(long, env = "STRATEGY", default_value = DEFAULT_STRATEGY)]
    pub strategy: String,

    /// Do not register with the league manager
    #[arg(long)]
    pub no_register: bool,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run player command
pub fn run(args: PlayerArgs) -> Result<()> {
    let context = build_context(&args)?;
    let config = ServerConfig::new(args.port).with_host(args.host.as_str());
    let registration = (!args.no_register).then(|| RegistrationConfig::new(args.league_url.as_str()));

    start_server(config, context, args.version, registration)
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

/// Resolve the strategy and build the shared player state
fn build_context(args: &PlayerArgs) -> Result<Arc<PlayerContext>> {
    let strategy = StrategyRegistry::builtin()
        .create(&args.strategy)
        .context("invalid --strategy")?;
    Ok(Arc::new(PlayerContext::new(args.display_name.as_str(), strategy)))
}

/// Start the server (blocking)
fn start_server(
    config: ServerConfig,
    context: Arc<PlayerContext>,
    version: String,
    registration: Option<RegistrationConfig>,
) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run_player_server(config, context, version, registration))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: PlayerArgs,
    }

    fn parse(argv: &[&str]) -> PlayerArgs {
        TestCli::try_parse_from(std::iter::once("player").chain(argv.iter().copied()))
            .unwrap()
            .args
    }

    #[test]
    fn test_build_context() {
        let args = parse(&["--display-name", "Alice", "--strategy", "always_even"]);
        let context = build_context(&args).unwrap();
        assert_eq!(context.display_name(), "Alice");
        assert_eq!(context.strategy_name(), "always_even");
    }

    #[test]
    fn test_unknown_strategy_rejected() {
        let args = parse(&["--strategy", "psychic"]);
        let error = build_context(&args).err().unwrap();
        assert!(format!("{:#}", error).contains("psychic"));
    }
}
