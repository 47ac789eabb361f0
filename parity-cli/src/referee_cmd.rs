//! Referee command - serve the referee agent
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: configure_referee(), start_server()
//! - Level 3: (delegated to parity-server crate)
//! - Level 4: configuration

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Args;

use parity_league::{HttpTransport, Referee, RefereeConfig};
use parity_server::{run_referee_server, RefereeState, RegistrationConfig, ServerConfig};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct RefereeArgs {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value = "8000")]
    pub port: u16,

    /// Address to bind and advertise
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Name used at registration
    #[arg(long, env = "DISPLAY_NAME", default_value = "Referee")]
    pub display_name: String,

    /// Version reported at registration and on /health
    #[arg(long, env = "VERSION", default_value = "1.0.0")]
    pub version: String,

    /// League manager base URL
    #[arg(long, env = "LEAGUE_URL", default_value = "http://127.0.0.1:9000")]
    pub league_url: String,

    /// Deadline for each call to a player, in seconds
    #[arg(long, default_value = "30")]
    pub timeout_secs: u64,

    /// Seed for the dice (random when absent)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Do not register with the league manager
    #[arg(long)]
    pub no_register: bool,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run referee command
pub fn run(args: RefereeArgs) -> Result<()> {
    let referee_config = configure_referee(&args);
    let config = ServerConfig::new(args.port).with_host(args.host.as_str());
    let registration = (!args.no_register).then(|| RegistrationConfig::new(args.league_url.as_str()));

    start_server(config, referee_config, args, registration)
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

/// Hosted referee settings from command arguments
fn configure_referee(args: &RefereeArgs) -> RefereeConfig {
    let config = RefereeConfig::hosted().with_timeout(Duration::from_secs(args.timeout_secs));
    match args.seed {
        Some(seed) => config.with_seed(seed),
        None => config,
    }
}

/// Start the server (blocking)
fn start_server(
    config: ServerConfig,
    referee_config: RefereeConfig,
    args: RefereeArgs,
    registration: Option<RegistrationConfig>,
) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;

    runtime.block_on(async {
        let referee = Referee::new(Arc::new(HttpTransport::new()), referee_config);
        let state = Arc::new(RefereeState::new(referee, args.version));
        run_referee_server(config, state, args.display_name, registration).await
    })
}
