//! Configuration types for league play
//!
//! Level 4 - Utilities and configuration

use std::time::Duration;

/// Per-call settings for the embedded match referee
#[derive(Clone, Debug)]
pub struct RefereeConfig {
    /// Deadline for each invitation / choice / notification call
    pub call_timeout: Duration,
    /// Name sent as `from_player` in invitations
    pub inviter: String,
    /// Random seed for the drawn values (None = entropy)
    pub seed: Option<u64>,
}

impl Default for RefereeConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(5),
            inviter: "LeagueManager".to_string(),
            seed: None,
        }
    }
}

impl RefereeConfig {
    /// Settings for a referee running as its own agent process; players
    /// still see invitations from the league manager
    pub fn hosted() -> Self {
        Self {
            call_timeout: Duration::from_secs(30),
            ..Default::default()
        }
    }

    /// Set the per-call timeout
    pub fn with_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// Set random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Settings for the remote referee bridge
#[derive(Clone, Debug)]
pub struct RemoteRefereeConfig {
    /// Deadline for a whole `run_match` call
    pub timeout: Duration,
}

impl Default for RemoteRefereeConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
        }
    }
}

/// Which referee runs the matches
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RefereeMode {
    /// Referee runs inside the league manager
    #[default]
    Embedded,
    /// Matches are delegated to the registered external referee
    External,
}

/// League configuration
#[derive(Clone, Debug)]
pub struct LeagueConfig {
    /// Number of rounds; every pair meets once per round
    pub rounds: u32,
    /// Pause after each match
    pub match_pause: Duration,
    /// Whether to run a round's matches concurrently
    pub parallel: bool,
    /// Referee selection
    pub referee_mode: RefereeMode,
    /// Embedded referee settings
    pub referee: RefereeConfig,
    /// Remote bridge settings
    pub remote: RemoteRefereeConfig,
}

impl Default for LeagueConfig {
    fn default() -> Self {
        Self {
            rounds: 3,
            match_pause: Duration::from_millis(100),
            parallel: false,
            referee_mode: RefereeMode::Embedded,
            referee: RefereeConfig::default(),
            remote: RemoteRefereeConfig::default(),
        }
    }
}

impl LeagueConfig {
    /// Create config with the given number of rounds
    pub fn new(rounds: u32) -> Self {
        Self {
            rounds,
            ..Default::default()
        }
    }

    /// Set the pause between matches
    pub fn with_pause(mut self, match_pause: Duration) -> Self {
        self.match_pause = match_pause;
        self
    }

    /// Run each round's matches concurrently
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Delegate matches to an external referee
    pub fn with_external_referee(mut self) -> Self {
        self.referee_mode = RefereeMode::External;
        self
    }

    /// Set embedded referee settings
    pub fn with_referee(mut self, referee: RefereeConfig) -> Self {
        self.referee = referee;
        self
    }

    /// Set remote bridge settings
    pub fn with_remote(mut self, remote: RemoteRefereeConfig) -> Self {
        self.remote = remote;
        self
    }
}
