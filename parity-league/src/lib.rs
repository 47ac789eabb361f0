//! Parity League - Match refereeing and league scheduling
//!
//! This crate provides the league machinery:
//! - Agent registry (players plus at most one external referee)
//! - Match referee driving one game over JSON-RPC
//! - Remote referee bridge delegating matches to an external referee
//! - Round-robin scheduler with cumulative standings
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: LeagueScheduler::run (orchestration)
//! - Level 2: MatchRunner::run_match (one match, embedded or remote)
//! - Level 3: invitation / choice / notification calls (steps)
//! - Level 4: transport, configuration, registry, standings

mod config;
mod error;
mod referee;
mod registry;
mod remote;
mod runner;
mod scheduler;
mod standings;
mod transport;

#[cfg(test)]
mod mock;

pub use config::{LeagueConfig, RefereeConfig, RefereeMode, RemoteRefereeConfig};
pub use error::{MatchError, RegistryError, ScheduleError, TransportError};
pub use referee::Referee;
pub use registry::{AgentRegistry, Registration, SharedRegistry};
pub use remote::RemoteReferee;
pub use runner::MatchRunner;
pub use scheduler::{LeaguePhase, LeagueScheduler, LeagueSnapshot, LeagueStart, LeagueSummary};
pub use standings::{LeagueStats, RankedStanding, Standing};
pub use transport::{call_with_timeout, HttpTransport, RpcTransport};
