//! Parity Core - Domain model and wire protocol
//!
//! This crate provides the pieces shared by every process in a parity league:
//! - Agent identity and kinds
//! - Parity choices and the winner rule
//! - Game results and the remote referee match report
//! - JSON-RPC 2.0 envelope codec and error taxonomy
//! - Player-side bookkeeping and pluggable choice strategies

pub mod agent;
pub mod error;
pub mod game;
pub mod parity;
pub mod player;
pub mod rpc;
pub mod strategy;

// Re-exports for convenient access
pub use agent::{Agent, AgentKind};
pub use error::CoreError;
pub use game::{GameResult, MatchReport};
pub use parity::{decide, Choice, Parity, Verdict, DICE_MAX, DICE_MIN};
pub use player::{HistoryEntry, Outcome, PlayerState, PlayerStats};
pub use strategy::{ParityStrategy, StrategyRegistry, DEFAULT_STRATEGY};
