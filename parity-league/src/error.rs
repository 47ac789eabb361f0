//! Error types for the league layer

use parity_core::rpc::RpcError;
use parity_core::CoreError;
use thiserror::Error;

/// Failure of one outbound JSON-RPC call
///
/// Timeouts are reported as `Network`; callers treat every variant alike.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    /// Connection failure or no reply within the deadline
    #[error("network error: {0}")]
    Network(String),

    /// Non-success HTTP status
    #[error("HTTP status {0}")]
    Status(u16),

    /// Reply was not a valid response envelope or had the wrong shape
    #[error("malformed reply: {0}")]
    Malformed(String),

    /// Remote side answered with an error envelope
    #[error(transparent)]
    Rpc(#[from] RpcError),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            TransportError::Malformed(err.to_string())
        } else if let Some(status) = err.status() {
            TransportError::Status(status.as_u16())
        } else {
            TransportError::Network(err.to_string())
        }
    }
}

/// Registration rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("invalid agent: {0}")]
    InvalidAgent(#[from] CoreError),
}

/// A match could not be attempted at all
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    /// External referee mode without a registered referee
    #[error("no external referee is registered")]
    NoReferee,
}

/// League could not be started or was aborted
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("not enough agents: {registered} registered, at least 2 required")]
    NotEnoughAgents { registered: usize },

    #[error("league is already running")]
    AlreadyRunning,

    #[error("league has already completed; create a new league to play again")]
    AlreadyComplete,

    #[error(transparent)]
    Match(#[from] MatchError),
}
