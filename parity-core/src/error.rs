//! Error types for the domain layer

use thiserror::Error;

/// Errors raised by domain constructors and registries
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Display name was empty or whitespace
    #[error("display name must not be empty")]
    EmptyName,

    /// Endpoint was empty or whitespace
    #[error("endpoint must not be empty")]
    EmptyEndpoint,

    /// Agent type string was neither "player" nor "referee"
    #[error("unknown agent type '{0}', expected 'player' or 'referee'")]
    UnknownAgentKind(String),

    /// Strategy name not present in the registry
    #[error("unknown strategy '{name}'. Available: {available}")]
    UnknownStrategy { name: String, available: String },
}
