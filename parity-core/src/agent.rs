//! Agent identity
//!
//! An agent is any process taking part in the league: a player guessing
//! parities, or the optional external referee. Agents are addressed only by
//! their endpoint URL.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Registered participant identity
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Agent {
    /// Unique display name (primary key)
    pub display_name: String,
    /// Informational version string
    pub version: String,
    /// JSON-RPC endpoint used to reach the agent
    pub endpoint: String,
}

impl Agent {
    /// Create an agent, rejecting an empty name or endpoint
    pub fn new(
        display_name: impl Into<String>,
        version: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Result<Self, CoreError> {
        let agent = Self {
            display_name: display_name.into(),
            version: version.into(),
            endpoint: endpoint.into(),
        };
        agent.validate()?;
        Ok(agent)
    }

    /// Check the identity invariants
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.display_name.trim().is_empty() {
            return Err(CoreError::EmptyName);
        }
        if self.endpoint.trim().is_empty() {
            return Err(CoreError::EmptyEndpoint);
        }
        Ok(())
    }
}

impl fmt::Display for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (v{}) at {}", self.display_name, self.version, self.endpoint)
    }
}

/// Role an agent registers under
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    #[default]
    Player,
    Referee,
}

impl AgentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::Player => "player",
            AgentKind::Referee => "referee",
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "player" => Ok(AgentKind::Player),
            "referee" => Ok(AgentKind::Referee),
            other => Err(CoreError::UnknownAgentKind(other.to_string())),
        }
    }
}
