//! Agent registry
//!
//! Level 4 - players keyed by display name, plus at most one external
//! referee. Entries are only ever added or replaced. Players keep the
//! position of their first registration so snapshots come out in a stable
//! order.

use parity_core::{Agent, AgentKind};
use rustc_hash::FxHashMap;
use std::sync::{Arc, RwLock};
use tracing::info;

use crate::error::RegistryError;

/// Registry shared between the HTTP surface and the scheduler
pub type SharedRegistry = Arc<RwLock<AgentRegistry>>;

/// What a registration did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Registration {
    /// New entry
    Added,
    /// Existing name, different version or endpoint
    Replaced,
    /// Identical to the existing entry
    Unchanged,
}

/// Registered players and the optional referee
#[derive(Clone, Debug, Default)]
pub struct AgentRegistry {
    players: Vec<Agent>,
    index: FxHashMap<String, usize>,
    referee: Option<Agent>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap in the shared handle
    pub fn shared(self) -> SharedRegistry {
        Arc::new(RwLock::new(self))
    }

    /// Insert or replace an agent (last write wins)
    pub fn register(&mut self, agent: Agent, kind: AgentKind) -> Result<Registration, RegistryError> {
        agent.validate()?;

        let outcome = match kind {
            AgentKind::Player => self.register_player(agent.clone()),
            AgentKind::Referee => self.register_referee(agent.clone()),
        };

        info!("Registered {} {} ({:?})", kind, agent, outcome);
        Ok(outcome)
    }

    fn register_player(&mut self, agent: Agent) -> Registration {
        match self.index.get(&agent.display_name) {
            Some(&slot) if self.players[slot] == agent => Registration::Unchanged,
            Some(&slot) => {
                self.players[slot] = agent;
                Registration::Replaced
            }
            None => {
                self.index.insert(agent.display_name.clone(), self.players.len());
                self.players.push(agent);
                Registration::Added
            }
        }
    }

    fn register_referee(&mut self, agent: Agent) -> Registration {
        let outcome = match &self.referee {
            Some(current) if *current == agent => Registration::Unchanged,
            Some(_) => Registration::Replaced,
            None => Registration::Added,
        };
        self.referee = Some(agent);
        outcome
    }

    /// Snapshot of the players in first-registration order
    pub fn players(&self) -> Vec<Agent> {
        self.players.clone()
    }

    pub fn player(&self, name: &str) -> Option<&Agent> {
        self.index.get(name).map(|&slot| &self.players[slot])
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// The active external referee, if any
    pub fn referee(&self) -> Option<&Agent> {
        self.referee.as_ref()
    }
}
