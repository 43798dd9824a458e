//! Agent registry and receiver-name routing.
//!
//! Handles:
//! - Role-name → agent resolution (unknown names resolve to nothing)
//! - Per-role handler lookup, fixed once at setup
//! - Gateway-side agent name normalization (`Drone1` → `DroneAgent`)

use std::collections::BTreeMap;

use crate::agent::{Agent, AgentSnapshot, Role, SharedAgent};
use crate::behavior::{handler_for, Handler};
use crate::config::Settings;

/// Receiver used when an inbound message names none. No agent has this name.
pub const SYSTEM_ROLE: &str = "SimulationServer";

/// Normalize an external agent id to a routing name.
///
/// External clients number their agents (`Drone1`, `Camera1`); every `1`
/// becomes `Agent`.
///
/// # Examples
///
/// ```
/// use dronewatch::core::routing::normalize_agent_name;
/// assert_eq!(normalize_agent_name("Drone1"), "DroneAgent");
/// assert_eq!(normalize_agent_name("SimulationServer"), "SimulationServer");
/// ```
pub fn normalize_agent_name(raw: &str) -> String {
    raw.replace('1', "Agent")
}

/// A registered agent together with its resolved handler.
#[derive(Clone)]
pub struct Registered {
    pub agent: SharedAgent,
    /// None for roles that take no messages.
    pub handler: Option<Handler>,
}

/// Immutable name → agent map, built once at startup.
#[derive(Clone, Default)]
pub struct AgentRegistry {
    entries: BTreeMap<&'static str, Registered>,
}

impl AgentRegistry {
    pub fn builder() -> AgentRegistryBuilder {
        AgentRegistryBuilder::default()
    }

    /// One agent per role, placed according to settings.
    pub fn standard(settings: &Settings) -> Self {
        Self::builder()
            .register(Agent::drone(
                settings.drone.initial_battery,
                settings.drone.position,
            ))
            .register(Agent::new(Role::Camera, settings.camera.position, None))
            .register(Agent::new(Role::Guard, settings.guard.position, None))
            .register(Agent::new(Role::Robber, settings.robber.position, None))
            .build()
    }

    /// The sole agent registered under `name`, if any.
    pub fn resolve(&self, name: &str) -> Option<&SharedAgent> {
        self.entries.get(name).map(|e| &e.agent)
    }

    pub fn entry(&self, name: &str) -> Option<&Registered> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered agents ordered by routing name.
    pub fn agents(&self) -> impl Iterator<Item = &SharedAgent> {
        self.entries.values().map(|e| &e.agent)
    }

    pub fn snapshots(&self) -> Vec<AgentSnapshot> {
        self.agents().map(|a| a.snapshot()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Default)]
pub struct AgentRegistryBuilder {
    entries: BTreeMap<&'static str, Registered>,
}

impl AgentRegistryBuilder {
    /// Register an agent under its role's routing name.
    pub fn register(self, agent: SharedAgent) -> Self {
        let handler = handler_for(agent.role());
        self.insert(agent, handler)
    }

    /// Register an agent with a handler other than its role's default.
    pub fn register_with(self, agent: SharedAgent, handler: Handler) -> Self {
        self.insert(agent, Some(handler))
    }

    fn insert(mut self, agent: SharedAgent, handler: Option<Handler>) -> Self {
        let role = agent.role();
        if self
            .entries
            .insert(role.name(), Registered { agent, handler })
            .is_some()
        {
            tracing::warn!("Replaced previously registered {}", role.name());
        }
        self
    }

    pub fn build(self) -> AgentRegistry {
        AgentRegistry {
            entries: self.entries,
        }
    }
}
