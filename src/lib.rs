//! DroneWatch library root.

pub mod agent;
pub mod behavior;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod persistence;
pub mod protocol;
pub mod sim;
pub mod web;

pub use agent::{Agent, AgentSnapshot, Role, Status};
pub use cli::Commands;
pub use config::{load_settings, Settings};
pub use crate::core::{AgentRegistry, MessageChannel};
pub use error::{Error, Result};
pub use persistence::{MemorySink, PersistenceSink, SqliteSink};
pub use protocol::{Envelope, Performative};
pub use sim::{Simulation, SimulationClock};
