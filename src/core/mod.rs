//! Core module - message channel and agent routing.
//!
//! This module contains the shared plumbing every producer and the clock use:
//! - In-memory envelope channel
//! - Agent registry and name routing

pub mod queue;
pub mod routing;

pub use queue::{ChannelStats, MessageChannel};
pub use routing::{AgentRegistry, SYSTEM_ROLE};
