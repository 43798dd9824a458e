//! API endpoints module.

pub mod agents;
pub mod messages;

pub use agents::{get_agent, list_agents, queue_stats};
pub use messages::{agent_action, kqml_message, log_message, parse_kqml_request};
