//! Per-role reactions to incoming envelopes.
//!
//! Every handler is a function of (agent state, envelope) that may mutate
//! the agent's own state and returns the envelopes it emits. Handlers run
//! with the agent's lock held and must not block.

pub mod camera;
pub mod drone;
pub mod guard;

use std::time::Duration;

use crate::agent::{AgentSnapshot, AgentState, Role, SharedAgent};
use crate::error::Result;
use crate::protocol::{Envelope, Voter};
use crate::sim::scheduler::DelayedTaskScheduler;

/// Everything a handler may use besides its own agent.
pub struct HandlerContext<'a> {
    pub scheduler: &'a DelayedTaskScheduler,
    pub voter: &'a Voter,
    pub bid_factor: f64,
    pub task_delay: Duration,
}

pub type Handler =
    fn(&SharedAgent, &mut AgentState, &Envelope, &HandlerContext<'_>) -> Result<Vec<Envelope>>;

/// Handler for a role; the robber takes no messages.
pub fn handler_for(role: Role) -> Option<Handler> {
    match role {
        Role::Drone => Some(drone::handle),
        Role::Camera => Some(camera::handle),
        Role::Guard => Some(guard::handle),
        Role::Robber => None,
    }
}

/// Result of a handler run.
#[derive(Debug)]
pub struct Handled {
    pub emitted: Vec<Envelope>,
    /// Agent state right after the handler returned.
    pub snapshot: AgentSnapshot,
}

/// Run `handler` for `agent` under the agent's lock.
pub fn run_handler(
    handler: Handler,
    agent: &SharedAgent,
    envelope: &Envelope,
    ctx: &HandlerContext<'_>,
) -> Result<Handled> {
    let mut state = agent.lock();
    let emitted = handler(agent, &mut state, envelope, ctx)?;
    let snapshot = AgentSnapshot::capture(agent.role(), &state);
    Ok(Handled { emitted, snapshot })
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::persistence::NullSink;
    use std::sync::Arc;

    pub struct Fixture {
        pub scheduler: DelayedTaskScheduler,
        pub voter: Voter,
    }

    impl Fixture {
        pub fn new() -> Self {
            Self {
                scheduler: DelayedTaskScheduler::new(Arc::new(NullSink)),
                voter: Voter::new(Some(1)),
            }
        }

        pub fn ctx(&self) -> HandlerContext<'_> {
            HandlerContext {
                scheduler: &self.scheduler,
                voter: &self.voter,
                bid_factor: 0.1,
                task_delay: Duration::from_secs(2),
            }
        }
    }
}
