//! Contract-net exchange between the camera and the drone.
//!
//! ```text
//! Camera ── call_for_proposal ──► Drone
//! Camera ◄──────── propose ────── Drone   (Bid:<battery × factor>)
//!   ?    ──── accept_proposal ──► Drone   → Performing Task
//!                                           … task delay …
//!                                           → Task Completed
//! ```
//!
//! Nothing in the scenario compares bids or sends `accept_proposal`; any
//! acceptance the drone receives (e.g. injected through the gateway) is
//! honored unconditionally. Completion is reported through the drone's
//! status only, not through a further message.

use std::fmt;
use std::time::Duration;

use super::envelope::Envelope;
use super::types::Performative;
use crate::agent::{AgentState, SharedAgent, Status};
use crate::error::{Error, Result};
use crate::sim::scheduler::DelayedTaskScheduler;

/// Substring of an `inform` that makes the camera open a call for proposals.
pub const THIEF_DETECTED: &str = "Thief detected";

/// Content of the camera's call for proposals.
pub const CALL_FOR_PROPOSAL_CONTENT: &str = "Search and confirm thief";

const BID_PREFIX: &str = "Bid:";

/// A drone's bid, derived from its battery level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bid(pub f64);

impl Bid {
    pub fn from_battery(battery: f64, factor: f64) -> Self {
        Bid(battery * factor)
    }

    /// Wire form, e.g. `Bid:10.0`.
    pub fn to_content(&self) -> String {
        self.to_string()
    }

    pub fn from_content(content: &str) -> Option<Bid> {
        content
            .strip_prefix(BID_PREFIX)
            .and_then(|v| v.trim().parse::<f64>().ok())
            .map(Bid)
    }
}

impl fmt::Display for Bid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Debug keeps the decimal point on whole numbers (10.0, not 10).
        write!(f, "{}{:?}", BID_PREFIX, self.0)
    }
}

/// Answer a call for proposals with a `propose` carrying the drone's bid.
pub fn propose(
    request: &Envelope,
    from: &str,
    state: &AgentState,
    bid_factor: f64,
) -> Result<Envelope> {
    let battery = state.battery.ok_or_else(|| Error::Handler {
        agent: from.to_string(),
        reason: "no battery level to bid with".to_string(),
    })?;
    let bid = Bid::from_battery(battery, bid_factor);
    tracing::debug!("{} bids {} to {}", from, bid, request.sender());
    Ok(request.reply(from, Performative::Propose, bid.to_content()))
}

/// Honor an accepted proposal: start the task and arm its completion timer.
///
/// A drone that already completed its task stays completed. A repeat
/// acceptance while the task is running re-arms the timer from now.
pub fn accept(
    agent: &SharedAgent,
    state: &mut AgentState,
    scheduler: &DelayedTaskScheduler,
    task_delay: Duration,
) {
    if state.status.is_terminal() {
        tracing::info!("{} already completed its task, ignoring acceptance", agent.name());
        return;
    }

    if let Some(previous) = state.pending_task.take() {
        scheduler.cancel(&previous);
    }

    state.status = Status::PerformingTask;
    let handle = scheduler.schedule(agent.clone(), task_delay, |state| {
        if state.status == Status::PerformingTask {
            state.status = Status::TaskCompleted;
        }
    });
    state.pending_task = Some(handle);
    tracing::info!("{} performing task for {:?}", agent.name(), task_delay);
}
