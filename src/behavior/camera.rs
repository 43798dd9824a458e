//! Camera: always monitoring; a detection report opens a call for proposals.

use crate::agent::{AgentState, Role, SharedAgent};
use crate::error::Result;
use crate::protocol::contract_net::{CALL_FOR_PROPOSAL_CONTENT, THIEF_DETECTED};
use crate::protocol::{Envelope, Performative};

use super::HandlerContext;

pub fn handle(
    agent: &SharedAgent,
    _state: &mut AgentState,
    envelope: &Envelope,
    _ctx: &HandlerContext<'_>,
) -> Result<Vec<Envelope>> {
    if *envelope.performative() == Performative::Inform && envelope.content().contains(THIEF_DETECTED) {
        tracing::info!("{} opening call for proposals", agent.name());
        return Ok(vec![Envelope::new(
            agent.name(),
            Role::Drone.name(),
            Performative::CallForProposal,
            CALL_FOR_PROPOSAL_CONTENT,
        )]);
    }
    Ok(Vec::new())
}
