//! Drone: bids on calls for proposals, performs accepted tasks, votes.

use crate::agent::{AgentState, SharedAgent};
use crate::error::Result;
use crate::protocol::{contract_net, vote, Envelope, Performative};

use super::HandlerContext;

pub fn handle(
    agent: &SharedAgent,
    state: &mut AgentState,
    envelope: &Envelope,
    ctx: &HandlerContext<'_>,
) -> Result<Vec<Envelope>> {
    match envelope.performative() {
        Performative::CallForProposal => Ok(vec![contract_net::propose(
            envelope,
            agent.name(),
            state,
            ctx.bid_factor,
        )?]),
        Performative::AcceptProposal => {
            contract_net::accept(agent, state, ctx.scheduler, ctx.task_delay);
            Ok(Vec::new())
        }
        Performative::CallForVote => Ok(vec![vote::respond(envelope, agent.name(), ctx.voter)]),
        _ => Ok(Vec::new()),
    }
}
