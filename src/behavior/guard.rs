//! Guard: idle, answers calls for vote.

use crate::agent::{AgentState, SharedAgent};
use crate::error::Result;
use crate::protocol::{vote, Envelope, Performative};

use super::HandlerContext;

pub fn handle(
    agent: &SharedAgent,
    _state: &mut AgentState,
    envelope: &Envelope,
    ctx: &HandlerContext<'_>,
) -> Result<Vec<Envelope>> {
    match envelope.performative() {
        Performative::CallForVote => Ok(vec![vote::respond(envelope, agent.name(), ctx.voter)]),
        _ => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{Agent, Position, Role, Status};
    use crate::behavior::testing::Fixture;

    #[test]
    fn test_guard_votes() {
        let fixture = Fixture::new();
        let guard = Agent::new(Role::Guard, Position::default(), None);
        let cfv = Envelope::new("DroneAgent", "GuardAgent", "call_for_vote", "Engage?");

        let emitted = handle(&guard, &mut guard.lock(), &cfv, &fixture.ctx()).unwrap();

        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].sender(), "GuardAgent");
        assert_eq!(emitted[0].receiver(), "DroneAgent");
        assert!(matches!(emitted[0].content(), "Vote:yes" | "Vote:no"));
        assert_eq!(guard.status(), Status::Idle);
    }

    #[test]
    fn test_guard_ignores_proposals() {
        let fixture = Fixture::new();
        let guard = Agent::new(Role::Guard, Position::default(), None);
        let cfp = Envelope::new("CameraAgent", "GuardAgent", "call_for_proposal", "");

        let emitted = handle(&guard, &mut guard.lock(), &cfp, &fixture.ctx()).unwrap();
        assert!(emitted.is_empty());
    }
}
