//! Voting exchange: `call_for_vote` answered by `inform` with `Vote:<yes|no>`.
//!
//! Limitation: votes are reported one by one to whoever asked. There is no
//! tally, quorum or majority; nothing derives a consensus from the replies.

use std::fmt;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::envelope::Envelope;
use super::types::Performative;

const VOTE_PREFIX: &str = "Vote:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vote {
    Yes,
    No,
}

impl Vote {
    pub fn as_str(&self) -> &'static str {
        match self {
            Vote::Yes => "yes",
            Vote::No => "no",
        }
    }

    /// Wire form, e.g. `Vote:yes`.
    pub fn to_content(&self) -> String {
        format!("{}{}", VOTE_PREFIX, self.as_str())
    }

    pub fn from_content(content: &str) -> Option<Vote> {
        match content.strip_prefix(VOTE_PREFIX)? {
            "yes" => Some(Vote::Yes),
            "no" => Some(Vote::No),
            _ => None,
        }
    }
}

impl fmt::Display for Vote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Uniform yes/no draws shared by every voting role.
#[derive(Debug)]
pub struct Voter {
    rng: Mutex<StdRng>,
}

impl Voter {
    /// Seeded voter for reproducible runs; OS entropy when `seed` is None.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            rng: Mutex::new(rng),
        }
    }

    pub fn draw(&self) -> Vote {
        if self.rng.lock().random_bool(0.5) {
            Vote::Yes
        } else {
            Vote::No
        }
    }
}

impl Default for Voter {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Answer a call for vote with a fresh draw, addressed to the requester.
pub fn respond(request: &Envelope, from: &str, voter: &Voter) -> Envelope {
    let vote = voter.draw();
    tracing::debug!("{} votes {} for {}", from, vote, request.sender());
    request.reply(from, Performative::Inform, vote.to_content())
}
