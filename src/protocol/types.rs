//! Performative vocabulary for the agent communication protocol.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Speech-act tag carried by every envelope.
///
/// Unknown tags are kept verbatim in [`Performative::Other`]: they are
/// accepted, routed, and recorded, but no behavior reacts to them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Performative {
    CallForProposal,
    Propose,
    AcceptProposal,
    Inform,
    CallForVote,
    Other(String),
}

impl Performative {
    pub fn as_str(&self) -> &str {
        match self {
            Performative::CallForProposal => "call_for_proposal",
            Performative::Propose => "propose",
            Performative::AcceptProposal => "accept_proposal",
            Performative::Inform => "inform",
            Performative::CallForVote => "call_for_vote",
            Performative::Other(raw) => raw,
        }
    }

    /// Whether this tag belongs to the fixed vocabulary.
    pub fn is_known(&self) -> bool {
        !matches!(self, Performative::Other(_))
    }
}

impl FromStr for Performative {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "call_for_proposal" => Performative::CallForProposal,
            "propose" => Performative::Propose,
            "accept_proposal" => Performative::AcceptProposal,
            "inform" => Performative::Inform,
            "call_for_vote" => Performative::CallForVote,
            other => Performative::Other(other.to_string()),
        })
    }
}

impl From<String> for Performative {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(p) => p,
            Err(never) => match never {},
        }
    }
}

impl From<&str> for Performative {
    fn from(s: &str) -> Self {
        Performative::from(s.to_string())
    }
}

impl From<Performative> for String {
    fn from(p: Performative) -> Self {
        p.as_str().to_string()
    }
}

impl fmt::Display for Performative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vocabulary() {
        for tag in [
            "call_for_proposal",
            "propose",
            "accept_proposal",
            "inform",
            "call_for_vote",
        ] {
            let p = Performative::from(tag);
            assert!(p.is_known(), "{} should be known", tag);
            assert_eq!(p.as_str(), tag);
        }
    }

    #[test]
    fn test_unknown_performative_is_kept() {
        let p = Performative::from("request");
        assert_eq!(p, Performative::Other("request".to_string()));
        assert!(!p.is_known());
        assert_eq!(p.to_string(), "request");
    }

    #[test]
    fn test_serde_uses_wire_names() {
        let json = serde_json::to_string(&Performative::AcceptProposal).unwrap();
        assert_eq!(json, "\"accept_proposal\"");

        let parsed: Performative = serde_json::from_str("\"call_for_vote\"").unwrap();
        assert_eq!(parsed, Performative::CallForVote);
    }
}
