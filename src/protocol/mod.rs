//! Agent communication protocol for DroneWatch.
//!
//! This module defines the performative-tagged messages agents exchange:
//! - Immutable envelopes (sender, receiver, performative, content)
//! - The contract-net bidding exchange (drone ⇄ camera)
//! - The voting exchange (drone, guard)

pub mod contract_net;
pub mod envelope;
pub mod types;
pub mod vote;

pub use contract_net::Bid;
pub use envelope::{Envelope, EnvelopeBuilder};
pub use types::Performative;
pub use vote::{Vote, Voter};
