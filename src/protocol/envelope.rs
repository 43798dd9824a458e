//! Immutable message envelopes exchanged between agents.

use serde::{Deserialize, Serialize};

use super::types::Performative;
use crate::error::{Error, Result};

/// A single performative-tagged message.
///
/// Fields are private: an envelope never changes after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Unique message ID (ULID)
    id: String,
    /// Sender role name
    sender: String,
    /// Receiver role name
    receiver: String,
    performative: Performative,
    /// Free-text payload
    content: String,
    /// Creation timestamp (unix ms)
    created_at: i64,
}

impl Envelope {
    /// Create a new envelope from one role to another.
    pub fn new(
        sender: impl Into<String>,
        receiver: impl Into<String>,
        performative: impl Into<Performative>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: generate_id(),
            sender: sender.into(),
            receiver: receiver.into(),
            performative: performative.into(),
            content: content.into(),
            created_at: current_timestamp(),
        }
    }

    /// Create a response addressed back to this envelope's sender.
    pub fn reply(
        &self,
        from: impl Into<String>,
        performative: impl Into<Performative>,
        content: impl Into<String>,
    ) -> Self {
        Self::new(from, self.sender.clone(), performative, content)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    pub fn receiver(&self) -> &str {
        &self.receiver
    }

    pub fn performative(&self) -> &Performative {
        &self.performative
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    /// Check if this envelope is addressed to a specific role.
    pub fn is_for(&self, role: &str) -> bool {
        self.receiver == role
    }
}

/// Builder for envelopes arriving with optional fields.
pub struct EnvelopeBuilder {
    sender: String,
    receiver: Option<String>,
    performative: Option<Performative>,
    content: Option<String>,
}

impl EnvelopeBuilder {
    /// Start building an envelope from a sender.
    pub fn from(sender: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            receiver: None,
            performative: None,
            content: None,
        }
    }

    pub fn to(mut self, receiver: impl Into<String>) -> Self {
        self.receiver = Some(receiver.into());
        self
    }

    pub fn performative(mut self, performative: impl Into<Performative>) -> Self {
        self.performative = Some(performative.into());
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Build the envelope.
    ///
    /// `default_receiver` is used when no receiver was given; content
    /// defaults to the empty string.
    pub fn build(self, default_receiver: &str) -> Result<Envelope> {
        if self.sender.is_empty() {
            return Err(Error::InvalidMessage("sender is required".to_string()));
        }
        let performative = self
            .performative
            .ok_or_else(|| Error::InvalidMessage("performative is required".to_string()))?;

        Ok(Envelope::new(
            self.sender,
            self.receiver.unwrap_or_else(|| default_receiver.to_string()),
            performative,
            self.content.unwrap_or_default(),
        ))
    }
}

fn generate_id() -> String {
    ulid::Ulid::new().to_string()
}

fn current_timestamp() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
