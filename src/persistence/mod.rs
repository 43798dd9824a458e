//! Persistence sink for agent snapshots and the message log.
//!
//! The core only needs two calls: upsert an agent snapshot and append a
//! message record. Sink failures are logged and discarded so a storage
//! outage never stalls the simulation clock.

pub mod sqlite;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::agent::AgentSnapshot;
use crate::error::Result;
use crate::protocol::Envelope;

pub use sqlite::{default_db_path, SqliteSink};

/// Append-only record of a handled envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: String,
    pub performative: String,
    pub content: String,
    /// Set only when the sender resolves to a known agent.
    pub sender: Option<String>,
    pub receiver: String,
    /// Record time (unix ms)
    pub recorded_at: i64,
}

impl MessageRecord {
    pub fn from_envelope(envelope: &Envelope, sender_known: bool) -> Self {
        Self {
            id: envelope.id().to_string(),
            performative: envelope.performative().to_string(),
            content: envelope.content().to_string(),
            sender: sender_known.then(|| envelope.sender().to_string()),
            receiver: envelope.receiver().to_string(),
            recorded_at: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// Storage behind the simulation. Implementations must return quickly.
pub trait PersistenceSink: Send + Sync {
    fn update_agent(&self, snapshot: &AgentSnapshot) -> Result<()>;

    fn append_message(&self, record: &MessageRecord) -> Result<()>;
}

/// Upsert a snapshot, logging and discarding any failure.
pub fn update_or_log(sink: &dyn PersistenceSink, snapshot: &AgentSnapshot) {
    if let Err(e) = sink.update_agent(snapshot) {
        tracing::warn!("Dropped agent record for {}: {}", snapshot.role, e);
    }
}

/// Append a message record, logging and discarding any failure.
pub fn append_or_log(sink: &dyn PersistenceSink, record: &MessageRecord) {
    if let Err(e) = sink.append_message(record) {
        tracing::warn!("Dropped message record {}: {}", record.id, e);
    }
}

/// Sink that stores nothing.
#[derive(Debug, Default)]
pub struct NullSink;

impl PersistenceSink for NullSink {
    fn update_agent(&self, _snapshot: &AgentSnapshot) -> Result<()> {
        Ok(())
    }

    fn append_message(&self, _record: &MessageRecord) -> Result<()> {
        Ok(())
    }
}

/// In-memory sink keeping every call, in order.
#[derive(Debug, Default)]
pub struct MemorySink {
    agents: Mutex<Vec<AgentSnapshot>>,
    messages: Mutex<Vec<MessageRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every snapshot ever written, oldest first.
    pub fn agent_updates(&self) -> Vec<AgentSnapshot> {
        self.agents.lock().clone()
    }

    /// Most recent snapshot for a role.
    pub fn latest(&self, role: &str) -> Option<AgentSnapshot> {
        self.agents.lock().iter().rev().find(|s| s.role == role).cloned()
    }

    pub fn messages(&self) -> Vec<MessageRecord> {
        self.messages.lock().clone()
    }
}

impl PersistenceSink for MemorySink {
    fn update_agent(&self, snapshot: &AgentSnapshot) -> Result<()> {
        self.agents.lock().push(snapshot.clone());
        Ok(())
    }

    fn append_message(&self, record: &MessageRecord) -> Result<()> {
        self.messages.lock().push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{Agent, Position};
    use crate::error::Error;

    struct FailingSink;

    impl PersistenceSink for FailingSink {
        fn update_agent(&self, _snapshot: &AgentSnapshot) -> Result<()> {
            Err(Error::Persistence("disk full".to_string()))
        }

        fn append_message(&self, _record: &MessageRecord) -> Result<()> {
            Err(Error::Persistence("disk full".to_string()))
        }
    }

    #[test]
    fn test_message_record_sender_only_when_known() {
        let envelope = Envelope::new("Drone1", "CameraAgent", "inform", "hello");

        let unknown = MessageRecord::from_envelope(&envelope, false);
        assert!(unknown.sender.is_none());
        assert_eq!(unknown.receiver, "CameraAgent");

        let known = MessageRecord::from_envelope(&envelope, true);
        assert_eq!(known.sender.as_deref(), Some("Drone1"));
    }

    #[test]
    fn test_memory_sink_latest() {
        let sink = MemorySink::new();
        let drone = Agent::drone(100.0, Position::default());

        update_or_log(&sink, &drone.snapshot());
        drone.lock().battery = Some(50.0);
        update_or_log(&sink, &drone.snapshot());

        assert_eq!(sink.agent_updates().len(), 2);
        assert_eq!(sink.latest("DroneAgent").unwrap().battery, Some(50.0));
        assert!(sink.latest("GuardAgent").is_none());
    }

    #[test]
    fn test_failures_are_swallowed() {
        let drone = Agent::drone(100.0, Position::default());
        let envelope = Envelope::new("CameraAgent", "DroneAgent", "inform", "");

        update_or_log(&FailingSink, &drone.snapshot());
        append_or_log(&FailingSink, &MessageRecord::from_envelope(&envelope, true));
    }
}
