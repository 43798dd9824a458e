//! Simulation runtime: clock, delayed tasks and their assembly.

pub mod clock;
pub mod scheduler;

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::config::Settings;
use crate::core::{AgentRegistry, MessageChannel};
use crate::error::Result;
use crate::persistence::{default_db_path, update_or_log, NullSink, PersistenceSink, SqliteSink};
use crate::protocol::Voter;

pub use clock::{Dispatch, SimulationClock, TickReport};
pub use scheduler::{DelayedTaskHandle, DelayedTaskScheduler};

/// Open the record store the settings ask for.
pub fn open_sink(settings: &Settings) -> Result<Arc<dyn PersistenceSink>> {
    if !settings.persistence.enabled {
        tracing::info!("Persistence disabled, records are not kept");
        return Ok(Arc::new(NullSink));
    }
    let path = match &settings.persistence.db_path {
        Some(path) => path.clone(),
        None => default_db_path()?,
    };
    let sink = SqliteSink::open(&path)?;
    tracing::info!("Recording to {}", path.display());
    Ok(Arc::new(sink))
}

/// Everything one running simulation shares.
#[derive(Clone)]
pub struct Simulation {
    channel: Arc<MessageChannel>,
    registry: Arc<AgentRegistry>,
    sink: Arc<dyn PersistenceSink>,
    clock: Arc<SimulationClock>,
}

impl Simulation {
    /// Standard four-agent simulation recording to `sink`.
    pub fn new(settings: &Settings, sink: Arc<dyn PersistenceSink>) -> Self {
        Self::with_registry(settings, AgentRegistry::standard(settings), sink)
    }

    pub fn with_registry(
        settings: &Settings,
        registry: AgentRegistry,
        sink: Arc<dyn PersistenceSink>,
    ) -> Self {
        let channel = Arc::new(MessageChannel::new());
        let registry = Arc::new(registry);
        let scheduler = DelayedTaskScheduler::new(sink.clone());
        let clock = Arc::new(SimulationClock::new(
            channel.clone(),
            registry.clone(),
            scheduler,
            Arc::new(Voter::new(settings.vote.seed)),
            sink.clone(),
            settings.contract_net.clone(),
            settings.clock.tick_interval(),
        ));

        Self {
            channel,
            registry,
            sink,
            clock,
        }
    }

    /// Build from settings, opening the configured sink.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self::new(settings, open_sink(settings)?))
    }

    pub fn channel(&self) -> &Arc<MessageChannel> {
        &self.channel
    }

    pub fn registry(&self) -> &Arc<AgentRegistry> {
        &self.registry
    }

    pub fn clock(&self) -> &Arc<SimulationClock> {
        &self.clock
    }

    /// Write every agent's starting snapshot to the sink.
    pub fn record_initial_state(&self) {
        for snapshot in self.registry.snapshots() {
            update_or_log(self.sink.as_ref(), &snapshot);
        }
        tracing::debug!("Recorded initial state of {} agents", self.registry.len());
    }

    /// Start the clock loop on the runtime.
    pub fn spawn(&self) -> JoinHandle<Result<()>> {
        let clock = self.clock.clone();
        tokio::spawn(async move { clock.run().await })
    }

    pub async fn stop(&self) {
        self.clock.stop().await;
    }
}
