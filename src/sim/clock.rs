//! Simulation clock: fixed-period drain-and-dispatch loop.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::RwLock;
use tokio::time::{interval, MissedTickBehavior};

use crate::behavior::{run_handler, Handled, HandlerContext};
use crate::config::ContractNetConfig;
use crate::core::{AgentRegistry, MessageChannel};
use crate::error::{Error, Result};
use crate::persistence::{append_or_log, update_or_log, MessageRecord, PersistenceSink};
use crate::protocol::{Envelope, Voter};

use super::scheduler::DelayedTaskScheduler;

/// What happened to one drained envelope.
#[derive(Debug)]
pub enum Dispatch {
    Delivered(Vec<Envelope>),
    /// No agent is registered under the receiver name.
    Unroutable,
    /// The receiver exists but takes no messages.
    NoHandler,
    /// The handler returned an error or panicked.
    Failed(String),
}

/// Counters for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TickReport {
    pub drained: usize,
    pub delivered: usize,
    pub unroutable: usize,
    pub no_handler: usize,
    pub failed: usize,
    pub emitted: usize,
}

impl fmt::Display for TickReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "drained={} delivered={} unroutable={} no_handler={} failed={} emitted={}",
            self.drained, self.delivered, self.unroutable, self.no_handler, self.failed, self.emitted
        )
    }
}

/// Drives the simulation in discrete ticks.
pub struct SimulationClock {
    channel: Arc<MessageChannel>,
    registry: Arc<AgentRegistry>,
    scheduler: DelayedTaskScheduler,
    voter: Arc<Voter>,
    sink: Arc<dyn PersistenceSink>,
    contract_net: ContractNetConfig,
    period: Duration,
    running: Arc<RwLock<bool>>,
    /// Set by `stop`; sticky, so a stop issued before `run` starts still counts.
    stop_requested: AtomicBool,
}

impl SimulationClock {
    pub fn new(
        channel: Arc<MessageChannel>,
        registry: Arc<AgentRegistry>,
        scheduler: DelayedTaskScheduler,
        voter: Arc<Voter>,
        sink: Arc<dyn PersistenceSink>,
        contract_net: ContractNetConfig,
        period: Duration,
    ) -> Self {
        Self {
            channel,
            registry,
            scheduler,
            voter,
            sink,
            contract_net,
            period,
            running: Arc::new(RwLock::new(false)),
            stop_requested: AtomicBool::new(false),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Drain the channel once and dispatch every envelope.
    ///
    /// Envelopes emitted by handlers are enqueued after the whole batch, so
    /// they are seen at the next tick at the earliest.
    pub fn tick(&self) -> TickReport {
        let batch = self.channel.drain_all();
        let mut report = TickReport {
            drained: batch.len(),
            ..TickReport::default()
        };
        let mut outgoing = Vec::new();

        for envelope in &batch {
            match self.dispatch(envelope) {
                Dispatch::Delivered(emitted) => {
                    report.delivered += 1;
                    report.emitted += emitted.len();
                    outgoing.extend(emitted);
                }
                Dispatch::Unroutable => {
                    report.unroutable += 1;
                    tracing::debug!(
                        "Dropped {} from {}: no agent named {}",
                        envelope.performative(),
                        envelope.sender(),
                        envelope.receiver()
                    );
                }
                Dispatch::NoHandler => {
                    report.no_handler += 1;
                    tracing::debug!("{} takes no messages, dropped {}", envelope.receiver(), envelope.id());
                }
                Dispatch::Failed(reason) => {
                    report.failed += 1;
                    tracing::error!(
                        "Handler for {} failed on {} from {}: {}",
                        envelope.receiver(),
                        envelope.performative(),
                        envelope.sender(),
                        reason
                    );
                }
            }
        }

        self.channel.enqueue_all(outgoing);
        if report.drained > 0 {
            tracing::trace!("Tick: {}", report);
        }
        report
    }

    /// Resolve and run the receiver's handler for one envelope.
    pub fn dispatch(&self, envelope: &Envelope) -> Dispatch {
        let Some(entry) = self.registry.entry(envelope.receiver()) else {
            return Dispatch::Unroutable;
        };
        let Some(handler) = entry.handler else {
            return Dispatch::NoHandler;
        };

        let ctx = HandlerContext {
            scheduler: &self.scheduler,
            voter: &self.voter,
            bid_factor: self.contract_net.bid_factor,
            task_delay: self.contract_net.task_delay(),
        };

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            run_handler(handler, &entry.agent, envelope, &ctx)
        }));

        match outcome {
            Ok(Ok(Handled { emitted, snapshot })) => {
                tracing::debug!(
                    "{} ({}): {}",
                    envelope.sender(),
                    envelope.performative(),
                    envelope.content()
                );
                update_or_log(self.sink.as_ref(), &snapshot);
                let record =
                    MessageRecord::from_envelope(envelope, self.registry.contains(envelope.sender()));
                append_or_log(self.sink.as_ref(), &record);
                Dispatch::Delivered(emitted)
            }
            Ok(Err(e)) => Dispatch::Failed(e.to_string()),
            Err(panic) => Dispatch::Failed(panic_message(panic.as_ref())),
        }
    }

    /// Tick every period until [`stop`](Self::stop) is called.
    ///
    /// Returns at once if a stop was already requested.
    pub async fn run(&self) -> Result<()> {
        {
            let mut running = self.running.write().await;
            if *running {
                return Err(Error::Other("Simulation clock already running".to_string()));
            }
            if self.stop_requested.load(Ordering::SeqCst) {
                tracing::info!("Simulation clock stopped before it started");
                return Ok(());
            }
            *running = true;
        }

        tracing::info!("Simulation clock started ({:?} per tick)", self.period);

        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if self.stop_requested.load(Ordering::SeqCst) {
                break;
            }
            self.tick();
        }

        *self.running.write().await = false;
        let cancelled = self.scheduler.cancel_all();
        tracing::info!("Simulation clock stopped ({} pending tasks cancelled)", cancelled);
        Ok(())
    }

    pub async fn stop(&self) {
        self.stop_requested.store(true, Ordering::SeqCst);
    }

    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    /// Number of armed delayed tasks.
    pub fn pending_tasks(&self) -> usize {
        self.scheduler.pending_count()
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked".to_string()
    }
}
