//! One-shot delayed tasks that mutate an agent after a fixed delay.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::AbortHandle;
use tokio::time::Instant;

use crate::agent::{AgentSnapshot, AgentState, SharedAgent};
use crate::persistence::{update_or_log, PersistenceSink};

/// Handle to an armed task.
#[derive(Debug, Clone)]
pub struct DelayedTaskHandle {
    id: String,
    agent: &'static str,
    cancelled: Arc<AtomicBool>,
    abort: AbortHandle,
}

impl DelayedTaskHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Routing name of the agent the effect applies to.
    pub fn agent(&self) -> &'static str {
        self.agent
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Arms fire-once timers on the tokio runtime.
///
/// A fired effect runs while holding the target agent's lock, the same lock
/// envelope handlers take, and the resulting snapshot goes to the sink.
#[derive(Clone)]
pub struct DelayedTaskScheduler {
    sink: Arc<dyn PersistenceSink>,
    pending: Arc<Mutex<HashMap<String, DelayedTaskHandle>>>,
}

impl DelayedTaskScheduler {
    pub fn new(sink: Arc<dyn PersistenceSink>) -> Self {
        Self {
            sink,
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Run `effect` on `agent` once `delay` has elapsed.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F>(&self, agent: SharedAgent, delay: Duration, effect: F) -> DelayedTaskHandle
    where
        F: FnOnce(&mut AgentState) + Send + 'static,
    {
        let id = ulid::Ulid::new().to_string();
        let cancelled = Arc::new(AtomicBool::new(false));
        let fire_at = Instant::now() + delay;
        let agent_name = agent.name();

        // Held until the handle is registered, so a zero-delay task cannot
        // try to deregister itself first.
        let mut pending = self.pending.lock();

        let task_id = id.clone();
        let flag = cancelled.clone();
        let sink = self.sink.clone();
        let registry = self.pending.clone();
        let join = tokio::spawn(async move {
            tokio::time::sleep_until(fire_at).await;

            let snapshot = {
                let mut state = agent.lock();
                if flag.load(Ordering::SeqCst) {
                    return;
                }
                effect(&mut state);
                if state.pending_task.as_ref().map(|t| t.id()) == Some(task_id.as_str()) {
                    state.pending_task = None;
                }
                AgentSnapshot::capture(agent.role(), &state)
            };

            registry.lock().remove(&task_id);
            tracing::debug!("Delayed task {} fired for {}", task_id, agent.name());
            update_or_log(sink.as_ref(), &snapshot);
        });

        let handle = DelayedTaskHandle {
            id: id.clone(),
            agent: agent_name,
            cancelled,
            abort: join.abort_handle(),
        };
        pending.insert(id, handle.clone());

        tracing::debug!(
            "Scheduled delayed task {} for {} in {:?}",
            handle.id,
            agent_name,
            delay
        );
        handle
    }

    /// Cancel an armed task. Returns false if it already fired or was cancelled.
    pub fn cancel(&self, handle: &DelayedTaskHandle) -> bool {
        let removed = self.pending.lock().remove(&handle.id);
        handle.cancelled.store(true, Ordering::SeqCst);
        handle.abort.abort();

        if removed.is_some() {
            tracing::debug!("Cancelled delayed task {} for {}", handle.id, handle.agent);
            true
        } else {
            false
        }
    }

    /// Cancel every armed task.
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<DelayedTaskHandle> = self.pending.lock().drain().map(|(_, h)| h).collect();
        for handle in &drained {
            handle.cancelled.store(true, Ordering::SeqCst);
            handle.abort.abort();
        }
        drained.len()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }
}

impl std::fmt::Debug for DelayedTaskScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DelayedTaskScheduler")
            .field("pending", &self.pending_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{Agent, Position, Status};
    use crate::persistence::MemorySink;

    fn scheduler_with_sink() -> (DelayedTaskScheduler, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        (DelayedTaskScheduler::new(sink.clone()), sink)
    }

    #[tokio::test(start_paused = true)]
    async fn test_effect_fires_after_delay() {
        let (scheduler, sink) = scheduler_with_sink();
        let drone = Agent::drone(100.0, Position::default());

        scheduler.schedule(drone.clone(), Duration::from_secs(2), |state| {
            state.status = Status::TaskCompleted;
        });
        assert_eq!(scheduler.pending_count(), 1);

        tokio::time::sleep(Duration::from_millis(1999)).await;
        assert_eq!(drone.status(), Status::Idle);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(drone.status(), Status::TaskCompleted);
        assert_eq!(scheduler.pending_count(), 0);
        assert_eq!(sink.latest("DroneAgent").unwrap().status, "Task Completed");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_task_never_fires() {
        let (scheduler, sink) = scheduler_with_sink();
        let drone = Agent::drone(100.0, Position::default());

        let handle = scheduler.schedule(drone.clone(), Duration::from_secs(2), |state| {
            state.status = Status::TaskCompleted;
        });
        assert!(scheduler.cancel(&handle));
        assert!(handle.is_cancelled());
        assert!(!scheduler.cancel(&handle));

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(drone.status(), Status::Idle);
        assert!(sink.agent_updates().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_all() {
        let (scheduler, _sink) = scheduler_with_sink();
        let drone = Agent::drone(100.0, Position::default());

        for _ in 0..3 {
            scheduler.schedule(drone.clone(), Duration::from_secs(1), |state| {
                state.status = Status::TaskCompleted;
            });
        }
        assert_eq!(scheduler.cancel_all(), 3);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(drone.status(), Status::Idle);
        assert_eq!(scheduler.pending_count(), 0);
    }
}
