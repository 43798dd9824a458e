//! Unbounded many-producer message channel drained by the simulation clock.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde::Serialize;

use crate::protocol::Envelope;

/// FIFO queue of envelopes shared by every producer and the single consumer.
///
/// `enqueue` never blocks for longer than the queue lock and never fails;
/// there is no capacity limit. `drain_all` swaps the whole queue out under
/// the lock, so an envelope enqueued concurrently lands either in this
/// drain or, at the latest, in the next one.
#[derive(Debug, Default)]
pub struct MessageChannel {
    queue: Mutex<VecDeque<Envelope>>,
    enqueued: AtomicU64,
    drained: AtomicU64,
}

impl MessageChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue an envelope.
    pub fn enqueue(&self, envelope: Envelope) {
        tracing::trace!(
            "Enqueued {} {} -> {}",
            envelope.performative(),
            envelope.sender(),
            envelope.receiver()
        );
        self.queue.lock().push_back(envelope);
        self.enqueued.fetch_add(1, Ordering::Relaxed);
    }

    /// Enqueue several envelopes, keeping their order.
    pub fn enqueue_all(&self, envelopes: impl IntoIterator<Item = Envelope>) {
        let mut queue = self.queue.lock();
        let before = queue.len();
        queue.extend(envelopes);
        let added = (queue.len() - before) as u64;
        drop(queue);
        self.enqueued.fetch_add(added, Ordering::Relaxed);
    }

    /// Remove and return every envelope present, oldest first.
    pub fn drain_all(&self) -> Vec<Envelope> {
        let taken = std::mem::take(&mut *self.queue.lock());
        self.drained.fetch_add(taken.len() as u64, Ordering::Relaxed);
        taken.into()
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    pub fn stats(&self) -> ChannelStats {
        ChannelStats {
            pending: self.len(),
            enqueued: self.enqueued.load(Ordering::Relaxed),
            drained: self.drained.load(Ordering::Relaxed),
        }
    }
}

/// Channel statistics.
#[derive(Debug, Clone, Serialize)]
pub struct ChannelStats {
    pub pending: usize,
    pub enqueued: u64,
    pub drained: u64,
}

impl std::fmt::Display for ChannelStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Channel Stats:")?;
        writeln!(f, "  Pending:  {}", self.pending)?;
        writeln!(f, "  Enqueued: {}", self.enqueued)?;
        write!(f, "  Drained:  {}", self.drained)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn envelope(content: &str) -> Envelope {
        Envelope::new("CameraAgent", "DroneAgent", "inform", content)
    }

    #[test]
    fn test_drain_is_fifo() {
        let channel = MessageChannel::new();
        channel.enqueue(envelope("a"));
        channel.enqueue(envelope("b"));
        channel.enqueue_all(vec![envelope("c"), envelope("d")]);

        let drained: Vec<String> = channel
            .drain_all()
            .iter()
            .map(|e| e.content().to_string())
            .collect();
        assert_eq!(drained, vec!["a", "b", "c", "d"]);
        assert!(channel.is_empty());
        assert!(channel.drain_all().is_empty());
    }

    #[test]
    fn test_stats() {
        let channel = MessageChannel::new();
        channel.enqueue(envelope("a"));
        channel.enqueue(envelope("b"));
        channel.drain_all();
        channel.enqueue(envelope("c"));

        let stats = channel.stats();
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.enqueued, 3);
        assert_eq!(stats.drained, 2);
        assert!(stats.to_string().contains("Pending:  1"));
    }

    #[test]
    fn test_concurrent_producers_lose_nothing() {
        let channel = Arc::new(MessageChannel::new());
        let producers: Vec<_> = (0..8)
            .map(|p| {
                let channel = channel.clone();
                std::thread::spawn(move || {
                    for i in 0..250 {
                        channel.enqueue(envelope(&format!("{}-{}", p, i)));
                    }
                })
            })
            .collect();

        let mut received = Vec::new();
        while received.len() < 2000 {
            received.extend(channel.drain_all());
            std::thread::yield_now();
        }
        for producer in producers {
            producer.join().unwrap();
        }
        received.extend(channel.drain_all());

        assert_eq!(received.len(), 2000);
        // Per-producer order survives interleaving.
        for p in 0..8 {
            let prefix = format!("{}-", p);
            let seq: Vec<usize> = received
                .iter()
                .filter_map(|e| e.content().strip_prefix(&prefix))
                .map(|n| n.parse().unwrap())
                .collect();
            assert_eq!(seq, (0..250).collect::<Vec<_>>());
        }
    }
}
