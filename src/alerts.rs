//! Alert fan-out to push subscribers.
//!
//! Latch transitions are serialized to JSON frames and broadcast over a
//! tokio channel; the WebSocket handler holds one receiver per connected
//! subscriber. Delivery is fire-and-forget: the sampler does not wait for
//! acknowledgment, and an empty subscriber set is not an error. A slow
//! subscriber that overruns its buffer skips the missed frames and
//! continues with the newest ones.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

use crate::threshold::{LoadMetric, LoadTransition};

/// Logical event name for CPU load transitions.
pub const CPU_HIGH_LOAD_EVENT: &str = "cpu-high-load";
/// Logical event name for memory load transitions.
pub const MEMORY_HIGH_LOAD_EVENT: &str = "memory-high-load";

/// Wire shape of one alert frame.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct AlertFrame {
    event: &'static str,
    is_high: bool,
    timestamp: DateTime<Utc>,
}

/// Maps a metric to its logical event name.
pub fn event_name(metric: LoadMetric) -> &'static str {
    match metric {
        LoadMetric::Cpu => CPU_HIGH_LOAD_EVENT,
        LoadMetric::Memory => MEMORY_HIGH_LOAD_EVENT,
    }
}

/// Broadcast channel carrying serialized alert frames.
pub struct AlertBus {
    tx: broadcast::Sender<String>,
}

impl AlertBus {
    /// Creates a bus whose subscribers each buffer up to `capacity` frames.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Registers a new subscriber. Frames published before this call are
    /// not replayed.
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }

    /// Number of currently connected subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Serializes a transition and hands it to every subscriber.
    ///
    /// Serialization failure propagates to the cycle supervisor; having no
    /// subscribers does not.
    pub fn publish(&self, transition: LoadTransition) -> Result<(), serde_json::Error> {
        let frame = AlertFrame {
            event: event_name(transition.metric),
            is_high: transition.is_high,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_string(&frame)?;

        if self.tx.send(json).is_err() {
            debug!(
                "no alert subscribers connected, {} event dropped",
                frame.event
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transition(metric: LoadMetric, is_high: bool) -> LoadTransition {
        LoadTransition { metric, is_high }
    }

    #[tokio::test]
    async fn test_publish_reaches_subscriber() {
        let bus = AlertBus::new(8);
        let mut rx = bus.subscribe();

        bus.publish(transition(LoadMetric::Cpu, true))
            .expect("publish should succeed");

        let frame = rx.recv().await.expect("frame should arrive");
        assert!(frame.contains("\"event\":\"cpu-high-load\""));
        assert!(frame.contains("\"isHigh\":true"));
        assert!(frame.contains("timestamp"));
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_ok() {
        let bus = AlertBus::new(8);
        assert!(bus.publish(transition(LoadMetric::Memory, true)).is_ok());
    }

    #[tokio::test]
    async fn test_each_subscriber_sees_every_frame() {
        let bus = AlertBus::new(8);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        bus.publish(transition(LoadMetric::Memory, true)).unwrap();
        bus.publish(transition(LoadMetric::Memory, false)).unwrap();

        for rx in [&mut rx1, &mut rx2] {
            let first = rx.recv().await.unwrap();
            assert!(first.contains("\"event\":\"memory-high-load\""));
            assert!(first.contains("\"isHigh\":true"));
            let second = rx.recv().await.unwrap();
            assert!(second.contains("\"isHigh\":false"));
        }
    }

    #[test]
    fn test_event_names() {
        assert_eq!(event_name(LoadMetric::Cpu), CPU_HIGH_LOAD_EVENT);
        assert_eq!(event_name(LoadMetric::Memory), MEMORY_HIGH_LOAD_EVENT);
    }
}
