//! EventBus service for reasoning-bank lifecycle events.
//!
//! Provides a broadcast-based, fire-and-forget event system with sequence
//! numbering and an optional forwarding sink. Publishing never blocks and
//! never fails: slow subscribers lose older events and sink failures are
//! logged at debug level and dropped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

use super::event_sink::EventSink;
use crate::domain::models::{EventsConfig, FeedbackSignal, HyperedgeId, TrajectoryId};

/// Unique identifier for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub Uuid);

impl EventId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonically increasing sequence number assigned by EventBus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SequenceNumber(pub u64);

impl std::fmt::Display for SequenceNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Event severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for EventSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Event envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningEvent {
    pub id: EventId,
    pub sequence: SequenceNumber,
    pub timestamp: DateTime<Utc>,
    pub severity: EventSeverity,
    pub payload: EventPayload,
}

impl ReasoningEvent {
    pub fn kind(&self) -> &'static str {
        self.payload.kind()
    }

    /// Trajectory the event concerns.
    pub fn trajectory_id(&self) -> TrajectoryId {
        match &self.payload {
            EventPayload::FeedbackReceived { trajectory_id, .. }
            | EventPayload::HyperedgeSkipped { trajectory_id, .. }
            | EventPayload::HyperedgeUpdated { trajectory_id, .. } => *trajectory_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum EventPayload {
    #[serde(rename = "feedback.received")]
    FeedbackReceived {
        feedback_id: Uuid,
        trajectory_id: TrajectoryId,
        signal: FeedbackSignal,
    },
    #[serde(rename = "hyperedge.skipped")]
    HyperedgeSkipped {
        trajectory_id: TrajectoryId,
        had_response_field: bool,
        reason: String,
    },
    #[serde(rename = "hyperedge.updated")]
    HyperedgeUpdated {
        hyperedge_id: HyperedgeId,
        count: u64,
        signed_sum: f64,
        trajectory_id: TrajectoryId,
    },
}

impl EventPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::FeedbackReceived { .. } => "feedback.received",
            Self::HyperedgeSkipped { .. } => "hyperedge.skipped",
            Self::HyperedgeUpdated { .. } => "hyperedge.updated",
        }
    }
}

/// Fire-and-forget event emission.
///
/// Implementations must not block. Callers go through [`emit_best_effort`],
/// which also contains panics, so an implementation that misbehaves cannot
/// fail the code that emitted the event.
pub trait EventEmitter: Send + Sync {
    fn emit(&self, event: ReasoningEvent);
}

/// Emit an event, swallowing any failure of the emitter.
pub fn emit_best_effort(emitter: &dyn EventEmitter, event: ReasoningEvent) {
    let kind = event.kind();
    if catch_unwind(AssertUnwindSafe(|| emitter.emit(event))).is_err() {
        tracing::debug!(kind, "event emitter panicked; event dropped");
    }
}

/// Configuration for the EventBus.
#[derive(Debug, Clone)]
pub struct EventBusConfig {
    /// Channel capacity for the broadcast channel.
    pub channel_capacity: usize,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
        }
    }
}

impl From<&EventsConfig> for EventBusConfig {
    fn from(config: &EventsConfig) -> Self {
        Self {
            channel_capacity: config.channel_capacity.max(1),
        }
    }
}

/// Central event bus for broadcasting events to multiple consumers.
pub struct EventBus {
    sender: broadcast::Sender<ReasoningEvent>,
    sequence: AtomicU64,
    sink: Option<Arc<dyn EventSink>>,
}

impl EventBus {
    /// Create a new EventBus with the given configuration.
    pub fn new(config: EventBusConfig) -> Self {
        let (sender, _) = broadcast::channel(config.channel_capacity.max(1));
        Self {
            sender,
            sequence: AtomicU64::new(0),
            sink: None,
        }
    }

    /// Forward every published event to an external sink.
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Publish an event.
    pub fn publish(&self, mut event: ReasoningEvent) {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        event.sequence = SequenceNumber(seq);

        if let Some(ref sink) = self.sink {
            match catch_unwind(AssertUnwindSafe(|| sink.forward(&event))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::debug!(kind = event.kind(), error = %e, "event sink failed"),
                Err(_) => tracing::debug!(kind = event.kind(), "event sink panicked"),
            }
        }

        // No subscribers is not an error.
        let _ = self.sender.send(event);
    }

    /// Subscribe to the event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<ReasoningEvent> {
        self.sender.subscribe()
    }

    /// Get the current sequence number.
    pub fn current_sequence(&self) -> SequenceNumber {
        SequenceNumber(self.sequence.load(Ordering::SeqCst))
    }

    /// Get the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl EventEmitter for EventBus {
    fn emit(&self, event: ReasoningEvent) {
        self.publish(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::event_factory;
    use crate::services::event_sink::EventSinkError;
    use std::sync::Mutex;

    struct FailingSink;

    impl EventSink for FailingSink {
        fn forward(&self, _event: &ReasoningEvent) -> Result<(), EventSinkError> {
            Err(EventSinkError::Unavailable("collector offline".into()))
        }
    }

    struct PanickingSink;

    impl EventSink for PanickingSink {
        fn forward(&self, _event: &ReasoningEvent) -> Result<(), EventSinkError> {
            panic!("sink exploded");
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        kinds: Mutex<Vec<&'static str>>,
    }

    impl EventSink for RecordingSink {
        fn forward(&self, event: &ReasoningEvent) -> Result<(), EventSinkError> {
            self.kinds.lock().unwrap().push(event.kind());
            Ok(())
        }
    }

    fn skipped() -> ReasoningEvent {
        event_factory::hyperedge_skipped(TrajectoryId::new(), false)
    }

    #[tokio::test]
    async fn test_event_bus_sequence_assignment() {
        let bus = EventBus::new(EventBusConfig::default());
        assert_eq!(bus.current_sequence().0, 0);

        let mut rx = bus.subscribe();

        bus.publish(skipped());
        let event1 = rx.recv().await.unwrap();
        assert_eq!(event1.sequence.0, 0);

        bus.publish(skipped());
        let event2 = rx.recv().await.unwrap();
        assert_eq!(event2.sequence.0, 1);

        assert_eq!(bus.current_sequence().0, 2);
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::new(EventBusConfig::default());
        assert_eq!(bus.subscriber_count(), 0);
        bus.publish(skipped());
        assert_eq!(bus.current_sequence().0, 1);
    }

    #[tokio::test]
    async fn test_sink_failures_are_swallowed() {
        let bus = EventBus::new(EventBusConfig::default()).with_sink(Arc::new(FailingSink));
        let mut rx = bus.subscribe();
        bus.publish(skipped());
        assert_eq!(rx.recv().await.unwrap().kind(), "hyperedge.skipped");

        let bus = EventBus::new(EventBusConfig::default()).with_sink(Arc::new(PanickingSink));
        let mut rx = bus.subscribe();
        bus.publish(skipped());
        assert_eq!(rx.recv().await.unwrap().kind(), "hyperedge.skipped");
    }

    #[test]
    fn test_sink_receives_events() {
        let sink = Arc::new(RecordingSink::default());
        let bus = EventBus::new(EventBusConfig::default()).with_sink(sink.clone());
        bus.publish(skipped());
        bus.publish(event_factory::feedback_received(
            Uuid::new_v4(),
            TrajectoryId::new(),
            FeedbackSignal::Positive,
        ));
        assert_eq!(
            *sink.kinds.lock().unwrap(),
            vec!["hyperedge.skipped", "feedback.received"]
        );
    }

    #[tokio::test]
    async fn test_lagging_subscriber_drops_old_events() {
        let bus = EventBus::new(EventBusConfig { channel_capacity: 2 });
        let mut rx = bus.subscribe();
        for _ in 0..5 {
            bus.publish(skipped());
        }
        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(3))
        ));
        assert_eq!(rx.recv().await.unwrap().sequence.0, 3);
    }

    #[test]
    fn test_emit_best_effort_contains_panics() {
        struct Exploding;
        impl EventEmitter for Exploding {
            fn emit(&self, _event: ReasoningEvent) {
                panic!("emitter exploded");
            }
        }
        emit_best_effort(&Exploding, skipped());
    }

    #[test]
    fn test_payload_wire_shape() {
        let trajectory_id = TrajectoryId::new();
        let event = event_factory::hyperedge_skipped(trajectory_id, true);
        let json = serde_json::to_value(&event.payload).unwrap();
        assert_eq!(json["type"], "hyperedge.skipped");
        assert_eq!(json["data"]["had_response_field"], true);
        assert_eq!(json["data"]["trajectory_id"], trajectory_id.to_string());
        assert_eq!(event.severity, EventSeverity::Warning);
    }
}
