//! EventSink trait for forwarding events to an external collector.

use thiserror::Error;

use super::event_bus::{EventSeverity, ReasoningEvent};

/// Error type for EventSink operations.
#[derive(Debug, Error)]
pub enum EventSinkError {
    #[error("Sink unavailable: {0}")]
    Unavailable(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Destination for published events.
///
/// Called synchronously on the publishing path, so implementations should
/// hand the event off rather than do I/O inline. Errors are logged by the bus
/// and never reach the publisher.
pub trait EventSink: Send + Sync {
    fn forward(&self, event: &ReasoningEvent) -> Result<(), EventSinkError>;
}

/// Sink that writes every event as a structured tracing record.
#[derive(Debug, Clone, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn forward(&self, event: &ReasoningEvent) -> Result<(), EventSinkError> {
        let payload = serde_json::to_string(&event.payload)
            .map_err(|e| EventSinkError::SerializationError(e.to_string()))?;

        match event.severity {
            EventSeverity::Warning => tracing::warn!(
                target: "reasoning_bank::events",
                kind = event.kind(),
                sequence = event.sequence.0,
                %payload,
                "event"
            ),
            EventSeverity::Error => tracing::error!(
                target: "reasoning_bank::events",
                kind = event.kind(),
                sequence = event.sequence.0,
                %payload,
                "event"
            ),
            _ => tracing::info!(
                target: "reasoning_bank::events",
                kind = event.kind(),
                sequence = event.sequence.0,
                %payload,
                "event"
            ),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::TrajectoryId;
    use crate::services::event_factory;

    #[test]
    fn test_tracing_sink_accepts_all_kinds() {
        let sink = TracingEventSink;
        let id = TrajectoryId::new();
        assert!(sink.forward(&event_factory::hyperedge_skipped(id, false)).is_ok());
    }
}
