//! Centralized event construction helpers.
//!
//! All event construction goes through these helpers so the envelope
//! defaults (fresh id, sequence 0, current timestamp) live in one place.

use chrono::Utc;
use uuid::Uuid;

use super::event_bus::{EventId, EventPayload, EventSeverity, ReasoningEvent, SequenceNumber};
use crate::domain::models::{FeedbackSignal, HyperedgeId, HyperedgeWeight, TrajectoryId};

/// Reason string carried by skip events for incomplete responses.
pub const INCOMPLETE_RESPONSE: &str = "incomplete-response";

/// Build a `ReasoningEvent` with standard defaults.
///
/// Sequence is set to 0 (assigned by EventBus on publish).
pub fn make_event(severity: EventSeverity, payload: EventPayload) -> ReasoningEvent {
    ReasoningEvent {
        id: EventId::new(),
        sequence: SequenceNumber(0),
        timestamp: Utc::now(),
        severity,
        payload,
    }
}

pub fn feedback_received(
    feedback_id: Uuid,
    trajectory_id: TrajectoryId,
    signal: FeedbackSignal,
) -> ReasoningEvent {
    make_event(
        EventSeverity::Info,
        EventPayload::FeedbackReceived {
            feedback_id,
            trajectory_id,
            signal,
        },
    )
}

/// Warning-level event for feedback that could not be learned from.
pub fn hyperedge_skipped(trajectory_id: TrajectoryId, had_response_field: bool) -> ReasoningEvent {
    make_event(
        EventSeverity::Warning,
        EventPayload::HyperedgeSkipped {
            trajectory_id,
            had_response_field,
            reason: INCOMPLETE_RESPONSE.to_string(),
        },
    )
}

pub fn hyperedge_updated(
    hyperedge_id: HyperedgeId,
    weight: HyperedgeWeight,
    trajectory_id: TrajectoryId,
) -> ReasoningEvent {
    make_event(
        EventSeverity::Info,
        EventPayload::HyperedgeUpdated {
            hyperedge_id,
            count: weight.count,
            signed_sum: weight.signed_sum,
            trajectory_id,
        },
    )
}
