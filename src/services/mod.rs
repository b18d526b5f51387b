//! Service layer: trajectory storage, feedback ingestion and hyperedge
//! learning, plus the event bus they report through.

pub mod degradation_guard;
pub mod event_bus;
pub mod event_factory;
pub mod event_sink;
pub mod feedback_processor;
pub mod hyperedge_builder;
pub mod reasoning_bank;
pub mod storage_retry;
pub mod trajectory_store;

pub use degradation_guard::{
    DegradationGuard, Eligibility, EligibleTrajectory, SkipKind, SkipReason,
};
pub use event_bus::{
    emit_best_effort, EventBus, EventBusConfig, EventEmitter, EventId, EventPayload, EventSeverity,
    ReasoningEvent, SequenceNumber,
};
pub use event_sink::{EventSink, EventSinkError, TracingEventSink};
pub use feedback_processor::{FeedbackOutcome, FeedbackProcessor};
pub use hyperedge_builder::HyperedgeBuilder;
pub use reasoning_bank::ReasoningBank;
pub use storage_retry::StorageRetryPolicy;
pub use trajectory_store::{ResolvedTrajectory, TrajectoryStore, TrajectoryTier};
