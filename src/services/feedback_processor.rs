//! Feedback ingestion.
//!
//! Resolves the trajectory a feedback event refers to, consults the
//! degradation guard, and either learns from it through the hyperedge builder
//! or records a skip. A trajectory without a complete response is a normal,
//! successful outcome, not an error.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{instrument, warn};

use super::degradation_guard::{DegradationGuard, Eligibility};
use super::event_bus::{emit_best_effort, EventEmitter};
use super::event_factory;
use super::hyperedge_builder::HyperedgeBuilder;
use super::trajectory_store::TrajectoryStore;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Feedback, HyperedgeId, HyperedgeWeight, TrajectoryId};

/// What happened to a piece of feedback.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedbackOutcome {
    /// The signal was folded into a hyperedge.
    Learned {
        hyperedge_id: HyperedgeId,
        weight: HyperedgeWeight,
    },
    /// The trajectory had no complete response; nothing was learned.
    Skipped { had_response_field: bool },
}

impl FeedbackOutcome {
    pub fn is_learned(&self) -> bool {
        matches!(self, Self::Learned { .. })
    }
}

pub struct FeedbackProcessor {
    store: Arc<TrajectoryStore>,
    guard: DegradationGuard,
    builder: Arc<HyperedgeBuilder>,
    events: Arc<dyn EventEmitter>,
    batch_concurrency: usize,
}

impl FeedbackProcessor {
    pub fn new(
        store: Arc<TrajectoryStore>,
        builder: Arc<HyperedgeBuilder>,
        events: Arc<dyn EventEmitter>,
    ) -> Self {
        Self {
            store,
            guard: DegradationGuard::new(),
            builder,
            events,
            batch_concurrency: 8,
        }
    }

    pub fn with_batch_concurrency(mut self, limit: usize) -> Self {
        self.batch_concurrency = limit.max(1);
        self
    }

    #[instrument(
        skip(self, feedback),
        fields(feedback_id = %feedback.id, trajectory_id = %feedback.trajectory_id)
    )]
    pub async fn provide_feedback(&self, feedback: Feedback) -> DomainResult<FeedbackOutcome> {
        let trajectory_id = TrajectoryId::parse(&feedback.trajectory_id)?;
        feedback.signal.validate().map_err(DomainError::ValidationFailed)?;

        let resolved = self.store.resolve(&trajectory_id).await?;
        let trajectory = resolved.trajectory;

        emit_best_effort(
            self.events.as_ref(),
            event_factory::feedback_received(feedback.id, trajectory_id, feedback.signal),
        );

        let eligible = match self.guard.check_eligible(&trajectory) {
            Eligibility::Eligible(eligible) => eligible,
            Eligibility::Skip(skip) => {
                warn!(
                    trajectory_id = %trajectory_id,
                    had_response_field = skip.had_response_field,
                    tier = ?resolved.tier,
                    reason = skip.reason.as_str(),
                    "skipping hyperedge update: trajectory has no complete response"
                );
                emit_best_effort(
                    self.events.as_ref(),
                    event_factory::hyperedge_skipped(trajectory_id, skip.had_response_field),
                );
                return Ok(FeedbackOutcome::Skipped {
                    had_response_field: skip.had_response_field,
                });
            }
        };

        // Store the canonical id so the record joins its trajectory. The save
        // is idempotent, so a caller may retry after a failed hyperedge update.
        let record = Feedback {
            trajectory_id: trajectory_id.to_string(),
            ..feedback
        };
        let repository = self.store.repository();
        self.store
            .retry_policy()
            .execute("save_feedback", || repository.save_feedback(&record))
            .await?;

        let hyperedge = self.builder.apply(&eligible, record.signal).await?;
        Ok(FeedbackOutcome::Learned {
            hyperedge_id: hyperedge.id,
            weight: hyperedge.weight,
        })
    }

    /// Process independent feedback concurrently. Results come back in input
    /// order, one per feedback.
    pub async fn provide_feedback_batch(
        &self,
        feedback: Vec<Feedback>,
    ) -> Vec<DomainResult<FeedbackOutcome>> {
        stream::iter(feedback)
            .map(|f| self.provide_feedback(f))
            .buffered(self.batch_concurrency)
            .collect()
            .await
    }
}
