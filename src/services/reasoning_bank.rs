//! Entry point for the agent pipeline.
//!
//! Wires the trajectory store, degradation guard, hyperedge builder and event
//! bus together behind a small API: record trajectories as they are produced,
//! feed back outcomes as they arrive, and query what has been learned.

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::broadcast;
use tracing::info;

use super::event_bus::{EventBus, EventBusConfig, EventEmitter, ReasoningEvent};
use super::event_sink::TracingEventSink;
use super::feedback_processor::{FeedbackOutcome, FeedbackProcessor};
use super::hyperedge_builder::HyperedgeBuilder;
use super::storage_retry::StorageRetryPolicy;
use super::trajectory_store::{ResolvedTrajectory, TrajectoryStore};
use crate::adapters::memory::InMemoryHyperedgeRepository;
use crate::adapters::sqlite::{
    initialize_from_config, SqliteHyperedgeRepository, SqliteTrajectoryRepository,
};
use crate::domain::errors::DomainResult;
use crate::domain::models::{
    CausalHyperedge, Config, Feedback, HyperedgeBackend, HyperedgeId, PatternId, Trajectory,
    TrajectoryId,
};
use crate::domain::ports::{HyperedgeRepository, TrajectoryRepository};

pub struct ReasoningBank {
    store: Arc<TrajectoryStore>,
    builder: Arc<HyperedgeBuilder>,
    processor: FeedbackProcessor,
    events: Arc<EventBus>,
}

impl ReasoningBank {
    /// Assemble from pre-built repositories and a bus.
    pub fn new(
        trajectories: Arc<dyn TrajectoryRepository>,
        hyperedges: Arc<dyn HyperedgeRepository>,
        events: Arc<EventBus>,
        config: &Config,
    ) -> Self {
        let retry = StorageRetryPolicy::from(&config.storage);
        let store = Arc::new(TrajectoryStore::with_config(
            trajectories,
            &config.trajectory_store,
            retry.clone(),
        ));
        let emitter: Arc<dyn EventEmitter> = events.clone();
        let builder =
            Arc::new(HyperedgeBuilder::new(hyperedges, emitter.clone()).with_retry(retry));
        let processor = FeedbackProcessor::new(store.clone(), builder.clone(), emitter)
            .with_batch_concurrency(config.feedback.batch_concurrency);

        Self {
            store,
            builder,
            processor,
            events,
        }
    }

    /// Open the database, apply migrations and wire every component from
    /// configuration. Events are also forwarded to tracing.
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let pool = initialize_from_config(&config.database)
            .await
            .context("Failed to initialize reasoning bank database")?;

        let hyperedges: Arc<dyn HyperedgeRepository> = match config.hyperedges.backend {
            HyperedgeBackend::Memory => Arc::new(InMemoryHyperedgeRepository::new()),
            HyperedgeBackend::Sqlite => Arc::new(SqliteHyperedgeRepository::new(pool.clone())),
        };
        let events = Arc::new(
            EventBus::new(EventBusConfig::from(&config.events))
                .with_sink(Arc::new(TracingEventSink)),
        );

        info!(
            database = %config.database.path,
            hyperedge_backend = ?config.hyperedges.backend,
            "reasoning bank ready"
        );

        Ok(Self::new(
            Arc::new(SqliteTrajectoryRepository::new(pool)),
            hyperedges,
            events,
            config,
        ))
    }

    /// Record a trajectory the moment it is produced, with its full response.
    pub async fn record_trajectory(&self, trajectory: Trajectory) -> DomainResult<TrajectoryId> {
        self.store.put(trajectory).await.map(|t| t.id)
    }

    pub async fn provide_feedback(&self, feedback: Feedback) -> DomainResult<FeedbackOutcome> {
        self.processor.provide_feedback(feedback).await
    }

    pub async fn provide_feedback_batch(
        &self,
        feedback: Vec<Feedback>,
    ) -> Vec<DomainResult<FeedbackOutcome>> {
        self.processor.provide_feedback_batch(feedback).await
    }

    pub async fn resolve_trajectory(&self, id: &TrajectoryId) -> DomainResult<ResolvedTrajectory> {
        self.store.resolve(id).await
    }

    /// Drop a trajectory from process memory, as a restart would.
    pub async fn evict_trajectory(&self, id: &TrajectoryId) {
        self.store.evict(id).await;
    }

    /// Feedback persisted for a trajectory, oldest first.
    pub async fn feedback_for(&self, id: &TrajectoryId) -> DomainResult<Vec<Feedback>> {
        self.store.repository().list_feedback(id).await
    }

    pub async fn hyperedge(&self, id: &HyperedgeId) -> DomainResult<Option<CausalHyperedge>> {
        self.builder.get(id).await
    }

    pub async fn hyperedges_for_pattern(
        &self,
        pattern_id: &PatternId,
    ) -> DomainResult<Vec<CausalHyperedge>> {
        self.builder.hyperedges_for_pattern(pattern_id).await
    }

    pub async fn top_hyperedges(&self, limit: usize) -> DomainResult<Vec<CausalHyperedge>> {
        self.builder.top_hyperedges(limit).await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReasoningEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{CausalInference, Pattern, Route};

    #[tokio::test]
    async fn test_from_config_with_sqlite_hyperedges_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.database.path = dir.path().join("bank.db").to_string_lossy().into_owned();
        config.hyperedges.backend = HyperedgeBackend::Sqlite;

        let trajectory = Trajectory::new(Route::PatternMatch).with_response(
            vec![Pattern::new("p1", "retry")],
            vec![CausalInference::new("c1", "timeout", "retry")],
        );

        let (trajectory_id, hyperedge_id) = {
            let bank = ReasoningBank::from_config(&config).await.unwrap();
            let id = bank.record_trajectory(trajectory).await.unwrap();
            match bank.provide_feedback(Feedback::positive(id.to_string())).await.unwrap() {
                FeedbackOutcome::Learned { hyperedge_id, .. } => (id, hyperedge_id),
                other => panic!("expected learned, got {other:?}"),
            }
        };

        let reopened = ReasoningBank::from_config(&config).await.unwrap();

        let edge = reopened.hyperedge(&hyperedge_id).await.unwrap().unwrap();
        assert_eq!(edge.weight.count, 1);
        assert_eq!(reopened.feedback_for(&trajectory_id).await.unwrap().len(), 1);

        // Only metadata survived the restart, so more feedback is skipped.
        let outcome = reopened
            .provide_feedback(Feedback::positive(trajectory_id.to_string()))
            .await
            .unwrap();
        assert_eq!(outcome, FeedbackOutcome::Skipped { had_response_field: false });
    }
}
