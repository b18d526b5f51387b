//! Causal hyperedge builder.
//!
//! Folds feedback on eligible trajectories into content-addressed hyperedges.
//! Updates to a given hyperedge id run under a keyed mutex, so concurrent
//! feedback on the same content is applied and reported in order while
//! unrelated hyperedges proceed in parallel. The increment itself is atomic
//! in the repository, which keeps totals exact when several builders share
//! one durable graph.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::degradation_guard::EligibleTrajectory;
use super::event_bus::{emit_best_effort, EventEmitter};
use super::event_factory;
use super::storage_retry::StorageRetryPolicy;
use crate::domain::errors::DomainResult;
use crate::domain::models::{
    CausalHyperedge, FeedbackSignal, HyperedgeId, HyperedgeNodes, PatternId, TrajectoryId,
};
use crate::domain::ports::HyperedgeRepository;

pub struct HyperedgeBuilder {
    repository: Arc<dyn HyperedgeRepository>,
    events: Arc<dyn EventEmitter>,
    retry: StorageRetryPolicy,
    locks: DashMap<HyperedgeId, Arc<Mutex<()>>>,
}

impl HyperedgeBuilder {
    pub fn new(repository: Arc<dyn HyperedgeRepository>, events: Arc<dyn EventEmitter>) -> Self {
        Self {
            repository,
            events,
            retry: StorageRetryPolicy::default(),
            locks: DashMap::new(),
        }
    }

    pub fn with_retry(mut self, retry: StorageRetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Create the hyperedge for this trajectory's content, or fold the signal
    /// into the existing one. Returns the deterministic id.
    pub async fn create_or_update_hyperedge(
        &self,
        eligible: &EligibleTrajectory<'_>,
        signal: FeedbackSignal,
    ) -> DomainResult<HyperedgeId> {
        self.apply(eligible, signal).await.map(|hyperedge| hyperedge.id)
    }

    /// Same as [`Self::create_or_update_hyperedge`] but hands back the updated
    /// hyperedge.
    pub(crate) async fn apply(
        &self,
        eligible: &EligibleTrajectory<'_>,
        signal: FeedbackSignal,
    ) -> DomainResult<CausalHyperedge> {
        let trajectory = eligible.trajectory();
        let nodes = HyperedgeNodes::new(
            trajectory.route,
            eligible.patterns().iter().map(|p| p.id.clone()),
            eligible.causal_inferences().iter().map(|c| c.id.clone()),
        );
        let id = nodes.id();

        let lock = self.lock_for(&id);
        let result = {
            let _held = lock.lock().await;
            self.accumulate_locked(&nodes, signal, trajectory.id).await
        };
        drop(lock);
        self.release_lock(&id);

        result
    }

    /// Caller must hold the lock for `nodes.id()`.
    async fn accumulate_locked(
        &self,
        nodes: &HyperedgeNodes,
        signal: FeedbackSignal,
        trajectory_id: TrajectoryId,
    ) -> DomainResult<CausalHyperedge> {
        let at = Utc::now();
        let hyperedge = self
            .retry
            .execute("accumulate_hyperedge", || {
                self.repository.accumulate(nodes, signal, at)
            })
            .await?;

        let created = hyperedge.weight.count == 1;

        if created {
            info!(
                hyperedge_id = %hyperedge.id,
                route = %hyperedge.nodes.route,
                patterns = hyperedge.nodes.patterns.len(),
                inferences = hyperedge.nodes.inferences.len(),
                route_only = hyperedge.nodes.is_route_only(),
                "created causal hyperedge"
            );
        } else {
            debug!(
                hyperedge_id = %hyperedge.id,
                count = hyperedge.weight.count,
                signed_sum = hyperedge.weight.signed_sum,
                "updated causal hyperedge"
            );
        }

        emit_best_effort(
            self.events.as_ref(),
            event_factory::hyperedge_updated(hyperedge.id.clone(), hyperedge.weight, trajectory_id),
        );

        Ok(hyperedge)
    }

    fn lock_for(&self, id: &HyperedgeId) -> Arc<Mutex<()>> {
        Arc::clone(self.locks.entry(id.clone()).or_default().value())
    }

    /// Drop the lock entry once nobody else holds or waits on it.
    fn release_lock(&self, id: &HyperedgeId) {
        self.locks.remove_if(id, |_, lock| Arc::strong_count(lock) == 1);
    }

    #[cfg(test)]
    fn lock_entries(&self) -> usize {
        self.locks.len()
    }

    pub async fn get(&self, id: &HyperedgeId) -> DomainResult<Option<CausalHyperedge>> {
        self.retry
            .execute("get_hyperedge", || self.repository.get(id))
            .await
    }

    /// Hyperedges that include the given pattern, most recently updated first.
    pub async fn hyperedges_for_pattern(
        &self,
        pattern_id: &PatternId,
    ) -> DomainResult<Vec<CausalHyperedge>> {
        self.retry
            .execute("list_hyperedges_for_pattern", || {
                self.repository.list_for_pattern(pattern_id)
            })
            .await
    }

    /// Best-rated hyperedges by mean signal, then feedback count.
    pub async fn top_hyperedges(&self, limit: usize) -> DomainResult<Vec<CausalHyperedge>> {
        self.retry
            .execute("list_top_hyperedges", || self.repository.list_top(limit))
            .await
    }
}
