//! Hyperedge repository port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::errors::DomainResult;
use crate::domain::models::{
    CausalHyperedge, FeedbackSignal, HyperedgeId, HyperedgeNodes, PatternId,
};

/// Storage for the causal hyperedge graph.
///
/// Several builders, in this process or others, may share one backend.
/// `accumulate` must therefore apply its increment atomically in storage;
/// the builder's per-id lock only orders writers within a single process.
#[async_trait]
pub trait HyperedgeRepository: Send + Sync {
    async fn get(&self, id: &HyperedgeId) -> DomainResult<Option<CausalHyperedge>>;

    /// Insert or replace a hyperedge.
    async fn save(&self, hyperedge: &CausalHyperedge) -> DomainResult<()>;

    /// Fold one signal into the hyperedge for `nodes`, creating it with an
    /// empty accumulator first if absent. Returns the stored result.
    async fn accumulate(
        &self,
        nodes: &HyperedgeNodes,
        signal: FeedbackSignal,
        at: DateTime<Utc>,
    ) -> DomainResult<CausalHyperedge>;

    /// Hyperedges in which the given pattern participates.
    async fn list_for_pattern(&self, pattern_id: &PatternId)
        -> DomainResult<Vec<CausalHyperedge>>;

    /// All hyperedges ordered by mean signal, then by feedback count, highest
    /// first.
    async fn list_top(&self, limit: usize) -> DomainResult<Vec<CausalHyperedge>>;
}
