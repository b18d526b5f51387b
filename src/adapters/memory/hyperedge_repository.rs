//! In-memory implementation of the HyperedgeRepository.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::errors::DomainResult;
use crate::domain::models::{
    CausalHyperedge, FeedbackSignal, HyperedgeId, HyperedgeNodes, PatternId,
};
use crate::domain::ports::HyperedgeRepository;

/// Process-local hyperedge graph. Contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct InMemoryHyperedgeRepository {
    edges: RwLock<HashMap<HyperedgeId, CausalHyperedge>>,
}

impl InMemoryHyperedgeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.edges.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.edges.read().await.is_empty()
    }
}

/// Mean signal descending, then count descending, then id for stability.
fn rank(a: &CausalHyperedge, b: &CausalHyperedge) -> Ordering {
    b.weight
        .mean()
        .total_cmp(&a.weight.mean())
        .then_with(|| b.weight.count.cmp(&a.weight.count))
        .then_with(|| a.id.cmp(&b.id))
}

#[async_trait]
impl HyperedgeRepository for InMemoryHyperedgeRepository {
    async fn get(&self, id: &HyperedgeId) -> DomainResult<Option<CausalHyperedge>> {
        Ok(self.edges.read().await.get(id).cloned())
    }

    async fn save(&self, hyperedge: &CausalHyperedge) -> DomainResult<()> {
        self.edges
            .write()
            .await
            .insert(hyperedge.id.clone(), hyperedge.clone());
        Ok(())
    }

    async fn accumulate(
        &self,
        nodes: &HyperedgeNodes,
        signal: FeedbackSignal,
        at: DateTime<Utc>,
    ) -> DomainResult<CausalHyperedge> {
        let mut edges = self.edges.write().await;
        let hyperedge = edges
            .entry(nodes.id())
            .or_insert_with(|| CausalHyperedge::new(nodes.clone()));
        hyperedge.accumulate(signal, at);
        Ok(hyperedge.clone())
    }

    async fn list_for_pattern(
        &self,
        pattern_id: &PatternId,
    ) -> DomainResult<Vec<CausalHyperedge>> {
        let edges = self.edges.read().await;
        let mut matching: Vec<CausalHyperedge> = edges
            .values()
            .filter(|h| h.nodes.patterns.contains(pattern_id))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.last_updated_at.cmp(&a.last_updated_at));
        Ok(matching)
    }

    async fn list_top(&self, limit: usize) -> DomainResult<Vec<CausalHyperedge>> {
        let edges = self.edges.read().await;
        let mut all: Vec<CausalHyperedge> = edges.values().cloned().collect();
        all.sort_by(rank);
        all.truncate(limit);
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{FeedbackSignal, HyperedgeNodes, InferenceId, Route};
    use chrono::Utc;

    fn edge(patterns: &[&str], signals: &[FeedbackSignal]) -> CausalHyperedge {
        let mut h = CausalHyperedge::new(HyperedgeNodes::new(
            Route::PatternMatch,
            patterns.iter().map(|p| PatternId::new(*p)),
            std::iter::empty::<InferenceId>(),
        ));
        for s in signals {
            h.accumulate(*s, Utc::now());
        }
        h
    }

    #[tokio::test]
    async fn test_save_replaces_existing() {
        let repo = InMemoryHyperedgeRepository::new();
        let mut h = edge(&["p1"], &[FeedbackSignal::Positive]);
        repo.save(&h).await.unwrap();

        h.accumulate(FeedbackSignal::Positive, Utc::now());
        repo.save(&h).await.unwrap();

        assert_eq!(repo.len().await, 1);
        assert_eq!(repo.get(&h.id).await.unwrap().unwrap().weight.count, 2);
    }

    #[tokio::test]
    async fn test_accumulate_creates_then_increments() {
        let repo = InMemoryHyperedgeRepository::new();
        let nodes = HyperedgeNodes::new(
            Route::Hybrid,
            [PatternId::new("p1")],
            std::iter::empty::<InferenceId>(),
        );

        let first = repo.accumulate(&nodes, FeedbackSignal::Positive, Utc::now()).await.unwrap();
        assert_eq!(first.weight.count, 1);

        let second = repo
            .accumulate(&nodes, FeedbackSignal::Score(-0.25), Utc::now())
            .await
            .unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.weight.count, 2);
        assert!((second.weight.signed_sum - 0.75).abs() < f64::EPSILON);
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn test_list_for_pattern_and_top() {
        let repo = InMemoryHyperedgeRepository::new();
        let good = edge(&["p1", "p2"], &[FeedbackSignal::Positive, FeedbackSignal::Positive]);
        let mixed = edge(&["p2"], &[FeedbackSignal::Positive, FeedbackSignal::Negative]);
        let bad = edge(&["p3"], &[FeedbackSignal::Negative]);
        for h in [&good, &mixed, &bad] {
            repo.save(h).await.unwrap();
        }

        let for_p2 = repo.list_for_pattern(&PatternId::new("p2")).await.unwrap();
        assert_eq!(for_p2.len(), 2);

        let top = repo.list_top(10).await.unwrap();
        let order: Vec<_> = top.iter().map(|h| h.id.clone()).collect();
        assert_eq!(order, vec![good.id, mixed.id, bad.id]);

        assert_eq!(repo.list_top(1).await.unwrap().len(), 1);
    }
}
