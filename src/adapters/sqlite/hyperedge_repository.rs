//! SQLite implementation of the HyperedgeRepository.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    CausalHyperedge, FeedbackSignal, HyperedgeId, HyperedgeNodes, HyperedgeWeight, InferenceId,
    PatternId, Route,
};
use crate::domain::ports::HyperedgeRepository;

const COLUMNS: &str = "id, route, pattern_ids_json, inference_ids_json, \
     feedback_count, signed_sum, created_at, last_updated_at";

const SELECT_COLUMNS: &str = "SELECT id, route, pattern_ids_json, inference_ids_json, \
     feedback_count, signed_sum, created_at, last_updated_at FROM causal_hyperedges";

#[derive(Clone)]
pub struct SqliteHyperedgeRepository {
    pool: SqlitePool,
}

impl SqliteHyperedgeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HyperedgeRepository for SqliteHyperedgeRepository {
    async fn get(&self, id: &HyperedgeId) -> DomainResult<Option<CausalHyperedge>> {
        let row: Option<HyperedgeRow> = sqlx::query_as(&format!("{SELECT_COLUMNS} WHERE id = ?"))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn save(&self, hyperedge: &CausalHyperedge) -> DomainResult<()> {
        let pattern_ids_json = serde_json::to_string(&hyperedge.nodes.patterns)?;
        let inference_ids_json = serde_json::to_string(&hyperedge.nodes.inferences)?;
        let feedback_count = i64::try_from(hyperedge.weight.count).map_err(|_| {
            DomainError::ValidationFailed("hyperedge feedback count overflow".to_string())
        })?;

        sqlx::query(
            r#"INSERT INTO causal_hyperedges (
                id, route, pattern_ids_json, inference_ids_json,
                feedback_count, signed_sum, created_at, last_updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                feedback_count = excluded.feedback_count,
                signed_sum = excluded.signed_sum,
                last_updated_at = excluded.last_updated_at"#,
        )
        .bind(hyperedge.id.as_str())
        .bind(hyperedge.nodes.route.as_str())
        .bind(&pattern_ids_json)
        .bind(&inference_ids_json)
        .bind(feedback_count)
        .bind(hyperedge.weight.signed_sum)
        .bind(hyperedge.created_at.to_rfc3339())
        .bind(hyperedge.last_updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn accumulate(
        &self,
        nodes: &HyperedgeNodes,
        signal: FeedbackSignal,
        at: DateTime<Utc>,
    ) -> DomainResult<CausalHyperedge> {
        let pattern_ids_json = serde_json::to_string(&nodes.patterns)?;
        let inference_ids_json = serde_json::to_string(&nodes.inferences)?;
        let id = nodes.id();
        let at = at.to_rfc3339();

        // The increment happens inside the statement, so writers sharing the
        // database file never overwrite each other's totals.
        let row: HyperedgeRow = sqlx::query_as(&format!(
            r#"INSERT INTO causal_hyperedges (
                id, route, pattern_ids_json, inference_ids_json,
                feedback_count, signed_sum, created_at, last_updated_at
            ) VALUES (?, ?, ?, ?, 1, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                feedback_count = causal_hyperedges.feedback_count + 1,
                signed_sum = causal_hyperedges.signed_sum + excluded.signed_sum,
                last_updated_at = excluded.last_updated_at
            RETURNING {COLUMNS}"#
        ))
        .bind(id.as_str())
        .bind(nodes.route.as_str())
        .bind(&pattern_ids_json)
        .bind(&inference_ids_json)
        .bind(signal.as_weight())
        .bind(&at)
        .bind(&at)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn list_for_pattern(
        &self,
        pattern_id: &PatternId,
    ) -> DomainResult<Vec<CausalHyperedge>> {
        let rows: Vec<HyperedgeRow> = sqlx::query_as(&format!(
            "{SELECT_COLUMNS} WHERE EXISTS \
             (SELECT 1 FROM json_each(pattern_ids_json) WHERE json_each.value = ?) \
             ORDER BY last_updated_at DESC"
        ))
        .bind(pattern_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn list_top(&self, limit: usize) -> DomainResult<Vec<CausalHyperedge>> {
        let rows: Vec<HyperedgeRow> = sqlx::query_as(&format!(
            "{SELECT_COLUMNS} ORDER BY \
             CASE WHEN feedback_count = 0 THEN 0.0 ELSE signed_sum / feedback_count END DESC, \
             feedback_count DESC, id ASC LIMIT ?"
        ))
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}

#[derive(sqlx::FromRow)]
struct HyperedgeRow {
    id: String,
    route: String,
    pattern_ids_json: String,
    inference_ids_json: String,
    feedback_count: i64,
    signed_sum: f64,
    created_at: String,
    last_updated_at: String,
}

impl TryFrom<HyperedgeRow> for CausalHyperedge {
    type Error = DomainError;

    fn try_from(row: HyperedgeRow) -> Result<Self, Self::Error> {
        let route = Route::from_str(&row.route).ok_or_else(|| {
            DomainError::SerializationError(format!("Invalid route: {}", row.route))
        })?;

        let patterns: BTreeSet<PatternId> = serde_json::from_str(&row.pattern_ids_json)
            .map_err(|e| DomainError::SerializationError(format!("Invalid pattern_ids: {}", e)))?;

        let inferences: BTreeSet<InferenceId> = serde_json::from_str(&row.inference_ids_json)
            .map_err(|e| {
                DomainError::SerializationError(format!("Invalid inference_ids: {}", e))
            })?;

        let count = u64::try_from(row.feedback_count).map_err(|_| {
            DomainError::SerializationError(format!(
                "Invalid feedback_count: {}",
                row.feedback_count
            ))
        })?;

        Ok(CausalHyperedge {
            id: HyperedgeId::from_raw(row.id),
            nodes: HyperedgeNodes {
                route,
                patterns,
                inferences,
            },
            weight: HyperedgeWeight {
                count,
                signed_sum: row.signed_sum,
            },
            created_at: super::parse_datetime(&row.created_at)?,
            last_updated_at: super::parse_datetime(&row.last_updated_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_migrated_test_pool;
    use crate::domain::models::FeedbackSignal;
    use chrono::Utc;

    async fn setup_test_repo() -> SqliteHyperedgeRepository {
        let pool = create_migrated_test_pool().await.unwrap();
        SqliteHyperedgeRepository::new(pool)
    }

    fn edge(route: Route, patterns: &[&str], inferences: &[&str]) -> CausalHyperedge {
        CausalHyperedge::new(HyperedgeNodes::new(
            route,
            patterns.iter().map(|p| PatternId::new(*p)),
            inferences.iter().map(|c| InferenceId::new(*c)),
        ))
    }

    #[tokio::test]
    async fn test_save_and_get() {
        let repo = setup_test_repo().await;
        let mut hyperedge = edge(Route::Hybrid, &["p1", "p2"], &["c1"]);
        hyperedge.accumulate(FeedbackSignal::Positive, Utc::now());

        repo.save(&hyperedge).await.unwrap();

        let loaded = repo.get(&hyperedge.id).await.unwrap().unwrap();
        assert_eq!(loaded.id, hyperedge.id);
        assert_eq!(loaded.nodes, hyperedge.nodes);
        assert_eq!(loaded.weight.count, 1);
        assert!((loaded.weight.signed_sum - 1.0).abs() < f64::EPSILON);
        // Stored id still matches the content it was derived from.
        assert_eq!(loaded.nodes.id(), loaded.id);
    }

    #[tokio::test]
    async fn test_save_updates_accumulator_in_place() {
        let repo = setup_test_repo().await;
        let mut hyperedge = edge(Route::CausalChain, &["p1"], &["c1"]);
        hyperedge.accumulate(FeedbackSignal::Positive, Utc::now());
        repo.save(&hyperedge).await.unwrap();

        hyperedge.accumulate(FeedbackSignal::Negative, Utc::now());
        repo.save(&hyperedge).await.unwrap();

        let loaded = repo.get(&hyperedge.id).await.unwrap().unwrap();
        assert_eq!(loaded.weight.count, 2);
        assert!(loaded.weight.signed_sum.abs() < f64::EPSILON);

        let all = repo.list_top(10).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_accumulate_increments_in_storage() {
        let repo = setup_test_repo().await;
        let nodes = HyperedgeNodes::new(
            Route::PatternMatch,
            [PatternId::new("p1")],
            [InferenceId::new("c1")],
        );

        let created = repo.accumulate(&nodes, FeedbackSignal::Positive, Utc::now()).await.unwrap();
        assert_eq!(created.id, nodes.id());
        assert_eq!(created.weight.count, 1);
        assert_eq!(created.nodes, nodes);

        let updated = repo
            .accumulate(&nodes, FeedbackSignal::Score(-0.5), Utc::now())
            .await
            .unwrap();
        assert_eq!(updated.weight.count, 2);
        assert!((updated.weight.signed_sum - 0.5).abs() < f64::EPSILON);
        assert_eq!(updated.created_at, created.created_at);

        let loaded = repo.get(&nodes.id()).await.unwrap().unwrap();
        assert_eq!(loaded.weight, updated.weight);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_accumulate_from_separate_repositories_keeps_every_signal() {
        let dir = tempfile::tempdir().unwrap();
        let url = crate::adapters::sqlite::database_url(
            &dir.path().join("graph.db").to_string_lossy(),
        );
        let pool = crate::adapters::sqlite::initialize_database(&url, None).await.unwrap();
        let nodes = HyperedgeNodes::new(
            Route::Hybrid,
            [PatternId::new("p1")],
            [InferenceId::new("c1")],
        );

        let mut handles = Vec::new();
        for i in 0..40 {
            // A fresh repository per writer, as separate processes would have.
            let repo = SqliteHyperedgeRepository::new(pool.clone());
            let nodes = nodes.clone();
            let signal = if i % 4 == 0 {
                FeedbackSignal::Negative
            } else {
                FeedbackSignal::Positive
            };
            handles.push(tokio::spawn(async move {
                repo.accumulate(&nodes, signal, Utc::now()).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let loaded = SqliteHyperedgeRepository::new(pool.clone())
            .get(&nodes.id())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.weight.count, 40);
        // 10 negatives, 30 positives
        assert!((loaded.weight.signed_sum - 20.0).abs() < 1e-9);
        pool.close().await;
    }

    #[tokio::test]
    async fn test_list_for_pattern() {
        let repo = setup_test_repo().await;
        repo.save(&edge(Route::Hybrid, &["p1", "p2"], &["c1"])).await.unwrap();
        repo.save(&edge(Route::Direct, &["p2"], &[])).await.unwrap();
        repo.save(&edge(Route::Direct, &["p3"], &["p2"])).await.unwrap();

        let for_p2 = repo.list_for_pattern(&PatternId::new("p2")).await.unwrap();
        assert_eq!(for_p2.len(), 2);
        assert!(for_p2.iter().all(|h| h.nodes.patterns.contains(&PatternId::new("p2"))));

        assert!(repo.list_for_pattern(&PatternId::new("missing")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_top_orders_by_mean_then_count() {
        let repo = setup_test_repo().await;

        let mut strong = edge(Route::Hybrid, &["p1"], &[]);
        strong.accumulate(FeedbackSignal::Positive, Utc::now());
        strong.accumulate(FeedbackSignal::Positive, Utc::now());

        let mut single = edge(Route::Hybrid, &["p2"], &[]);
        single.accumulate(FeedbackSignal::Positive, Utc::now());

        let mut weak = edge(Route::Hybrid, &["p3"], &[]);
        weak.accumulate(FeedbackSignal::Negative, Utc::now());

        for h in [&weak, &single, &strong] {
            repo.save(h).await.unwrap();
        }

        let top = repo.list_top(2).await.unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].id, strong.id);
        assert_eq!(top[1].id, single.id);
    }
}
