//! SQLite implementation of the TrajectoryRepository.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    Feedback, FeedbackSignal, PatternId, Route, TrajectoryId, TrajectoryMetadata,
};
use crate::domain::ports::TrajectoryRepository;

#[derive(Clone)]
pub struct SqliteTrajectoryRepository {
    pool: SqlitePool,
}

impl SqliteTrajectoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TrajectoryRepository for SqliteTrajectoryRepository {
    async fn load_metadata(&self, id: &TrajectoryId) -> DomainResult<Option<TrajectoryMetadata>> {
        let row: Option<TrajectoryRow> = sqlx::query_as(
            r#"SELECT id, route, matched_patterns_json, context_json, created_at
               FROM trajectories WHERE id = ?"#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn save_metadata(&self, metadata: &TrajectoryMetadata) -> DomainResult<bool> {
        let matched_patterns_json = serde_json::to_string(&metadata.matched_patterns)?;
        let context_json = serde_json::to_string(&metadata.context)?;

        // Trajectories are written once; a replayed save must not clobber the original.
        let result = sqlx::query(
            r#"INSERT INTO trajectories (id, route, matched_patterns_json, context_json, created_at)
               VALUES (?, ?, ?, ?, ?)
               ON CONFLICT(id) DO NOTHING"#,
        )
        .bind(metadata.id.to_string())
        .bind(metadata.route.as_str())
        .bind(&matched_patterns_json)
        .bind(&context_json)
        .bind(metadata.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn save_feedback(&self, feedback: &Feedback) -> DomainResult<()> {
        let signal_json = serde_json::to_string(&feedback.signal)?;

        sqlx::query(
            r#"INSERT INTO trajectory_feedback (
                id, trajectory_id, signal_json, signal_weight, received_at
            ) VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(id) DO NOTHING"#,
        )
        .bind(feedback.id.to_string())
        .bind(&feedback.trajectory_id)
        .bind(&signal_json)
        .bind(feedback.signal.as_weight())
        .bind(feedback.received_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_feedback(&self, trajectory_id: &TrajectoryId) -> DomainResult<Vec<Feedback>> {
        let rows: Vec<FeedbackRow> = sqlx::query_as(
            r#"SELECT id, trajectory_id, signal_json, received_at
               FROM trajectory_feedback
               WHERE trajectory_id = ?
               ORDER BY received_at ASC, rowid ASC"#,
        )
        .bind(trajectory_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}

#[derive(sqlx::FromRow)]
struct TrajectoryRow {
    id: String,
    route: String,
    matched_patterns_json: String,
    context_json: String,
    created_at: String,
}

impl TryFrom<TrajectoryRow> for TrajectoryMetadata {
    type Error = DomainError;

    fn try_from(row: TrajectoryRow) -> Result<Self, Self::Error> {
        let id = TrajectoryId(super::parse_uuid(&row.id)?);

        let route = Route::from_str(&row.route).ok_or_else(|| {
            DomainError::SerializationError(format!("Invalid route: {}", row.route))
        })?;

        let matched_patterns: Vec<PatternId> = serde_json::from_str(&row.matched_patterns_json)
            .map_err(|e| {
                DomainError::SerializationError(format!("Invalid matched_patterns: {}", e))
            })?;

        let context: Vec<serde_json::Value> = serde_json::from_str(&row.context_json)
            .map_err(|e| DomainError::SerializationError(format!("Invalid context: {}", e)))?;

        let created_at = super::parse_datetime(&row.created_at)?;

        Ok(TrajectoryMetadata {
            id,
            route,
            matched_patterns,
            context,
            created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct FeedbackRow {
    id: String,
    trajectory_id: String,
    signal_json: String,
    received_at: String,
}

impl TryFrom<FeedbackRow> for Feedback {
    type Error = DomainError;

    fn try_from(row: FeedbackRow) -> Result<Self, Self::Error> {
        let signal: FeedbackSignal = serde_json::from_str(&row.signal_json)
            .map_err(|e| DomainError::SerializationError(format!("Invalid signal: {}", e)))?;

        Ok(Feedback {
            id: super::parse_uuid(&row.id)?,
            trajectory_id: row.trajectory_id,
            signal,
            received_at: super::parse_datetime(&row.received_at)?,
        })
    }
}
