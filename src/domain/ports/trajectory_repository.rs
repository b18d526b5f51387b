//! Trajectory repository port: the durable side of the trajectory store.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Feedback, TrajectoryId, TrajectoryMetadata};

/// Repository interface for durable trajectory metadata and feedback.
///
/// This is the sole source of truth across process restarts. It stores the
/// minimal projection of a trajectory only; it can never supply a response.
#[async_trait]
pub trait TrajectoryRepository: Send + Sync {
    /// Load the metadata projection of a trajectory.
    async fn load_metadata(&self, id: &TrajectoryId) -> DomainResult<Option<TrajectoryMetadata>>;

    /// Persist the metadata projection of a newly created trajectory.
    ///
    /// Returns `false` without touching the stored record when the id is
    /// already known.
    async fn save_metadata(&self, metadata: &TrajectoryMetadata) -> DomainResult<bool>;

    /// Append a feedback record. Saving the same feedback id again is a
    /// no-op, so a failed ingestion can be retried with the same record.
    async fn save_feedback(&self, feedback: &Feedback) -> DomainResult<()>;

    /// All feedback recorded against a trajectory, oldest first.
    async fn list_feedback(&self, trajectory_id: &TrajectoryId) -> DomainResult<Vec<Feedback>>;
}
