//! Two-tier trajectory store.
//!
//! The resident tier holds full trajectories (including their response) for
//! trajectories created by this process. The durable tier holds only the
//! metadata projection. Resolving a trajectory that is no longer resident
//! yields a reconstruction with no response.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::debug;

use super::storage_retry::StorageRetryPolicy;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Trajectory, TrajectoryId, TrajectoryStoreConfig};
use crate::domain::ports::TrajectoryRepository;

/// Which tier answered a resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrajectoryTier {
    /// Full record created by this process
    Resident,
    /// Reconstructed from durable metadata; never carries a response
    Durable,
}

#[derive(Debug, Clone)]
pub struct ResolvedTrajectory {
    pub trajectory: Arc<Trajectory>,
    pub tier: TrajectoryTier,
}

pub struct TrajectoryStore {
    resident: Cache<TrajectoryId, Arc<Trajectory>>,
    repository: Arc<dyn TrajectoryRepository>,
    retry: StorageRetryPolicy,
}

impl TrajectoryStore {
    pub fn new(repository: Arc<dyn TrajectoryRepository>) -> Self {
        Self::with_config(
            repository,
            &TrajectoryStoreConfig::default(),
            StorageRetryPolicy::default(),
        )
    }

    pub fn with_config(
        repository: Arc<dyn TrajectoryRepository>,
        config: &TrajectoryStoreConfig,
        retry: StorageRetryPolicy,
    ) -> Self {
        let resident = Cache::builder()
            .max_capacity(config.max_resident)
            .time_to_idle(Duration::from_secs(config.idle_ttl_secs))
            .build();

        Self {
            resident,
            repository,
            retry,
        }
    }

    /// Resident lookup only. Never touches the durable tier.
    pub async fn get(&self, id: &TrajectoryId) -> Option<Arc<Trajectory>> {
        self.resident.get(id).await
    }

    /// Record a newly created trajectory in both tiers.
    ///
    /// Fails with `DuplicateTrajectory` if the id is already resident or
    /// already has durable metadata. On any failure the resident entry is
    /// dropped again, so both tiers always describe the same trajectory.
    pub async fn put(&self, trajectory: Trajectory) -> DomainResult<Arc<Trajectory>> {
        let id = trajectory.id;
        let metadata = trajectory.metadata();
        let trajectory = Arc::new(trajectory);

        let entry = self.resident.entry(id).or_insert(Arc::clone(&trajectory)).await;
        if !entry.is_fresh() {
            return Err(DomainError::DuplicateTrajectory(id));
        }

        let saved = self
            .retry
            .execute("save_metadata", || self.repository.save_metadata(&metadata))
            .await;

        match saved {
            Ok(true) => {}
            Ok(false) => {
                self.resident.invalidate(&id).await;
                return Err(DomainError::DuplicateTrajectory(id));
            }
            Err(err) => {
                self.resident.invalidate(&id).await;
                return Err(err);
            }
        }

        debug!(trajectory_id = %id, route = %trajectory.route, "trajectory recorded");
        Ok(trajectory)
    }

    /// Resident record if present, otherwise a reconstruction from durable
    /// metadata.
    pub async fn resolve(&self, id: &TrajectoryId) -> DomainResult<ResolvedTrajectory> {
        if let Some(trajectory) = self.resident.get(id).await {
            return Ok(ResolvedTrajectory {
                trajectory,
                tier: TrajectoryTier::Resident,
            });
        }

        let metadata = self
            .retry
            .execute("load_metadata", || self.repository.load_metadata(id))
            .await?
            .ok_or(DomainError::TrajectoryNotFound(*id))?;

        debug!(trajectory_id = %id, "trajectory resolved from durable metadata");
        Ok(ResolvedTrajectory {
            trajectory: Arc::new(Trajectory::from_metadata(metadata)),
            tier: TrajectoryTier::Durable,
        })
    }

    /// Drop a trajectory from the resident tier. Durable metadata is kept.
    pub async fn evict(&self, id: &TrajectoryId) {
        self.resident.invalidate(id).await;
    }

    /// The durable tier backing this store.
    pub fn repository(&self) -> &Arc<dyn TrajectoryRepository> {
        &self.repository
    }

    pub(crate) fn retry_policy(&self) -> &StorageRetryPolicy {
        &self.retry
    }
}
