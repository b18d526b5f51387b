//! Reasoning Bank - feedback-driven learning over agent decision paths
//!
//! Agents record every trajectory they produce, together with the patterns
//! they applied and the causal inferences they drew. Feedback arriving later
//! is folded into content-addressed causal hyperedges linking the route,
//! patterns and inferences. Trajectories that no longer carry their full
//! response (for example after a restart) are skipped rather than failed.
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Models, errors and repository ports
//! - **Adapters** (`adapters`): `SQLite` and in-memory repository implementations
//! - **Service Layer** (`services`): Trajectory store, degradation guard,
//!   feedback processor, hyperedge builder and event bus
//! - **Infrastructure Layer** (`infrastructure`): Configuration and logging
//!
//! # Example
//!
//! ```ignore
//! use reasoning_bank::{ConfigLoader, Feedback, ReasoningBank, Route, Trajectory};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::load()?;
//!     let bank = ReasoningBank::from_config(&config).await?;
//!
//!     let id = bank
//!         .record_trajectory(Trajectory::new(Route::Direct).with_response(vec![], vec![]))
//!         .await?;
//!     bank.provide_feedback(Feedback::positive(id.to_string())).await?;
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    CausalHyperedge, CausalInference, Config, Feedback, FeedbackSignal, HyperedgeId,
    HyperedgeNodes, HyperedgeWeight, InferenceId, Pattern, PatternId, ResponseData, Route,
    Trajectory, TrajectoryId, TrajectoryMetadata,
};
pub use domain::ports::{HyperedgeRepository, TrajectoryRepository};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use infrastructure::logging::{LogConfig, LoggerImpl};
pub use services::{
    EventBus, FeedbackOutcome, ReasoningBank, ReasoningEvent, TrajectoryStore, TrajectoryTier,
};
