//! Port trait definitions (Hexagonal Architecture)
//!
//! Async trait interfaces that storage adapters implement:
//! - TrajectoryRepository: durable trajectory metadata and feedback
//! - HyperedgeRepository: the causal hyperedge graph

pub mod hyperedge_repository;
pub mod trajectory_repository;

pub use hyperedge_repository::HyperedgeRepository;
pub use trajectory_repository::TrajectoryRepository;
