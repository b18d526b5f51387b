//! Common test utilities for integration tests
//!
//! Provides shared fixtures and helpers used across multiple integration
//! test files.

use std::sync::Arc;

use reasoning_bank::adapters::memory::InMemoryHyperedgeRepository;
use reasoning_bank::adapters::sqlite::{
    create_migrated_test_pool, SqliteHyperedgeRepository, SqliteTrajectoryRepository,
};
use reasoning_bank::services::{EventBus, EventBusConfig, ReasoningEvent};
use reasoning_bank::{CausalInference, Config, Pattern, ReasoningBank, Route, Trajectory};
use sqlx::SqlitePool;
use tokio::sync::broadcast;

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
/// Call this at the beginning of tests that need logging.
#[allow(dead_code)]
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// A bank over a fresh in-memory database.
///
/// Returns the pool too, so a test can build a second bank over the same
/// durable state to simulate a restart.
#[allow(dead_code)]
pub async fn test_bank() -> (ReasoningBank, SqlitePool) {
    let pool = create_migrated_test_pool()
        .await
        .expect("Failed to create test pool");
    (bank_over(&pool), pool)
}

/// A new bank sharing durable state with an existing pool. Resident
/// trajectories and the in-memory hyperedge graph start empty.
#[allow(dead_code)]
pub fn bank_over(pool: &SqlitePool) -> ReasoningBank {
    ReasoningBank::new(
        Arc::new(SqliteTrajectoryRepository::new(pool.clone())),
        Arc::new(InMemoryHyperedgeRepository::new()),
        Arc::new(EventBus::new(EventBusConfig::default())),
        &Config::default(),
    )
}

/// A bank whose hyperedge graph is durable in the same database as its
/// trajectories. Several of these over one pool behave like separate
/// processes sharing a database file.
#[allow(dead_code)]
pub fn durable_bank_over(pool: &SqlitePool) -> ReasoningBank {
    ReasoningBank::new(
        Arc::new(SqliteTrajectoryRepository::new(pool.clone())),
        Arc::new(SqliteHyperedgeRepository::new(pool.clone())),
        Arc::new(EventBus::new(EventBusConfig::default())),
        &Config::default(),
    )
}

/// Trajectory T1: route `pattern_match`, pattern `p1`, inference `c1`.
#[allow(dead_code)]
pub fn t1() -> Trajectory {
    Trajectory::new(Route::PatternMatch).with_response(
        vec![Pattern::new("p1", "retry idempotent requests").with_confidence(0.9)],
        vec![CausalInference::new("c1", "upstream returned 503", "retry succeeded")],
    )
}

/// Collect every event currently buffered on a receiver.
#[allow(dead_code)]
pub fn drain_events(rx: &mut broadcast::Receiver<ReasoningEvent>) -> Vec<ReasoningEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
