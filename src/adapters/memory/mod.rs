//! Process-local adapters.

pub mod hyperedge_repository;

pub use hyperedge_repository::InMemoryHyperedgeRepository;
