//! Domain layer for the reasoning bank
//!
//! Core models, errors and the port traits that storage adapters implement.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
