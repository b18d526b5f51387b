//! Storage adapters for the reasoning bank ports.

pub mod memory;
pub mod sqlite;
