//! # korpus-graph
//!
//! Property-graph backend layer for korpus.
//!
//! This crate provides:
//! - Connection pool management for PostgreSQL
//! - `PgGraphStore`, the Postgres implementation of `GraphStore`
//! - `InMemoryGraphStore`, a store with identical merge semantics for
//!   tests and offline runs
//! - The two-pass `GraphProjector`
//! - The `RelationInferenceEngine` and its pure rule functions

pub mod inference;
pub mod memory;
pub mod pool;
pub mod projector;
pub mod store;
pub mod views;

// Re-export core types
pub use korpus_core::*;

pub use inference::{InferenceStats, RelationInferenceEngine};
pub use memory::InMemoryGraphStore;
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use projector::{GraphProjector, ProjectionStats};
pub use store::PgGraphStore;
