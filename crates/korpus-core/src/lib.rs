//! # korpus-core
//!
//! Core types, traits, and parsing primitives for the korpus graph
//! importer.
//!
//! This crate provides the canonical record model, the cross-reference and
//! historical-date grammars, the warning collector, consistency checks,
//! and the `GraphStore` trait other korpus crates build on.

pub mod defaults;
pub mod edtf;
pub mod error;
pub mod ids;
pub mod logging;
pub mod models;
pub mod reference;
pub mod traits;
pub mod validation;
pub mod warnings;

// Re-export commonly used types at crate root
pub use defaults::ImportConfig;
pub use edtf::{DatePrecision, EdtfDate};
pub use error::{Error, Result};
pub use ids::{
    canonical_event_id, canonical_micro_action_id, document_id_base, shared_registry,
    DocIdRegistry, SharedDocIdRegistry,
};
pub use models::*;
pub use traits::{EdgeSpec, GraphStore, LabelFilter, MergeOutcome, ACTOR_LABELS};
pub use validation::{ConsistencyValidator, ValidationCounts};
pub use warnings::{ImportWarnings, WarningCounts};
