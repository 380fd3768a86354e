//! Core traits for korpus abstractions.
//!
//! The `GraphStore` trait is the seam between projection logic and the
//! property-graph backend, enabling pluggable backends and testability
//! (the graph crate ships both a Postgres and an in-memory
//! implementation).

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::error::Result;
use crate::models::{EdgeType, EventView, MicroActionView, NodeLabel};

/// Labels an actor/recipient participant may carry.
pub const ACTOR_LABELS: &[NodeLabel] = &[NodeLabel::Person, NodeLabel::Organization];

/// Constraint on the label of an edge endpoint.
///
/// Specific relations assume their target label (e.g. LOCATED_IN points at
/// a GPE); generic references accept anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelFilter {
    Any,
    Exact(NodeLabel),
    OneOf(&'static [NodeLabel]),
}

impl LabelFilter {
    pub fn matches(&self, label: NodeLabel) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(expected) => label == *expected,
            Self::OneOf(allowed) => allowed.contains(&label),
        }
    }

    /// Allowed label strings, or `None` for unconstrained.
    pub fn allowed_labels(&self) -> Option<Vec<String>> {
        match self {
            Self::Any => None,
            Self::Exact(label) => Some(vec![label.as_str().to_string()]),
            Self::OneOf(labels) => Some(labels.iter().map(|l| l.as_str().to_string()).collect()),
        }
    }
}

/// A typed edge write with merge semantics.
#[derive(Debug, Clone)]
pub struct EdgeSpec {
    pub from: String,
    pub edge_type: EdgeType,
    pub to: String,
    pub properties: Option<JsonValue>,
    pub from_label: LabelFilter,
    pub to_label: LabelFilter,
}

impl EdgeSpec {
    pub fn new(from: impl Into<String>, edge_type: EdgeType, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            edge_type,
            to: to.into(),
            properties: None,
            from_label: LabelFilter::Any,
            to_label: LabelFilter::Any,
        }
    }

    pub fn with_properties(mut self, properties: JsonValue) -> Self {
        self.properties = Some(properties);
        self
    }

    pub fn from_label(mut self, filter: LabelFilter) -> Self {
        self.from_label = filter;
        self
    }

    pub fn to_label(mut self, filter: LabelFilter) -> Self {
        self.to_label = filter;
        self
    }
}

/// Outcome of a merge-edge write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The edge exists after the call (created or already present).
    Merged,
    /// An endpoint was missing or label-mismatched; nothing was written.
    MissingEndpoint,
}

/// Property-graph backend.
///
/// All writes are upserts: merging a node twice merges its property maps,
/// merging an edge twice leaves a single edge per (type, ordered pair).
/// Backend/connectivity failures surface as `Error::Database` and abort
/// the run; a missing edge endpoint is a soft [`MergeOutcome`], never an
/// error.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Create tables/constraints if absent. Idempotent.
    async fn ensure_schema(&self) -> Result<()>;

    /// Create or update a node, merging `properties` over existing ones.
    async fn merge_node(&self, label: NodeLabel, id: &str, properties: JsonValue) -> Result<()>;

    /// Create or update a typed edge between existing nodes.
    async fn merge_edge(&self, spec: &EdgeSpec) -> Result<MergeOutcome>;

    /// Count nodes, optionally restricted to one label.
    async fn count_nodes(&self, label: Option<NodeLabel>) -> Result<i64>;

    /// Count edges, optionally restricted to one type.
    async fn count_edges(&self, edge_type: Option<EdgeType>) -> Result<i64>;

    /// Load the committed micro-action state the inference rules join over.
    async fn micro_action_views(&self) -> Result<Vec<MicroActionView>>;

    /// Load the committed event state the inference rules join over.
    async fn event_views(&self) -> Result<Vec<EventView>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_filter_matching() {
        assert!(LabelFilter::Any.matches(NodeLabel::Event));
        assert!(LabelFilter::Exact(NodeLabel::Gpe).matches(NodeLabel::Gpe));
        assert!(!LabelFilter::Exact(NodeLabel::Gpe).matches(NodeLabel::Person));
        assert!(LabelFilter::OneOf(ACTOR_LABELS).matches(NodeLabel::Organization));
        assert!(!LabelFilter::OneOf(ACTOR_LABELS).matches(NodeLabel::Gpe));
    }

    #[test]
    fn test_label_filter_allowed_labels() {
        assert_eq!(LabelFilter::Any.allowed_labels(), None);
        assert_eq!(
            LabelFilter::Exact(NodeLabel::Gpe).allowed_labels(),
            Some(vec!["GPE".to_string()])
        );
        assert_eq!(
            LabelFilter::OneOf(ACTOR_LABELS).allowed_labels(),
            Some(vec!["Person".to_string(), "Organization".to_string()])
        );
    }

    #[test]
    fn test_edge_spec_builder() {
        let spec = EdgeSpec::new("a", EdgeType::References, "b")
            .from_label(LabelFilter::Exact(NodeLabel::Person))
            .with_properties(serde_json::json!({"computed": true}));

        assert_eq!(spec.from, "a");
        assert_eq!(spec.edge_type, EdgeType::References);
        assert_eq!(spec.from_label, LabelFilter::Exact(NodeLabel::Person));
        assert_eq!(spec.to_label, LabelFilter::Any);
        assert!(spec.properties.is_some());
    }
}
