//! In-memory graph store with the same merge semantics as Postgres.
//!
//! Always compiled (not test-gated) so integration tests across crates can
//! exercise the projector and inference engine without a live database.

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use korpus_core::{
    EdgeSpec, EdgeType, EventView, GraphStore, JsonMap, MergeOutcome, MicroActionView, NodeLabel,
    Result,
};

use crate::views;

#[derive(Debug, Default)]
struct Inner {
    nodes: BTreeMap<String, (NodeLabel, JsonMap)>,
    edges: BTreeMap<(String, String, String), JsonMap>,
}

/// Mutex-guarded in-memory property graph.
#[derive(Debug, Default)]
pub struct InMemoryGraphStore {
    inner: Mutex<Inner>,
}

impl InMemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total node count (test inspection).
    pub fn node_count(&self) -> usize {
        self.inner.lock().unwrap().nodes.len()
    }

    /// Total edge count (test inspection).
    pub fn edge_count(&self) -> usize {
        self.inner.lock().unwrap().edges.len()
    }

    /// Whether a specific edge exists.
    pub fn has_edge(&self, from: &str, edge_type: EdgeType, to: &str) -> bool {
        self.inner.lock().unwrap().edges.contains_key(&(
            from.to_string(),
            edge_type.as_str().to_string(),
            to.to_string(),
        ))
    }

    /// A node's label and properties, if present.
    pub fn node(&self, id: &str) -> Option<(NodeLabel, JsonMap)> {
        self.inner.lock().unwrap().nodes.get(id).cloned()
    }
}

#[async_trait]
impl GraphStore for InMemoryGraphStore {
    async fn ensure_schema(&self) -> Result<()> {
        Ok(())
    }

    async fn merge_node(&self, label: NodeLabel, id: &str, properties: JsonValue) -> Result<()> {
        let incoming = properties.as_object().cloned().unwrap_or_default();
        let mut inner = self.inner.lock().unwrap();

        match inner.nodes.get_mut(id) {
            Some((existing_label, existing)) => {
                *existing_label = label;
                existing.extend(incoming);
            }
            None => {
                inner.nodes.insert(id.to_string(), (label, incoming));
            }
        }
        Ok(())
    }

    async fn merge_edge(&self, spec: &EdgeSpec) -> Result<MergeOutcome> {
        let mut inner = self.inner.lock().unwrap();

        let from_ok = inner
            .nodes
            .get(&spec.from)
            .is_some_and(|(label, _)| spec.from_label.matches(*label));
        let to_ok = inner
            .nodes
            .get(&spec.to)
            .is_some_and(|(label, _)| spec.to_label.matches(*label));

        if !from_ok || !to_ok {
            return Ok(MergeOutcome::MissingEndpoint);
        }

        let incoming = spec
            .properties
            .as_ref()
            .and_then(|p| p.as_object().cloned())
            .unwrap_or_default();
        let key = (
            spec.from.clone(),
            spec.edge_type.as_str().to_string(),
            spec.to.clone(),
        );
        inner.edges.entry(key).or_default().extend(incoming);

        Ok(MergeOutcome::Merged)
    }

    async fn count_nodes(&self, label: Option<NodeLabel>) -> Result<i64> {
        let inner = self.inner.lock().unwrap();
        let count = match label {
            Some(label) => inner.nodes.values().filter(|(l, _)| *l == label).count(),
            None => inner.nodes.len(),
        };
        Ok(count as i64)
    }

    async fn count_edges(&self, edge_type: Option<EdgeType>) -> Result<i64> {
        let inner = self.inner.lock().unwrap();
        let count = match edge_type {
            Some(edge_type) => inner
                .edges
                .keys()
                .filter(|(_, t, _)| t == edge_type.as_str())
                .count(),
            None => inner.edges.len(),
        };
        Ok(count as i64)
    }

    async fn micro_action_views(&self) -> Result<Vec<MicroActionView>> {
        let inner = self.inner.lock().unwrap();

        let replied: HashSet<&String> = inner
            .edges
            .keys()
            .filter(|(_, t, _)| t == EdgeType::RepliesTo.as_str())
            .map(|(from, _, _)| from)
            .collect();

        let mut views = Vec::new();
        for (id, (label, props)) in &inner.nodes {
            if *label != NodeLabel::MicroAction {
                continue;
            }
            let mut view = views::micro_action_view(id, props);
            view.has_reply_edge = replied.contains(id);

            for ((from, edge_type, to), _) in &inner.edges {
                if from != id {
                    continue;
                }
                if edge_type != EdgeType::Concerns.as_str()
                    && edge_type != EdgeType::References.as_str()
                {
                    continue;
                }
                if inner
                    .nodes
                    .get(to)
                    .is_some_and(|(l, _)| *l == NodeLabel::Person)
                {
                    view.concerned_persons.insert(to.clone());
                }
            }

            views.push(view);
        }
        Ok(views)
    }

    async fn event_views(&self) -> Result<Vec<EventView>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .nodes
            .iter()
            .filter(|(_, (label, _))| *label == NodeLabel::Event)
            .map(|(id, (_, props))| views::event_view(id, props))
            .collect())
    }
}
