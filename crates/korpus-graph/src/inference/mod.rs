//! Relation inference over committed graph state.
//!
//! Runs once, after all four ingestion phases commit. Each rule is a pure
//! join over views loaded from the store (`rules`); this module only
//! loads views, applies the rules, and merges the resulting edges.

pub mod rules;

use serde::Serialize;
use serde_json::json;
use tracing::info;

use korpus_core::{
    EdgeSpec, EdgeType, GraphStore, ImportConfig, InferredEdge, LabelFilter, MergeOutcome,
    NodeLabel, Result,
};

/// Edges merged per inference rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InferenceStats {
    pub replies_to: u64,
    pub next_in_chain: u64,
    pub acted_in_context: u64,
    pub follows_in_case: u64,
}

impl InferenceStats {
    pub fn total(&self) -> u64 {
        self.replies_to + self.next_in_chain + self.acted_in_context + self.follows_in_case
    }
}

/// Applies the four inference rules against a store.
pub struct RelationInferenceEngine<'a> {
    store: &'a dyn GraphStore,
    chain_window_days: i64,
}

impl<'a> RelationInferenceEngine<'a> {
    pub fn new(store: &'a dyn GraphStore, config: &ImportConfig) -> Self {
        Self {
            store,
            chain_window_days: config.chain_window_days,
        }
    }

    /// Load views, run every rule, merge the edges. Idempotent.
    pub async fn run(&self) -> Result<InferenceStats> {
        let micro_actions = self.store.micro_action_views().await?;
        let events = self.store.event_views().await?;

        let mut stats = InferenceStats::default();

        stats.replies_to = self.merge_all(rules::reply_links(&micro_actions)).await?;
        stats.next_in_chain = self
            .merge_all(rules::chain_links(&micro_actions, self.chain_window_days))
            .await?;
        stats.acted_in_context = self
            .merge_all(rules::context_links(&micro_actions, &events))
            .await?;
        stats.follows_in_case = self.merge_all(rules::case_timeline_links(&events)).await?;

        info!(
            subsystem = "graph",
            component = "inference",
            op = "run",
            record_count = stats.total(),
            "Inference rules applied"
        );
        Ok(stats)
    }

    async fn merge_all(&self, edges: Vec<InferredEdge>) -> Result<u64> {
        let mut merged = 0;
        for edge in edges {
            let mut properties = json!({ "computed": true });
            if let Some(days_diff) = edge.days_diff {
                properties["days_diff"] = days_diff.into();
            }

            let (from_label, to_label) = endpoint_labels(edge.edge_type);
            let spec = EdgeSpec::new(&edge.from, edge.edge_type, &edge.to)
                .from_label(from_label)
                .to_label(to_label)
                .with_properties(properties);

            if self.store.merge_edge(&spec).await? == MergeOutcome::Merged {
                merged += 1;
            }
        }
        Ok(merged)
    }
}

fn endpoint_labels(edge_type: EdgeType) -> (LabelFilter, LabelFilter) {
    let micro = LabelFilter::Exact(NodeLabel::MicroAction);
    let event = LabelFilter::Exact(NodeLabel::Event);
    match edge_type {
        EdgeType::RepliesTo | EdgeType::NextInCommunicationChain => (micro, micro),
        EdgeType::ActedInContextOf => (micro, event),
        _ => (event, event),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryGraphStore;
    use serde_json::json;

    async fn seed_micro(store: &InMemoryGraphStore, id: &str, props: serde_json::Value) {
        store
            .merge_node(NodeLabel::MicroAction, id, props)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_engine_merges_reply_edges() {
        let store = InMemoryGraphStore::new();
        seed_micro(
            &store,
            "/id/microaction/a",
            json!({"actor_id": "x", "recipient_id": "y", "date_start": "2020-01-10"}),
        )
        .await;
        seed_micro(
            &store,
            "/id/microaction/b",
            json!({
                "actor_id": "y", "recipient_id": "x",
                "date_start": "2020-01-20", "link_type": "replies_to"
            }),
        )
        .await;

        let config = ImportConfig::default();
        let engine = RelationInferenceEngine::new(&store, &config);
        let stats = engine.run().await.unwrap();

        assert_eq!(stats.replies_to, 1);
        assert!(store.has_edge(
            "/id/microaction/b",
            EdgeType::RepliesTo,
            "/id/microaction/a"
        ));
    }

    #[tokio::test]
    async fn test_engine_rerun_adds_nothing() {
        let store = InMemoryGraphStore::new();
        store
            .merge_node(NodeLabel::Person, "p", json!({}))
            .await
            .unwrap();
        seed_micro(
            &store,
            "m1",
            json!({"actor_id": "x", "recipient_id": "y", "date_start": "2020-01-01"}),
        )
        .await;
        seed_micro(
            &store,
            "m2",
            json!({"actor_id": "x", "recipient_id": "y", "date_start": "2020-01-05"}),
        )
        .await;
        for m in ["m1", "m2"] {
            store
                .merge_edge(&EdgeSpec::new(m, EdgeType::Concerns, "p"))
                .await
                .unwrap();
        }

        let config = ImportConfig::default();
        let engine = RelationInferenceEngine::new(&store, &config);
        engine.run().await.unwrap();
        let edges_after_first = store.edge_count();

        engine.run().await.unwrap();
        assert_eq!(store.edge_count(), edges_after_first);
    }
}
