//! Two-pass graph projection of canonical record batches.
//!
//! Phase order is fixed: entities (pre-sorted GPE → Organization →
//! Person), then documents, then events, then micro-actions. Within the
//! entity phase, pass 1 commits every node (entities, reified structures,
//! ownership edges) and pass 2 commits all cross-entity edges, so forward
//! references between entities resolve regardless of note order.
//!
//! Failure semantics: store/connectivity errors propagate and abort the
//! run; a missing edge endpoint is a logged warning and that single edge
//! is skipped.

use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::{info, warn};

use korpus_core::{
    CanonicalBatch, DocumentRecord, EdgeSpec, EdgeType, EdtfDate, EntityRecord, EventRecord,
    GraphStore, ImportWarnings, JsonMap, LabelFilter, MergeOutcome, MicroActionRecord, NodeLabel,
    Result, StructureKind, ACTOR_LABELS, UNKNOWN_AUTHORITY,
};

/// Commit counters for one projection run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProjectionStats {
    pub entities: u64,
    pub structure_nodes: u64,
    pub documents: u64,
    pub events: u64,
    pub micro_actions: u64,
    pub assertions: u64,
    pub edges_merged: u64,
    pub edges_dropped: u64,
}

/// Commits canonical batches to a graph store.
pub struct GraphProjector<'a> {
    store: &'a dyn GraphStore,
    stats: ProjectionStats,
}

impl<'a> GraphProjector<'a> {
    pub fn new(store: &'a dyn GraphStore) -> Self {
        Self {
            store,
            stats: ProjectionStats::default(),
        }
    }

    pub fn stats(&self) -> &ProjectionStats {
        &self.stats
    }

    pub fn into_stats(self) -> ProjectionStats {
        self.stats
    }

    /// Project a whole batch in phase order.
    pub async fn project(
        &mut self,
        batch: &mut CanonicalBatch,
        warnings: &mut ImportWarnings,
    ) -> Result<()> {
        batch.sort_entities();
        self.store.ensure_schema().await?;
        self.project_entities(&batch.entities, warnings).await?;
        self.project_documents(&batch.documents, warnings).await?;
        self.project_events(&batch.events, warnings).await?;
        self.project_micro_actions(&batch.micro_actions, warnings)
            .await?;
        Ok(())
    }

    /// Entity phase. `entities` must already be in label order.
    pub async fn project_entities(
        &mut self,
        entities: &[EntityRecord],
        warnings: &mut ImportWarnings,
    ) -> Result<()> {
        // Pass 1: nodes, structure nodes, ownership edges. Cross-entity
        // edges are deferred so forward references always resolve.
        for entity in entities {
            let mut properties = entity.properties.clone();
            properties.insert("id".to_string(), entity.id.clone().into());
            self.store
                .merge_node(
                    entity.label.node_label(),
                    &entity.id,
                    JsonValue::Object(properties),
                )
                .await?;
            self.stats.entities += 1;

            for (kind, items) in &entity.structures {
                for item in items {
                    let Some(rid) = &item.rid else {
                        warnings.log_structure_missing_rid(&entity.id, kind.as_str());
                        continue;
                    };

                    let mut properties = item.properties.clone();
                    properties.insert("rid".to_string(), rid.clone().into());
                    self.store
                        .merge_node(kind.node_label(), rid, JsonValue::Object(properties))
                        .await?;
                    self.stats.structure_nodes += 1;

                    let ownership = EdgeSpec::new(&entity.id, kind.ownership_edge(), rid)
                        .from_label(LabelFilter::Exact(entity.label.node_label()))
                        .to_label(LabelFilter::Exact(kind.node_label()));
                    self.merge_edge_soft(ownership, warnings).await?;
                }
            }
        }

        // Pass 2: specific relations, generic references, and
        // structure-internal target edges.
        for entity in entities {
            for (edge_type, targets) in &entity.specific_relations {
                for target in targets {
                    let spec = specific_relation_spec(&entity.id, *edge_type, target);
                    self.merge_edge_soft(spec, warnings).await?;
                }
            }

            for target in &entity.generic_references {
                let spec = EdgeSpec::new(&entity.id, EdgeType::References, target);
                self.merge_edge_soft(spec, warnings).await?;
            }

            for (kind, items) in &entity.structures {
                for item in items {
                    let Some(rid) = &item.rid else { continue };
                    for spec in structure_target_specs(*kind, rid, item.target_id.as_deref(), item)
                    {
                        self.merge_edge_soft(spec, warnings).await?;
                    }
                }
            }
        }

        info!(
            subsystem = "graph",
            component = "projector",
            op = "project_entities",
            record_count = entities.len(),
            "Entity phase committed"
        );
        Ok(())
    }

    /// Document phase.
    pub async fn project_documents(
        &mut self,
        documents: &[DocumentRecord],
        warnings: &mut ImportWarnings,
    ) -> Result<()> {
        for document in documents {
            let mut properties = document.properties.clone();
            properties.insert("id".to_string(), document.id.clone().into());
            self.store
                .merge_node(
                    NodeLabel::ArchiveDocument,
                    &document.id,
                    JsonValue::Object(properties),
                )
                .await?;
            self.stats.documents += 1;

            for target in &document.references {
                let spec = EdgeSpec::new(&document.id, EdgeType::References, target);
                self.merge_edge_soft(spec, warnings).await?;
            }
        }

        info!(
            subsystem = "graph",
            component = "projector",
            op = "project_documents",
            record_count = documents.len(),
            "Document phase committed"
        );
        Ok(())
    }

    /// Event phase.
    pub async fn project_events(
        &mut self,
        events: &[EventRecord],
        warnings: &mut ImportWarnings,
    ) -> Result<()> {
        for event in events {
            let mut properties = event.properties.clone();
            rederive_dates(&mut properties);
            let victim_id = prop_string(&properties, "victim_id");
            let agent_id = prop_string(&properties, "agent_id");
            let place_id = prop_string(&properties, "place_id");

            self.store
                .merge_node(NodeLabel::Event, &event.id, JsonValue::Object(properties))
                .await?;
            self.stats.events += 1;

            self.merge_assertion(&event.id, NodeLabel::Event, &event.assertion, warnings)
                .await?;

            if let Some(victim_id) = victim_id {
                let spec = EdgeSpec::new(&victim_id, EdgeType::WasVictimOf, &event.id)
                    .from_label(LabelFilter::Exact(NodeLabel::Person))
                    .to_label(LabelFilter::Exact(NodeLabel::Event));
                self.merge_edge_soft(spec, warnings).await?;
            }

            if let Some(agent_id) = agent_id.filter(|id| id != UNKNOWN_AUTHORITY) {
                let spec = EdgeSpec::new(&agent_id, EdgeType::ActedAsAgent, &event.id)
                    .to_label(LabelFilter::Exact(NodeLabel::Event));
                self.merge_edge_soft(spec, warnings).await?;
            }

            if let Some(place_id) = place_id {
                let spec = EdgeSpec::new(&event.id, EdgeType::OccurredAt, &place_id)
                    .from_label(LabelFilter::Exact(NodeLabel::Event))
                    .to_label(LabelFilter::Exact(NodeLabel::Gpe));
                self.merge_edge_soft(spec, warnings).await?;
            }

            for target in &event.references {
                let spec = EdgeSpec::new(&event.id, EdgeType::References, target);
                self.merge_edge_soft(spec, warnings).await?;
            }
        }

        info!(
            subsystem = "graph",
            component = "projector",
            op = "project_events",
            record_count = events.len(),
            "Event phase committed"
        );
        Ok(())
    }

    /// Micro-action phase.
    pub async fn project_micro_actions(
        &mut self,
        micro_actions: &[MicroActionRecord],
        warnings: &mut ImportWarnings,
    ) -> Result<()> {
        for micro in micro_actions {
            let mut properties = micro.properties.clone();
            rederive_dates(&mut properties);
            let actor_id = prop_string(&properties, "actor_id");
            let recipient_id = prop_string(&properties, "recipient_id");
            let about_id = prop_string(&properties, "about_id");

            self.store
                .merge_node(
                    NodeLabel::MicroAction,
                    &micro.id,
                    JsonValue::Object(properties),
                )
                .await?;
            self.stats.micro_actions += 1;

            self.merge_assertion(&micro.id, NodeLabel::MicroAction, &micro.assertion, warnings)
                .await?;

            if let Some(actor_id) = actor_id {
                let spec = EdgeSpec::new(&actor_id, EdgeType::Performed, &micro.id)
                    .from_label(LabelFilter::OneOf(ACTOR_LABELS))
                    .to_label(LabelFilter::Exact(NodeLabel::MicroAction));
                self.merge_edge_soft(spec, warnings).await?;
            }

            if let Some(recipient_id) = recipient_id {
                let spec = EdgeSpec::new(&micro.id, EdgeType::Received, &recipient_id)
                    .from_label(LabelFilter::Exact(NodeLabel::MicroAction))
                    .to_label(LabelFilter::OneOf(ACTOR_LABELS));
                self.merge_edge_soft(spec, warnings).await?;
            }

            if let Some(about_id) = about_id {
                let spec = EdgeSpec::new(&micro.id, EdgeType::Concerns, &about_id)
                    .from_label(LabelFilter::Exact(NodeLabel::MicroAction))
                    .to_label(LabelFilter::Exact(NodeLabel::Person));
                self.merge_edge_soft(spec, warnings).await?;
            }

            for target in &micro.references {
                let spec = EdgeSpec::new(&micro.id, EdgeType::References, target);
                self.merge_edge_soft(spec, warnings).await?;
            }
        }

        info!(
            subsystem = "graph",
            component = "projector",
            op = "project_micro_actions",
            record_count = micro_actions.len(),
            "Micro-action phase committed"
        );
        Ok(())
    }

    async fn merge_assertion(
        &mut self,
        claimed_id: &str,
        claimed_label: NodeLabel,
        assertion: &korpus_core::AssertionRecord,
        warnings: &mut ImportWarnings,
    ) -> Result<()> {
        let mut properties = assertion.properties.clone();
        properties.insert("assertion_id".to_string(), assertion.id.clone().into());
        properties.insert("doc_id".to_string(), assertion.doc_id.clone().into());
        self.store
            .merge_node(
                NodeLabel::Assertion,
                &assertion.id,
                JsonValue::Object(properties),
            )
            .await?;
        self.stats.assertions += 1;

        let supports = EdgeSpec::new(&assertion.doc_id, EdgeType::Supports, &assertion.id)
            .from_label(LabelFilter::Exact(NodeLabel::ArchiveDocument))
            .to_label(LabelFilter::Exact(NodeLabel::Assertion));
        self.merge_edge_soft(supports, warnings).await?;

        let claims = EdgeSpec::new(&assertion.id, EdgeType::Claims, claimed_id)
            .from_label(LabelFilter::Exact(NodeLabel::Assertion))
            .to_label(LabelFilter::Exact(claimed_label));
        self.merge_edge_soft(claims, warnings).await?;

        Ok(())
    }

    /// Merge an edge; a missing endpoint is recorded and skipped, never
    /// fatal.
    async fn merge_edge_soft(
        &mut self,
        spec: EdgeSpec,
        warnings: &mut ImportWarnings,
    ) -> Result<()> {
        match self.store.merge_edge(&spec).await? {
            MergeOutcome::Merged => self.stats.edges_merged += 1,
            MergeOutcome::MissingEndpoint => {
                self.stats.edges_dropped += 1;
                warnings.log_dropped_edge(&spec.from, spec.edge_type.as_str(), &spec.to);
                warn!(
                    subsystem = "graph",
                    component = "projector",
                    op = "merge_edge",
                    edge_type = spec.edge_type.as_str(),
                    record_id = %spec.from,
                    "Edge target missing, skipped"
                );
            }
        }
        Ok(())
    }
}

/// Label constraints for the specific-relation edge types.
fn specific_relation_spec(from: &str, edge_type: EdgeType, to: &str) -> EdgeSpec {
    let spec = EdgeSpec::new(from, edge_type, to);
    match edge_type {
        EdgeType::LocatedIn => spec.to_label(LabelFilter::Exact(NodeLabel::Gpe)),
        EdgeType::IsPartOf => spec.to_label(LabelFilter::Exact(NodeLabel::Organization)),
        EdgeType::WorkedFor => spec
            .from_label(LabelFilter::Exact(NodeLabel::Person))
            .to_label(LabelFilter::Exact(NodeLabel::Organization)),
        _ => spec,
    }
}

/// Structure-internal target edges for one item.
fn structure_target_specs(
    kind: StructureKind,
    rid: &str,
    target_id: Option<&str>,
    item: &korpus_core::StructureItem,
) -> Vec<EdgeSpec> {
    let mut specs = Vec::new();
    let from = LabelFilter::Exact(kind.node_label());

    match kind {
        StructureKind::Occupations => {
            if let Some(org_id) = item.property_str("organization") {
                specs.push(
                    EdgeSpec::new(rid, EdgeType::AtOrganization, org_id)
                        .from_label(from)
                        .to_label(LabelFilter::Exact(NodeLabel::Organization)),
                );
            }
            if let Some(place_id) = item.property_str("place") {
                specs.push(
                    EdgeSpec::new(rid, EdgeType::AtPlace, place_id)
                        .from_label(from)
                        .to_label(LabelFilter::Exact(NodeLabel::Gpe)),
                );
            }
        }
        StructureKind::Origins | StructureKind::Residences => {
            if let Some(place_id) = item.property_str("place") {
                specs.push(
                    EdgeSpec::new(rid, EdgeType::AtPlace, place_id)
                        .from_label(from)
                        .to_label(LabelFilter::Exact(NodeLabel::Gpe)),
                );
            }
        }
        StructureKind::FamilyRelations => {
            if let Some(target) = target_id {
                specs.push(
                    EdgeSpec::new(rid, EdgeType::RelatesTo, target)
                        .from_label(from)
                        .to_label(LabelFilter::Exact(NodeLabel::Person)),
                );
            }
        }
        StructureKind::ProfessionalRelations => {
            if let Some(target) = target_id {
                specs.push(EdgeSpec::new(rid, EdgeType::RelatesTo, target).from_label(from));
            }
            if let Some(org_id) = item.property_str("organization_context") {
                specs.push(
                    EdgeSpec::new(rid, EdgeType::InContextOf, org_id)
                        .from_label(from)
                        .to_label(LabelFilter::Exact(NodeLabel::Organization)),
                );
            }
        }
        StructureKind::Names => {}
    }

    specs
}

/// Re-derive stored date fields from the raw expression at commit time,
/// so stored dates always agree with the stored expression. Absent bounds
/// are written as explicit nulls to overwrite stale merged values.
fn rederive_dates(properties: &mut JsonMap) {
    let date = properties
        .get("date_edtf")
        .and_then(|v| v.as_str())
        .map(EdtfDate::parse)
        .unwrap_or_default();

    properties.insert(
        "date_start".to_string(),
        date.start.clone().map(Into::into).unwrap_or(JsonValue::Null),
    );
    properties.insert(
        "date_end".to_string(),
        date.end.clone().map(Into::into).unwrap_or(JsonValue::Null),
    );
    properties.insert(
        "date_precision".to_string(),
        date.precision.as_str().into(),
    );
    properties.insert("gap_flag".to_string(), date.is_open().into());
}

fn prop_string(properties: &JsonMap, key: &str) -> Option<String> {
    properties.get(key)?.as_str().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rederive_dates_from_expression() {
        let mut props = JsonMap::new();
        props.insert("date_edtf".to_string(), "1942-03".into());
        rederive_dates(&mut props);

        assert_eq!(props.get("date_start").and_then(|v| v.as_str()), Some("1942-03-01"));
        assert_eq!(props.get("date_end").and_then(|v| v.as_str()), Some("1942-03-31"));
        assert_eq!(props.get("date_precision").and_then(|v| v.as_str()), Some("month"));
        assert_eq!(props.get("gap_flag").and_then(|v| v.as_bool()), Some(false));
    }

    #[test]
    fn test_rederive_dates_open_interval_nulls_missing_bound() {
        let mut props = JsonMap::new();
        props.insert("date_edtf".to_string(), "../1945-05-08".into());
        // Simulate a stale value from an earlier import.
        props.insert("date_start".to_string(), "1942-01-01".into());
        rederive_dates(&mut props);

        assert!(props.get("date_start").unwrap().is_null());
        assert_eq!(props.get("date_end").and_then(|v| v.as_str()), Some("1945-05-08"));
        assert_eq!(props.get("gap_flag").and_then(|v| v.as_bool()), Some(true));
    }

    #[test]
    fn test_rederive_dates_without_expression() {
        let mut props = JsonMap::new();
        rederive_dates(&mut props);
        assert_eq!(props.get("date_precision").and_then(|v| v.as_str()), Some("unknown"));
        assert_eq!(props.get("gap_flag").and_then(|v| v.as_bool()), Some(true));
    }

    #[test]
    fn test_specific_relation_label_constraints() {
        let spec = specific_relation_spec("a", EdgeType::WorkedFor, "b");
        assert_eq!(spec.from_label, LabelFilter::Exact(NodeLabel::Person));
        assert_eq!(spec.to_label, LabelFilter::Exact(NodeLabel::Organization));

        let spec = specific_relation_spec("a", EdgeType::LocatedIn, "b");
        assert_eq!(spec.to_label, LabelFilter::Exact(NodeLabel::Gpe));
    }
}
