//! PostgreSQL implementation of the property-graph store.
//!
//! The graph lives in two tables: `graph_node(id, label, properties)` and
//! `graph_edge(from_id, edge_type, to_id, properties)`. The composite
//! edge key enforces at most one edge of a given type per ordered node
//! pair; node and edge writes are upserts that merge property maps, so
//! re-running a projection on unchanged input writes nothing new.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::{PgPool, Row};
use tracing::debug;

use korpus_core::{
    EdgeSpec, EdgeType, Error, EventView, GraphStore, JsonMap, MergeOutcome, MicroActionView,
    NodeLabel, Result,
};

use crate::views;

/// PostgreSQL-backed graph store.
pub struct PgGraphStore {
    pool: PgPool,
}

impl PgGraphStore {
    /// Create a store over an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl GraphStore for PgGraphStore {
    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS graph_node (
                 id TEXT PRIMARY KEY,
                 label TEXT NOT NULL,
                 properties JSONB NOT NULL DEFAULT '{}'::jsonb
             )",
        )
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS graph_edge (
                 from_id TEXT NOT NULL,
                 edge_type TEXT NOT NULL,
                 to_id TEXT NOT NULL,
                 properties JSONB NOT NULL DEFAULT '{}'::jsonb,
                 PRIMARY KEY (from_id, edge_type, to_id)
             )",
        )
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        for ddl in [
            "CREATE INDEX IF NOT EXISTS graph_node_label_idx ON graph_node (label)",
            "CREATE INDEX IF NOT EXISTS graph_edge_type_idx ON graph_edge (edge_type)",
            "CREATE INDEX IF NOT EXISTS graph_edge_to_idx ON graph_edge (to_id)",
        ] {
            sqlx::query(ddl)
                .execute(&self.pool)
                .await
                .map_err(Error::Database)?;
        }

        Ok(())
    }

    async fn merge_node(&self, label: NodeLabel, id: &str, properties: JsonValue) -> Result<()> {
        sqlx::query(
            "INSERT INTO graph_node (id, label, properties)
             VALUES ($1, $2, $3)
             ON CONFLICT (id) DO UPDATE
             SET label = EXCLUDED.label,
                 properties = graph_node.properties || EXCLUDED.properties",
        )
        .bind(id)
        .bind(label.as_str())
        .bind(&properties)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(())
    }

    async fn merge_edge(&self, spec: &EdgeSpec) -> Result<MergeOutcome> {
        let properties = spec
            .properties
            .clone()
            .unwrap_or_else(|| JsonValue::Object(JsonMap::new()));

        let result = sqlx::query(
            "INSERT INTO graph_edge (from_id, edge_type, to_id, properties)
             SELECT $1, $2, $3, $4
             WHERE EXISTS (
                 SELECT 1 FROM graph_node
                 WHERE id = $1 AND ($5::text[] IS NULL OR label = ANY($5))
             )
             AND EXISTS (
                 SELECT 1 FROM graph_node
                 WHERE id = $3 AND ($6::text[] IS NULL OR label = ANY($6))
             )
             ON CONFLICT (from_id, edge_type, to_id) DO UPDATE
             SET properties = graph_edge.properties || EXCLUDED.properties",
        )
        .bind(&spec.from)
        .bind(spec.edge_type.as_str())
        .bind(&spec.to)
        .bind(&properties)
        .bind(spec.from_label.allowed_labels())
        .bind(spec.to_label.allowed_labels())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            debug!(
                subsystem = "graph",
                component = "store",
                op = "merge_edge",
                edge_type = spec.edge_type.as_str(),
                record_id = %spec.from,
                "Edge endpoint missing, skipped"
            );
            Ok(MergeOutcome::MissingEndpoint)
        } else {
            Ok(MergeOutcome::Merged)
        }
    }

    async fn count_nodes(&self, label: Option<NodeLabel>) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM graph_node WHERE $1::text IS NULL OR label = $1",
        )
        .bind(label.map(|l| l.as_str()))
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(count)
    }

    async fn count_edges(&self, edge_type: Option<EdgeType>) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM graph_edge WHERE $1::text IS NULL OR edge_type = $1",
        )
        .bind(edge_type.map(|t| t.as_str()))
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(count)
    }

    async fn micro_action_views(&self) -> Result<Vec<MicroActionView>> {
        let rows = sqlx::query("SELECT id, properties FROM graph_node WHERE label = 'MicroAction'")
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        let mut by_id: HashMap<String, MicroActionView> = rows
            .into_iter()
            .map(|row| {
                let id: String = row.get("id");
                let properties: JsonValue = row.get("properties");
                let props = properties.as_object().cloned().unwrap_or_default();
                (id.clone(), views::micro_action_view(&id, &props))
            })
            .collect();

        // Concerned persons via CONCERNS/REFERENCES edges to Person nodes.
        let concern_rows = sqlx::query(
            "SELECT e.from_id, e.to_id
             FROM graph_edge e
             JOIN graph_node p ON p.id = e.to_id
             WHERE e.edge_type IN ('CONCERNS', 'REFERENCES')
               AND p.label = 'Person'",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        for row in concern_rows {
            let from_id: String = row.get("from_id");
            let to_id: String = row.get("to_id");
            if let Some(view) = by_id.get_mut(&from_id) {
                view.concerned_persons.insert(to_id);
            }
        }

        let reply_rows = sqlx::query("SELECT from_id FROM graph_edge WHERE edge_type = 'REPLIES_TO'")
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;
        let replied: HashSet<String> = reply_rows
            .into_iter()
            .map(|row| row.get::<String, _>("from_id"))
            .collect();
        for (id, view) in by_id.iter_mut() {
            view.has_reply_edge = replied.contains(id);
        }

        let mut views: Vec<MicroActionView> = by_id.into_values().collect();
        views.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(views)
    }

    async fn event_views(&self) -> Result<Vec<EventView>> {
        let rows = sqlx::query("SELECT id, properties FROM graph_node WHERE label = 'Event'")
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        let mut views: Vec<EventView> = rows
            .into_iter()
            .map(|row| {
                let id: String = row.get("id");
                let properties: JsonValue = row.get("properties");
                let props = properties.as_object().cloned().unwrap_or_default();
                views::event_view(&id, &props)
            })
            .collect();
        views.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(views)
    }
}
