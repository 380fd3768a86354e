//! Phase-ordered import pipeline.
//!
//! vault → per-note extraction (parallel, failure-isolated) → document-id
//! assignment (path-sorted, shared registry) → consistency validation →
//! projection (entities → documents → events → micro-actions) →
//! inference → report.
//!
//! Notes parse on blocking tasks with no shared mutable state; the
//! collision registry is consulted afterwards over path-sorted records,
//! so derived ids do not depend on task scheduling. Projection phases
//! retry transient backend failures a bounded number of times and abort
//! the run on persistent loss.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::task::JoinSet;
use tracing::info;

use korpus_core::{
    shared_registry, CanonicalBatch, ConsistencyValidator, Error, GraphStore, ImportConfig, Result,
};
use korpus_extract::{collect_notes, extract_note, NoteExtraction};
use korpus_graph::{GraphProjector, RelationInferenceEngine};

use crate::report::ImportReport;
use crate::retry::retry_phase;

/// One-shot import pipeline over a graph store.
pub struct ImportPipeline<S: GraphStore + 'static> {
    store: Arc<S>,
    config: ImportConfig,
}

impl<S: GraphStore + 'static> ImportPipeline<S> {
    pub fn new(store: Arc<S>, config: ImportConfig) -> Self {
        Self { store, config }
    }

    /// Run the full pipeline against a vault directory.
    pub async fn run(&self, vault_path: &Path) -> Result<ImportReport> {
        let started_at = Utc::now();
        let start = Instant::now();

        // ── Phase 1: extraction ────────────────────────────────────────
        let vault = vault_path.to_path_buf();
        let (notes, mut warnings) = tokio::task::spawn_blocking(move || collect_notes(&vault))
            .await
            .map_err(|e| Error::Internal(format!("note collection task failed: {e}")))??;
        let notes_scanned = notes.len();

        let mut extractions: Vec<Option<NoteExtraction>> =
            (0..notes.len()).map(|_| None).collect();
        let mut tasks: JoinSet<(usize, NoteExtraction)> = JoinSet::new();
        for (index, note) in notes.into_iter().enumerate() {
            let config = self.config.clone();
            tasks.spawn_blocking(move || (index, extract_note(&note, &config)));
        }
        while let Some(joined) = tasks.join_next().await {
            let (index, extraction) =
                joined.map_err(|e| Error::Internal(format!("extraction task failed: {e}")))?;
            extractions[index] = Some(extraction);
        }

        // Reassemble in path order; the only cross-note state is the
        // document-id registry, consulted here deterministically.
        let registry = shared_registry();
        let mut batch = CanonicalBatch::default();

        for extraction in extractions.into_iter().flatten() {
            warnings.merge(extraction.warnings);

            if let Some(entity) = extraction.entity {
                batch.entities.push(entity);
            }
            if let Some(pending) = extraction.document {
                let id = registry.lock().unwrap().assign(
                    &pending.file_name,
                    &pending.rel_path,
                    &mut warnings,
                );
                batch.documents.push(pending.into_record(id));
            }
            batch.events.extend(extraction.events);
            batch.micro_actions.extend(extraction.micro_actions);
        }

        info!(
            subsystem = "import",
            component = "pipeline",
            op = "extract",
            note_count = notes_scanned,
            record_count = batch.entities.len()
                + batch.documents.len()
                + batch.events.len()
                + batch.micro_actions.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Extraction phase complete"
        );

        // ── Phase 2: validation ────────────────────────────────────────
        let mut validator = ConsistencyValidator::new(&self.config);
        validator.validate_entities(&batch.entities)?;
        validator.validate_events(&mut batch.events)?;
        validator.validate_micro_actions(&batch.micro_actions)?;
        let validation = validator.into_counts();

        // ── Phase 3: projection ────────────────────────────────────────
        batch.sort_entities();
        let store = self.store.as_ref();

        retry_phase!(self.config, "ensure_schema", store.ensure_schema().await);

        let mut projector = GraphProjector::new(store);
        retry_phase!(
            self.config,
            "project_entities",
            projector.project_entities(&batch.entities, &mut warnings).await
        );
        retry_phase!(
            self.config,
            "project_documents",
            projector.project_documents(&batch.documents, &mut warnings).await
        );
        retry_phase!(
            self.config,
            "project_events",
            projector.project_events(&batch.events, &mut warnings).await
        );
        retry_phase!(
            self.config,
            "project_micro_actions",
            projector
                .project_micro_actions(&batch.micro_actions, &mut warnings)
                .await
        );
        let projection = projector.into_stats();

        // ── Phase 4: inference ─────────────────────────────────────────
        let inference = if self.config.calculated_relations {
            let engine = RelationInferenceEngine::new(store, &self.config);
            retry_phase!(self.config, "inference", engine.run().await)
        } else {
            Default::default()
        };

        let total_nodes = store.count_nodes(None).await?;
        let total_edges = store.count_edges(None).await?;

        let report = ImportReport {
            started_at,
            duration_ms: start.elapsed().as_millis() as u64,
            notes_scanned,
            projection,
            inference,
            validation,
            warnings: warnings.counts(),
            total_nodes,
            total_edges,
        };

        info!(
            subsystem = "import",
            component = "pipeline",
            op = "run",
            note_count = notes_scanned,
            duration_ms = report.duration_ms,
            success = true,
            "Import run complete"
        );
        Ok(report)
    }
}
