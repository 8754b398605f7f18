//! Relational store port: the Postgres-backed tables that hold the
//! documentation pipeline's durable state, per §6.

use async_trait::async_trait;

use crate::entities::{Document, DocumentChunk, DocumentLink, DriftAnalysis, ProjectMetadata};
use crate::error::Result;

/// The relational tables named in §6: `documents`, `document_chunks`,
/// `document_links`, `drift_analyses`, plus project-scoped metadata.
#[async_trait]
pub trait RelationalStore: Send + Sync {
    /// Insert or update a document row, keyed by the unique
    /// `(project_name, file_path)` pair.
    async fn upsert_document(&self, document: &Document) -> Result<()>;

    /// Every document row for `project_name`, ordered by file path.
    async fn documents_for_project(&self, project_name: &str) -> Result<Vec<Document>>;

    /// The document row at `(project_name, file_path)`, if indexed.
    async fn document_by_path(&self, project_name: &str, file_path: &str) -> Result<Option<Document>>;

    /// Delete every chunk owned by `document_id`, cascading to their links.
    async fn delete_chunks_for_document(&self, document_id: crate::value_objects::DocumentId) -> Result<()>;

    /// Insert freshly computed chunks for a document.
    async fn insert_chunks(&self, chunks: &[DocumentChunk]) -> Result<()>;

    /// Fetch the current chunks for a document.
    async fn chunks_for_document(&self, document_id: crate::value_objects::DocumentId) -> Result<Vec<DocumentChunk>>;

    /// Update the persisted drift status/score on a chunk.
    async fn update_chunk_drift(
        &self,
        chunk_id: crate::value_objects::ChunkId,
        status: crate::entities::DriftStatus,
        score: Option<f64>,
    ) -> Result<()>;

    /// Replace the links for `chunk_id` with `links`.
    async fn replace_links(&self, chunk_id: crate::value_objects::ChunkId, links: &[DocumentLink]) -> Result<()>;

    /// Fetch the current links for a chunk.
    async fn links_for_chunk(&self, chunk_id: crate::value_objects::ChunkId) -> Result<Vec<DocumentLink>>;

    /// Persist a drift analysis result.
    async fn insert_drift_analysis(&self, analysis: &DriftAnalysis) -> Result<()>;

    /// The highest-`drift_score` analysis on record for `(chunk_id,
    /// entity_qn)`, used when multiple links of the same chunk touch the
    /// same entity (§4.12).
    async fn latest_drift_for_entity(
        &self,
        chunk_id: crate::value_objects::ChunkId,
        entity_qn: &str,
    ) -> Result<Option<DriftAnalysis>>;

    /// Persist one project summary generation run, writing both the
    /// `project_metadata` row (keyed uniquely by `project_name`) and a
    /// `metadata_generation_log` entry.
    async fn upsert_project_metadata(&self, metadata: &ProjectMetadata) -> Result<()>;

    /// The current project summary, if one has ever been generated.
    async fn latest_project_metadata(&self, project_name: &str) -> Result<Option<ProjectMetadata>>;

    /// Remove every row for `project_name` across all tables.
    async fn delete_project_data(&self, project_name: &str) -> Result<()>;

    /// Whether the store can currently be reached.
    async fn ping(&self) -> Result<()>;
}
