//! Project manager (§4.15): lifecycle of named projects across the graph,
//! vector, and relational stores.

use std::sync::Arc;

use codegraph_domain::ports::{GraphStore, PayloadFilter, RelationalStore, VectorStore};
use codegraph_domain::Result;
use serde_json::json;

use crate::constants::SUMMARIES_COLLECTION;
use crate::vector_indexer::CODE_CHUNKS_COLLECTION;

/// One row of [`ProjectManager::list_projects`].
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectSummary {
    pub name: String,
    pub root_path: String,
    pub last_indexed_at: Option<String>,
}

/// [`ProjectManager::get_project`]'s detail view: the summary plus a count
/// of graph nodes per label, keyed the same way as `Project::entity_counts`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProjectDetail {
    pub name: String,
    pub root_path: String,
    pub last_indexed_at: Option<String>,
    pub entity_counts: std::collections::BTreeMap<String, usize>,
}

const COUNTED_LABELS: &[&str] = &["File", "Class", "Function", "Method", "Import"];

/// Queries and deletes spanning the three stores for one named project.
pub struct ProjectManager {
    graph: Arc<dyn GraphStore>,
    vector: Arc<dyn VectorStore>,
    relational: Arc<dyn RelationalStore>,
}

impl ProjectManager {
    #[must_use]
    pub fn new(graph: Arc<dyn GraphStore>, vector: Arc<dyn VectorStore>, relational: Arc<dyn RelationalStore>) -> Self {
        Self { graph, vector, relational }
    }

    /// Every indexed project, as recorded by `GraphWriter::upsert_project`.
    pub async fn list_projects(&self) -> Result<Vec<ProjectSummary>> {
        let rows = self.graph.execute("MATCH (p:Project) RETURN p.name AS name, p.root_path AS root_path, p.last_indexed_at AS last_indexed_at", json!({})).await?;
        Ok(rows.into_iter().filter_map(|row| row_to_summary(&row)).collect())
    }

    /// `name`'s root path, last-indexed timestamp, and a per-label entity
    /// count. Returns `None` if no `Project` node with this name exists.
    pub async fn get_project(&self, name: &str) -> Result<Option<ProjectDetail>> {
        let rows = self
            .graph
            .execute("MATCH (p:Project {name: $name}) RETURN p.name AS name, p.root_path AS root_path, p.last_indexed_at AS last_indexed_at", json!({"name": name}))
            .await?;
        let Some(summary) = rows.first().and_then(row_to_summary) else {
            return Ok(None);
        };

        let mut entity_counts = std::collections::BTreeMap::new();
        for label in COUNTED_LABELS {
            let count_rows = self
                .graph
                .execute(&format!("MATCH (n:{label} {{project_name: $name}}) RETURN count(n) AS count"), json!({"name": name}))
                .await?;
            let count = count_rows.first().and_then(|row| row.get_i64("count")).unwrap_or(0).max(0) as usize;
            entity_counts.insert((*label).to_owned(), count);
        }

        Ok(Some(ProjectDetail { name: summary.name, root_path: summary.root_path, last_indexed_at: summary.last_indexed_at, entity_counts }))
    }

    /// Delete `name` from every store: vector points by `project_name`
    /// across `code_chunks` and `summaries`, the `Project` node and every
    /// entity and `Import` it defines (detach-deleted), and every
    /// documentation row owned by the project.
    pub async fn delete_project(&self, name: &str) -> Result<()> {
        self.vector.delete_by_filter(CODE_CHUNKS_COLLECTION, PayloadFilter::eq("project_name", name.to_owned())).await?;
        self.vector.delete_by_filter(SUMMARIES_COLLECTION, PayloadFilter::eq("project_name", name.to_owned())).await?;

        self.graph
            .execute(
                "MATCH (p:Project {name: $name}) OPTIONAL MATCH (p)<-[:DEFINES|DEFINES_METHOD*0..2]-(e) OPTIONAL MATCH (e)-[:IMPORTS]->(i:Import) DETACH DELETE p, e, i",
                json!({"name": name}),
            )
            .await?;
        self.graph
            .execute("MATCH (f:File {project_name: $name}) OPTIONAL MATCH (f)-[:DEFINES|DEFINES_METHOD*0..2]->(e) OPTIONAL MATCH (f)-[:IMPORTS]->(i:Import) DETACH DELETE f, e, i", json!({"name": name}))
            .await?;

        self.relational.delete_project_data(name).await?;
        Ok(())
    }
}

fn row_to_summary(row: &codegraph_domain::ports::GraphRow) -> Option<ProjectSummary> {
    let name = row.get_str("name")?.to_owned();
    let root_path = row.get_str("root_path").unwrap_or_default().to_owned();
    let last_indexed_at = row.get_str("last_indexed_at").map(str::to_owned);
    Some(ProjectSummary { name, root_path, last_indexed_at })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use codegraph_domain::entities::{Document, DocumentChunk, DocumentLink, DriftAnalysis, DriftStatus, ProjectMetadata};
    use codegraph_domain::ports::{GraphRow, VectorPoint, VectorSearchHit};
    use codegraph_domain::value_objects::{ChunkId, DocumentId};
    use std::sync::Mutex;

    fn project_row() -> GraphRow {
        GraphRow(std::collections::BTreeMap::from([("name".to_owned(), json!("proj")), ("root_path".to_owned(), json!("/repo")), ("last_indexed_at".to_owned(), json!("2026-01-01T00:00:00Z"))]))
    }

    #[derive(Default)]
    struct FakeGraphStore {
        queries: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl GraphStore for FakeGraphStore {
        async fn execute(&self, query: &str, _params: serde_json::Value) -> Result<Vec<GraphRow>> {
            self.queries.lock().unwrap().push(query.to_owned());
            if query.contains("RETURN p.name") {
                return Ok(vec![project_row()]);
            }
            if query.contains("count(n)") {
                return Ok(vec![GraphRow(std::collections::BTreeMap::from([("count".to_owned(), json!(3))]))]);
            }
            Ok(vec![])
        }
        async fn ping(&self) -> Result<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeVectorStore {
        deletes: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl VectorStore for FakeVectorStore {
        async fn ensure_collection(&self, _collection: &str, _dimensions: usize) -> Result<()> {
            Ok(())
        }
        async fn upsert(&self, _collection: &str, _points: Vec<VectorPoint>) -> Result<()> {
            Ok(())
        }
        async fn delete_by_filter(&self, collection: &str, _filter: PayloadFilter) -> Result<()> {
            self.deletes.lock().unwrap().push(collection.to_owned());
            Ok(())
        }
        async fn search(&self, _collection: &str, _query_vector: &[f32], _limit: usize, _filter: Option<PayloadFilter>) -> Result<Vec<VectorSearchHit>> {
            Ok(vec![])
        }
        async fn scroll_by_filter(&self, _collection: &str, _filter: PayloadFilter, _limit: usize) -> Result<Vec<VectorSearchHit>> {
            Ok(vec![])
        }
        async fn ping(&self) -> Result<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeRelationalStore {
        deleted_projects: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl RelationalStore for FakeRelationalStore {
        async fn documents_for_project(&self, _project_name: &str) -> Result<Vec<Document>> {
            Ok(vec![])
        }
        async fn document_by_path(&self, _project_name: &str, _file_path: &str) -> Result<Option<Document>> {
            Ok(None)
        }
        async fn upsert_document(&self, _document: &Document) -> Result<()> {
            Ok(())
        }
        async fn delete_chunks_for_document(&self, _document_id: DocumentId) -> Result<()> {
            Ok(())
        }
        async fn insert_chunks(&self, _chunks: &[DocumentChunk]) -> Result<()> {
            Ok(())
        }
        async fn chunks_for_document(&self, _document_id: DocumentId) -> Result<Vec<DocumentChunk>> {
            Ok(vec![])
        }
        async fn update_chunk_drift(&self, _chunk_id: ChunkId, _status: DriftStatus, _score: Option<f64>) -> Result<()> {
            Ok(())
        }
        async fn replace_links(&self, _chunk_id: ChunkId, _links: &[DocumentLink]) -> Result<()> {
            Ok(())
        }
        async fn links_for_chunk(&self, _chunk_id: ChunkId) -> Result<Vec<DocumentLink>> {
            Ok(vec![])
        }
        async fn insert_drift_analysis(&self, _analysis: &DriftAnalysis) -> Result<()> {
            Ok(())
        }
        async fn latest_drift_for_entity(&self, _chunk_id: ChunkId, _entity_qn: &str) -> Result<Option<DriftAnalysis>> {
            Ok(None)
        }
        async fn upsert_project_metadata(&self, _metadata: &ProjectMetadata) -> Result<()> {
            Ok(())
        }
        async fn latest_project_metadata(&self, _project_name: &str) -> Result<Option<ProjectMetadata>> {
            Ok(None)
        }
        async fn delete_project_data(&self, project_name: &str) -> Result<()> {
            self.deleted_projects.lock().unwrap().push(project_name.to_owned());
            Ok(())
        }
        async fn ping(&self) -> Result<()> {
            Ok(())
        }
    }

    fn manager() -> (ProjectManager, Arc<FakeVectorStore>, Arc<FakeRelationalStore>) {
        let vector = Arc::new(FakeVectorStore::default());
        let relational = Arc::new(FakeRelationalStore::default());
        let manager = ProjectManager::new(Arc::new(FakeGraphStore::default()), Arc::clone(&vector) as Arc<dyn VectorStore>, Arc::clone(&relational) as Arc<dyn RelationalStore>);
        (manager, vector, relational)
    }

    #[tokio::test]
    async fn get_project_returns_detail_with_counts() {
        let (manager, _, _) = manager();
        let detail = manager.get_project("proj").await.expect("query ok").expect("project exists");
        assert_eq!(detail.root_path, "/repo");
        assert_eq!(detail.entity_counts["Function"], 3);
        assert_eq!(detail.entity_counts.len(), COUNTED_LABELS.len());
    }

    #[tokio::test]
    async fn delete_project_clears_vector_and_relational_stores() {
        let (manager, vector, relational) = manager();
        manager.delete_project("proj").await.expect("delete ok");
        assert_eq!(*vector.deletes.lock().unwrap(), vec!["code_chunks", "summaries"]);
        assert_eq!(*relational.deleted_projects.lock().unwrap(), vec!["proj"]);
    }
}
