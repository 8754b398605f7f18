//! Project metadata generator: `metadata::regenerate` as a single bounded
//! LLM call per project, producing the free-text summary `metadata show`
//! later reads back.

use std::sync::Arc;

use chrono::Utc;
use codegraph_domain::constants::retry::{backoff_delay, DEFAULT_MAX_RETRIES};
use codegraph_domain::entities::{Project, ProjectMetadata};
use codegraph_domain::ports::{ChatMessage, LlmProvider, RelationalStore};
use codegraph_domain::Result;
use tracing::warn;

fn render_prompt(project: &Project, file_count: usize, top_level_entity_names: &[String]) -> Vec<ChatMessage> {
    let system = ChatMessage::system(
        "You write a concise, high-level summary of a codebase for a project dashboard. \
         Reply with plain text, three to six sentences, no markdown.",
    );
    let counts: String = project.entity_counts.iter().map(|(label, count)| format!("{label}: {count}")).collect::<Vec<_>>().join(", ");
    let user = ChatMessage::user(format!(
        "Project: {}\nFiles indexed: {file_count}\nEntity counts: {counts}\nA sample of top-level entities: {}\n",
        project.name,
        top_level_entity_names.join(", ")
    ));
    vec![system, user]
}

/// Generates and persists one [`ProjectMetadata`] summary per call.
pub struct MetadataGenerator {
    llm: Arc<dyn LlmProvider>,
    relational: Arc<dyn RelationalStore>,
}

impl MetadataGenerator {
    #[must_use]
    pub fn new(llm: Arc<dyn LlmProvider>, relational: Arc<dyn RelationalStore>) -> Self {
        Self { llm, relational }
    }

    /// Render the prompt, call the LLM with retry-on-rate-limit, and persist
    /// the resulting summary. A permanent LLM failure propagates as a
    /// [`codegraph_domain::Error::Metadata`] — unlike the summarizer and
    /// drift detector, `metadata regenerate` is a direct, single-shot CLI
    /// command with nothing to silently degrade to.
    pub async fn regenerate(&self, project: &Project, file_count: usize, top_level_entity_names: &[String], triggered_by: &str) -> Result<ProjectMetadata> {
        let messages = render_prompt(project, file_count, top_level_entity_names);

        let mut attempt = 0u32;
        let summary = loop {
            match self.llm.complete(&messages, Some(512), Some(0.3)).await {
                Ok(text) => break text,
                Err(err) if matches!(err, codegraph_domain::Error::RateLimit { .. }) && attempt < DEFAULT_MAX_RETRIES => {
                    let delay = backoff_delay(attempt);
                    warn!(attempt, delay_secs = delay.as_secs(), "metadata generation rate-limited, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(codegraph_domain::Error::metadata(err.to_string())),
            }
        };

        let metadata = ProjectMetadata { project_name: project.name.clone(), summary, triggered_by: triggered_by.to_owned(), generated_at: Utc::now() };

        self.relational.upsert_project_metadata(&metadata).await?;
        Ok(metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use codegraph_domain::entities::{Document, DocumentChunk, DocumentLink, DriftAnalysis, DriftStatus};
    use codegraph_domain::value_objects::{ChunkId, DocumentId};
    use std::path::PathBuf;
    use std::sync::Mutex;

    struct StubLlm {
        reply: String,
    }

    #[async_trait]
    impl LlmProvider for StubLlm {
        async fn complete(&self, _messages: &[ChatMessage], _max_tokens: Option<u32>, _temperature: Option<f32>) -> Result<String> {
            Ok(self.reply.clone())
        }
    }

    #[derive(Default)]
    struct RecordingRelationalStore {
        saved: Mutex<Vec<ProjectMetadata>>,
    }

    #[async_trait]
    impl RelationalStore for RecordingRelationalStore {
        async fn upsert_document(&self, _document: &Document) -> Result<()> {
            Ok(())
        }
        async fn documents_for_project(&self, _project_name: &str) -> Result<Vec<Document>> {
            Ok(vec![])
        }
        async fn document_by_path(&self, _project_name: &str, _file_path: &str) -> Result<Option<Document>> {
            Ok(None)
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
        async fn upsert_project_metadata(&self, metadata: &ProjectMetadata) -> Result<()> {
            self.saved.lock().unwrap().push(metadata.clone());
            Ok(())
        }
        async fn latest_project_metadata(&self, _project_name: &str) -> Result<Option<ProjectMetadata>> {
            Ok(self.saved.lock().unwrap().last().cloned())
        }
        async fn delete_project_data(&self, _project_name: &str) -> Result<()> {
            Ok(())
        }
        async fn ping(&self) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn regenerate_persists_generated_summary() {
        let llm = Arc::new(StubLlm { reply: "A Python web service for X.".to_owned() });
        let relational = Arc::new(RecordingRelationalStore::default());
        let generator = MetadataGenerator::new(llm, Arc::clone(&relational) as Arc<dyn RelationalStore>);
        let project = Project::new("proj", PathBuf::from("/repo"));

        let metadata = generator.regenerate(&project, 42, &["proj.app.main".to_owned()], "manual").await.expect("regenerate ok");
        assert_eq!(metadata.summary, "A Python web service for X.");
        assert_eq!(relational.saved.lock().unwrap().len(), 1);
    }
}
