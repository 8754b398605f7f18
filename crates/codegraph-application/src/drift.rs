//! LLM-backed documentation drift detector (§4.12): compares one document
//! chunk against the code entity it links to and persists the verdict.

use std::sync::Arc;

use chrono::Utc;
use codegraph_domain::constants::retry::{backoff_delay, DEFAULT_MAX_RETRIES};
use codegraph_domain::entities::{DriftAnalysis, DriftIssue, DriftSeverity};
use codegraph_domain::ports::{ChatMessage, LlmProvider, RelationalStore};
use codegraph_domain::value_objects::{ChunkId, Language};
use codegraph_domain::Result;
use codegraph_utils::parse_tolerant;
use serde::Deserialize;
use tokio::sync::Semaphore;
use tracing::warn;

/// One (document chunk, linked entity) pair submitted for drift analysis.
pub struct DriftInput<'a> {
    pub chunk_id: ChunkId,
    pub doc_path: &'a str,
    pub entity_qn: &'a str,
    pub entity_kind: &'a str,
    pub file_path: &'a str,
    pub doc_excerpt: &'a str,
    pub doc_hash: &'a str,
    pub code_content: &'a str,
    pub code_hash: &'a str,
    pub language: Language,
    pub trigger: &'a str,
}

#[derive(Debug, Deserialize)]
struct DriftVerdict {
    relevant: bool,
    drift_detected: bool,
    drift_severity: DriftSeverity,
    drift_score: f64,
    #[serde(default)]
    issues: Vec<DriftIssue>,
    summary: String,
}

fn render_prompt(input: &DriftInput<'_>) -> Vec<ChatMessage> {
    let system = ChatMessage::system(
        "You compare a documentation passage against the code entity it claims to describe \
         and judge whether the documentation has drifted out of sync. Reply with JSON only: \
         {\"relevant\": bool, \"drift_detected\": bool, \"drift_severity\": \"none\"|\"minor\"|\"major\", \
         \"drift_score\": number between 0 and 1, \"issues\": [{\"description\": string, \"doc_quote\": string, \"code_quote\": string}], \
         \"summary\": string}. Set relevant to false if the documentation does not actually describe this entity.",
    );
    let user = ChatMessage::user(format!(
        "Entity: {} ({}) in {} [{}]\n\nDocumentation ({}):\n{}\n\nCode:\n{}\n",
        input.entity_qn, input.entity_kind, input.file_path, input.language, input.doc_path, input.doc_excerpt, input.code_content
    ));
    vec![system, user]
}

/// Gates concurrent drift analyses within a project (§5: default 1, "to
/// protect rate limits").
pub struct DriftDetector {
    llm: Arc<dyn LlmProvider>,
    relational: Arc<dyn RelationalStore>,
    semaphore: Arc<Semaphore>,
}

impl DriftDetector {
    #[must_use]
    pub fn new(llm: Arc<dyn LlmProvider>, relational: Arc<dyn RelationalStore>, max_parallel: usize) -> Self {
        Self { llm, relational, semaphore: Arc::new(Semaphore::new(max_parallel.max(1))) }
    }

    /// Run one drift analysis, persist it if it is relevant and beats the
    /// current best analysis on record for `(chunk_id, entity_qn)`, and
    /// update the owning chunk's drift status. Returns the analysis that
    /// ended up persisted, or `None` if the pair was judged irrelevant, the
    /// LLM call failed permanently, or its reply was malformed.
    pub async fn analyze(&self, input: DriftInput<'_>) -> Result<Option<DriftAnalysis>> {
        let _permit = self.semaphore.acquire().await.map_err(|e| codegraph_domain::Error::llm(e.to_string()))?;
        let messages = render_prompt(&input);

        let Some(reply) = self.complete_with_retry(&messages).await else {
            return Ok(None);
        };

        let verdict: DriftVerdict = match parse_tolerant(&reply) {
            Ok(v) => v,
            Err(err) => {
                warn!(error = %err, entity_qn = input.entity_qn, "drift verdict was unparseable JSON, skipping");
                return Ok(None);
            }
        };

        if !verdict.relevant {
            return Ok(None);
        }

        let (severity, score, detected) =
            if verdict.drift_detected { (verdict.drift_severity, verdict.drift_score.clamp(0.0, 1.0), true) } else { (DriftSeverity::None, 0.0, false) };

        let analysis = DriftAnalysis {
            chunk_id: input.chunk_id,
            doc_path: input.doc_path.to_owned(),
            entity_qn: input.entity_qn.to_owned(),
            trigger: input.trigger.to_owned(),
            drift_detected: detected,
            drift_severity: severity,
            drift_score: score,
            issues: verdict.issues,
            explanation: verdict.summary,
            doc_excerpt: input.doc_excerpt.to_owned(),
            code_excerpt: input.code_content.to_owned(),
            doc_version_hash: input.doc_hash.to_owned(),
            code_version_hash: input.code_hash.to_owned(),
            analyzed_at: Utc::now(),
        };

        let existing = self.relational.latest_drift_for_entity(input.chunk_id, input.entity_qn).await?;
        if let Some(existing) = &existing {
            if existing.drift_score >= analysis.drift_score {
                return Ok(None);
            }
        }

        self.relational.insert_drift_analysis(&analysis).await?;
        self.relational.update_chunk_drift(input.chunk_id, analysis.drift_severity.to_status(), Some(analysis.drift_score)).await?;

        Ok(Some(analysis))
    }

    async fn complete_with_retry(&self, messages: &[ChatMessage]) -> Option<String> {
        let mut attempt = 0u32;
        loop {
            match self.llm.complete(messages, Some(1024), Some(0.0)).await {
                Ok(text) => return Some(text),
                Err(err) if matches!(err, codegraph_domain::Error::RateLimit { .. }) && attempt < DEFAULT_MAX_RETRIES => {
                    let delay = backoff_delay(attempt);
                    warn!(attempt, delay_secs = delay.as_secs(), "drift analysis rate-limited, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    warn!(error = %err, "drift analysis failed permanently, skipping this pair");
                    return None;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use codegraph_domain::entities::{Document, DocumentChunk, DocumentLink, DriftStatus};
    use codegraph_domain::value_objects::{ChunkId, DocumentId};
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
    struct StubRelationalStore {
        inserted: Mutex<Vec<DriftAnalysis>>,
        existing_best: Option<DriftAnalysis>,
    }

    #[async_trait]
    impl RelationalStore for StubRelationalStore {
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
        async fn insert_drift_analysis(&self, analysis: &DriftAnalysis) -> Result<()> {
            self.inserted.lock().unwrap().push(analysis.clone());
            Ok(())
        }
        async fn latest_drift_for_entity(&self, _chunk_id: ChunkId, _entity_qn: &str) -> Result<Option<DriftAnalysis>> {
            Ok(self.existing_best.clone())
        }
        async fn upsert_project_metadata(&self, _metadata: &codegraph_domain::entities::ProjectMetadata) -> Result<()> {
            Ok(())
        }
        async fn latest_project_metadata(&self, _project_name: &str) -> Result<Option<codegraph_domain::entities::ProjectMetadata>> {
            Ok(None)
        }
        async fn delete_project_data(&self, _project_name: &str) -> Result<()> {
            Ok(())
        }
        async fn ping(&self) -> Result<()> {
            Ok(())
        }
    }

    fn input() -> DriftInput<'static> {
        DriftInput {
            chunk_id: ChunkId::new(),
            doc_path: "docs/auth.md",
            entity_qn: "proj.auth.login",
            entity_kind: "function",
            file_path: "auth.py",
            doc_excerpt: "login() takes a username and password.",
            doc_hash: "dochash",
            code_content: "def login(username): ...",
            code_hash: "codehash",
            language: Language::Python,
            trigger: "manual",
        }
    }

    #[tokio::test]
    async fn irrelevant_pair_yields_no_analysis() {
        let llm = Arc::new(StubLlm { reply: r#"{"relevant": false, "drift_detected": false, "drift_severity": "none", "drift_score": 0.0, "issues": [], "summary": ""}"#.to_owned() });
        let relational = Arc::new(StubRelationalStore::default());
        let detector = DriftDetector::new(llm, relational, 1);

        let result = detector.analyze(input()).await.expect("analyze ok");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn drift_not_detected_forces_aligned_and_zero_score() {
        let llm = Arc::new(StubLlm {
            reply: r#"```json
{"relevant": true, "drift_detected": false, "drift_severity": "major", "drift_score": 0.9, "issues": [], "summary": "looks fine"}
```"#
                .to_owned(),
        });
        let relational = Arc::new(StubRelationalStore::default());
        let detector = DriftDetector::new(llm, relational, 1);

        let analysis = detector.analyze(input()).await.expect("analyze ok").expect("persisted");
        assert_eq!(analysis.drift_severity, DriftSeverity::None);
        assert_eq!(analysis.drift_score, 0.0);
    }

    #[tokio::test]
    async fn lower_scoring_analysis_does_not_replace_existing_best() {
        let llm = Arc::new(StubLlm { reply: r#"{"relevant": true, "drift_detected": true, "drift_severity": "minor", "drift_score": 0.2, "issues": [], "summary": "small drift"}"#.to_owned() });
        let mut relational = StubRelationalStore::default();
        relational.existing_best = Some(DriftAnalysis {
            chunk_id: ChunkId::new(),
            doc_path: "docs/auth.md".to_owned(),
            entity_qn: "proj.auth.login".to_owned(),
            trigger: "manual".to_owned(),
            drift_detected: true,
            drift_severity: DriftSeverity::Major,
            drift_score: 0.9,
            issues: vec![],
            explanation: String::new(),
            doc_excerpt: String::new(),
            code_excerpt: String::new(),
            doc_version_hash: String::new(),
            code_version_hash: String::new(),
            analyzed_at: Utc::now(),
        });
        let detector = DriftDetector::new(llm, Arc::new(relational), 1);

        let result = detector.analyze(input()).await.expect("analyze ok");
        assert!(result.is_none());
    }
}
