//! Batched graph writer + incremental update engine (§4.8).
//!
//! Two buffers accumulate property-dictionary rows until either crosses
//! `batch_size`, then auto-flush issues one `UNWIND $batch AS row MERGE …`
//! statement per label/relationship type. A failed flush clears only the
//! buffer that failed and logs; it never aborts the run.

use std::sync::Arc;

use codegraph_domain::entities::{CodeEntity, EntityKind};
use codegraph_domain::ports::GraphStore;
use codegraph_domain::Result;
use codegraph_language::ParsedFile;
use serde_json::{json, Value};
use tracing::{error, warn};

#[derive(Debug, Default)]
struct EntityBuffer {
    files: Vec<Value>,
    classes: Vec<Value>,
    functions: Vec<Value>,
    methods: Vec<Value>,
    imports: Vec<Value>,
}

impl EntityBuffer {
    fn len(&self) -> usize {
        self.files.len() + self.classes.len() + self.functions.len() + self.methods.len() + self.imports.len()
    }
}

#[derive(Debug, Default)]
struct RelationshipBuffer {
    defines_class: Vec<(String, String)>,
    defines_function: Vec<(String, String)>,
    defines_method: Vec<(String, String)>,
    extends: Vec<(String, String)>,
    imports: Vec<(String, String)>,
    calls: Vec<(String, String)>,
}

impl RelationshipBuffer {
    fn len(&self) -> usize {
        self.defines_class.len() + self.defines_function.len() + self.defines_method.len() + self.extends.len() + self.imports.len() + self.calls.len()
    }
}

/// Summary of one `flush_all` call: rows sent per kind, and calls whose
/// callee did not match any registered entity at flush time.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FlushReport {
    pub entities_flushed: usize,
    pub relationships_flushed: usize,
    pub unresolved_calls: usize,
}

/// Owns the two buffers for one orchestrator run. Not safe for concurrent
/// writers (§5: "owned by one orchestrator task").
pub struct GraphWriter {
    store: Arc<dyn GraphStore>,
    batch_size: usize,
    entities: EntityBuffer,
    relationships: RelationshipBuffer,
}

impl GraphWriter {
    #[must_use]
    pub fn new(store: Arc<dyn GraphStore>, batch_size: usize) -> Self {
        Self { store, batch_size, entities: EntityBuffer::default(), relationships: RelationshipBuffer::default() }
    }

    /// Append one parsed file's static entity/relationship data (everything
    /// knowable before call resolution: files, classes, functions, methods,
    /// imports, and raw `EXTENDS` edges). `CALLS` edges are added
    /// separately via [`Self::add_call`] once the call resolver has run.
    pub async fn add_parsed_file(&mut self, pf: &ParsedFile, project_name: &str) -> Result<()> {
        let file_path = pf.file_info.relative_path.to_string_lossy().into_owned();

        self.entities.files.push(json!({
            "path": file_path,
            "content_hash": pf.file_info.content_hash,
            "language": pf.file_info.language.to_string(),
            "project_name": project_name,
        }));

        for entity in &pf.entities {
            self.add_entity(entity, &file_path);
        }

        for import in &pf.imports {
            self.entities.imports.push(json!({
                "name": import.name,
                "source_module": import.source_module,
                "is_external": import.is_external,
                "line_number": import.line_number,
            }));
            self.relationships.imports.push((file_path.clone(), import.name.clone()));
        }

        self.auto_flush_if_needed().await
    }

    fn add_entity(&mut self, entity: &CodeEntity, file_path: &str) {
        let qn = entity.qualified_name.as_str().to_owned();

        match &entity.kind {
            EntityKind::Class { base_classes, children } => {
                self.entities.classes.push(entity_row(entity, &qn));
                self.relationships.defines_class.push((file_path.to_owned(), qn.clone()));
                for base in base_classes {
                    self.relationships.extends.push((qn.clone(), base.clone()));
                }
                for child in children {
                    self.add_entity(child, file_path);
                    if let EntityKind::Method { .. } = &child.kind {
                        self.relationships.defines_method.push((qn.clone(), child.qualified_name.as_str().to_owned()));
                    }
                }
            }
            EntityKind::Function { .. } => {
                self.entities.functions.push(entity_row(entity, &qn));
                self.relationships.defines_function.push((file_path.to_owned(), qn));
            }
            EntityKind::Method { .. } => {
                self.entities.methods.push(entity_row(entity, &qn));
            }
        }
    }

    /// Record a resolved `(Class)-[:EXTENDS]->(Class)` edge, overriding the
    /// raw base-name edge `add_parsed_file` recorded for this pair.
    pub fn resolve_extends(&mut self, class_qn: &str, raw_base: &str, resolved_qn: &str) {
        for (child, parent) in &mut self.relationships.extends {
            if child == class_qn && parent == raw_base {
                *parent = resolved_qn.to_owned();
            }
        }
    }

    /// Record one resolved `(Function|Method)-[:CALLS]->(Function|Method)`
    /// edge. Unresolved raw callee strings are still recorded here; they
    /// are silently dropped (counted, not erred) at flush time when the
    /// `MATCH` finds no such qualified name.
    pub async fn add_call(&mut self, caller_qn: &str, callee_qn: &str) -> Result<()> {
        self.relationships.calls.push((caller_qn.to_owned(), callee_qn.to_owned()));
        self.auto_flush_if_needed().await
    }

    async fn auto_flush_if_needed(&mut self) -> Result<()> {
        if self.entities.len() >= self.batch_size || self.relationships.len() >= self.batch_size {
            self.flush_all().await?;
        }
        Ok(())
    }

    /// Flush both buffers. Idempotent: a second call with empty buffers is
    /// a no-op. A failure on one label/relationship flush is logged and
    /// that slice is cleared; the rest proceed.
    pub async fn flush_all(&mut self) -> Result<FlushReport> {
        let mut report = FlushReport::default();

        report.entities_flushed += flush_merge(&self.store, "File", "path", std::mem::take(&mut self.entities.files)).await;
        report.entities_flushed += flush_merge(&self.store, "Class", "qualified_name", std::mem::take(&mut self.entities.classes)).await;
        report.entities_flushed += flush_merge(&self.store, "Function", "qualified_name", std::mem::take(&mut self.entities.functions)).await;
        report.entities_flushed += flush_merge(&self.store, "Method", "qualified_name", std::mem::take(&mut self.entities.methods)).await;
        report.entities_flushed += flush_merge(&self.store, "Import", "name", std::mem::take(&mut self.entities.imports)).await;

        report.relationships_flushed += flush_relationship(&self.store, "DEFINES", "path", "qualified_name", std::mem::take(&mut self.relationships.defines_class)).await;
        report.relationships_flushed += flush_relationship(&self.store, "DEFINES", "path", "qualified_name", std::mem::take(&mut self.relationships.defines_function)).await;
        report.relationships_flushed += flush_relationship(&self.store, "DEFINES_METHOD", "qualified_name", "qualified_name", std::mem::take(&mut self.relationships.defines_method)).await;
        report.relationships_flushed += flush_relationship(&self.store, "EXTENDS", "qualified_name", "qualified_name", std::mem::take(&mut self.relationships.extends)).await;
        report.relationships_flushed += flush_relationship(&self.store, "IMPORTS", "path", "name", std::mem::take(&mut self.relationships.imports)).await;

        let calls = std::mem::take(&mut self.relationships.calls);
        let sent = calls.len();
        let matched = flush_relationship(&self.store, "CALLS", "qualified_name", "qualified_name", calls).await;
        report.relationships_flushed += matched;
        report.unresolved_calls += sent.saturating_sub(matched);

        Ok(report)
    }

    /// MERGE the owning `Project` node and stamp `last_indexed_at`. Called
    /// once per run, outside the batched buffers since it's a single row.
    pub async fn upsert_project(&self, name: &str, root_path: &str) -> Result<()> {
        self.store
            .execute(
                "MERGE (p:Project {name: $name}) SET p.root_path = $root_path, p.last_indexed_at = $now",
                json!({"name": name, "root_path": root_path, "now": chrono::Utc::now().to_rfc3339()}),
            )
            .await?;
        Ok(())
    }

    /// True iff a file node with this exact `(path, hash)` already exists
    /// (used by the orchestrator and watcher to skip unchanged files).
    pub async fn file_needs_update(&self, path: &str, hash: &str) -> Result<bool> {
        let rows = self
            .store
            .execute("MATCH (f:File {path: $path, content_hash: $hash}) RETURN f.path AS path", json!({"path": path, "hash": hash}))
            .await?;
        Ok(rows.is_empty())
    }

    /// Remove every entity defined by `path` and their relationships.
    pub async fn delete_file_entities(&self, path: &str) -> Result<()> {
        self.store
            .execute(
                "MATCH (f:File {path: $path})-[:DEFINES|DEFINES_METHOD*0..2]->(e) DETACH DELETE e, f",
                json!({"path": path}),
            )
            .await?;
        Ok(())
    }

    /// Delete `CALLS` edges where either endpoint was defined in `path`.
    pub async fn delete_calls_for_file(&self, path: &str) -> Result<()> {
        self.store
            .execute(
                "MATCH (a)-[c:CALLS]->(b) WHERE a.file_path = $path OR b.file_path = $path DELETE c",
                json!({"path": path}),
            )
            .await?;
        Ok(())
    }
}

fn entity_row(entity: &CodeEntity, qn: &str) -> Value {
    json!({
        "name": entity.name,
        "qualified_name": qn,
        "signature": entity.signature,
        "docstring": entity.docstring,
        "start_line": entity.start_line,
        "end_line": entity.end_line,
        "file_path": entity.file_path.to_string_lossy(),
        "kind": entity.kind.tag(),
    })
}

async fn flush_merge(store: &Arc<dyn GraphStore>, label: &str, key: &str, batch: Vec<Value>) -> usize {
    if batch.is_empty() {
        return 0;
    }
    let sent = batch.len();
    let query = format!("UNWIND $batch AS row MERGE (n:{label} {{{key}: row.{key}}}) SET n += row RETURN n.{key} AS {key}");
    match store.execute(&query, json!({"batch": batch})).await {
        Ok(rows) => rows.len(),
        Err(err) => {
            error!(label, error = %err, "graph flush failed; buffer cleared, continuing");
            let _ = sent;
            0
        }
    }
}

/// `from_key`/`to_key` are the property names that identify each
/// endpoint — `File` and `Import` nodes are keyed by `path`/`name`, every
/// other label by `qualified_name`.
async fn flush_relationship(store: &Arc<dyn GraphStore>, rel_type: &str, from_key: &str, to_key: &str, pairs: Vec<(String, String)>) -> usize {
    if pairs.is_empty() {
        return 0;
    }
    let batch: Vec<Value> = pairs.into_iter().map(|(from, to)| json!({"from": from, "to": to})).collect();
    let query = format!(
        "UNWIND $batch AS row MATCH (a {{{from_key}: row.from}}) MATCH (b {{{to_key}: row.to}}) MERGE (a)-[:{rel_type}]->(b) RETURN a.{from_key} AS matched"
    );
    match store.execute(&query, json!({"batch": batch})).await {
        Ok(rows) => rows.len(),
        Err(err) => {
            warn!(rel_type, error = %err, "relationship flush failed; buffer cleared, continuing");
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use codegraph_domain::ports::GraphRow;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingStore {
        queries: Mutex<Vec<String>>,
        fail_label: Option<&'static str>,
    }

    #[async_trait]
    impl GraphStore for RecordingStore {
        async fn execute(&self, query: &str, _params: Value) -> Result<Vec<GraphRow>> {
            self.queries.lock().unwrap().push(query.to_owned());
            if let Some(label) = self.fail_label {
                if query.contains(label) {
                    return Err(codegraph_domain::Error::graph("boom"));
                }
            }
            Ok(vec![GraphRow::default()])
        }

        async fn ping(&self) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn upsert_project_issues_a_single_merge() {
        let store = Arc::new(RecordingStore::default());
        let writer = GraphWriter::new(Arc::clone(&store) as Arc<dyn GraphStore>, 500);
        writer.upsert_project("proj", "/repo").await.expect("upsert ok");
        assert_eq!(store.queries.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn flush_all_is_idempotent_on_empty_buffers() {
        let store = Arc::new(RecordingStore::default());
        let mut writer = GraphWriter::new(store, 500);
        let report = writer.flush_all().await.expect("flush ok");
        assert_eq!(report, FlushReport::default());
    }

    #[tokio::test]
    async fn failed_label_flush_does_not_abort_others() {
        let store = Arc::new(RecordingStore { fail_label: Some("Class"), ..Default::default() });
        let mut writer = GraphWriter::new(Arc::clone(&store) as Arc<dyn GraphStore>, 500);
        writer.entities.classes.push(json!({"qualified_name": "proj.a.Foo"}));
        writer.entities.functions.push(json!({"qualified_name": "proj.a.f"}));

        let report = writer.flush_all().await.expect("flush_all never errs");
        assert_eq!(report.entities_flushed, 1);
    }
}
