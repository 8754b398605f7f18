//! Pipeline orchestrator (§4.13): scans, parses, builds the graph,
//! summarizes, optionally regenerates project metadata, and embeds — in
//! that fixed order, driven by an explicit stage state machine.
//!
//! On any stage's first unrecovered error the run aborts; recoverable
//! per-file/per-entity failures (a file that fails to parse, a summary that
//! comes back empty) are logged and the stage continues.

use std::path::PathBuf;
use std::sync::Arc;

use codegraph_domain::entities::{CodeEntity, EntityKind, FileInfo, Project};
use codegraph_domain::ports::{EmbeddingProvider, GraphStore, LlmProvider, RelationalStore, VectorPoint, VectorStore};
use codegraph_domain::value_objects::QualifiedName;
use codegraph_domain::Result;
use codegraph_language::{parse_file, AstCache, AstCacheLimits, ParsedFile, Scanner};
use codegraph_resolver::{resolve, ImportProcessor, InheritanceTracker, ResolverContext, SymbolRegistry};
use codegraph_utils::TokenCounter;
use serde_json::json;
use tokio::sync::{mpsc, Semaphore};
use tracing::{info, warn};
use uuid::Uuid;

use crate::constants::{DEFAULT_BATCH_SIZE, DEFAULT_SUMMARY_CONCURRENCY, PROGRESS_UPDATE_INTERVAL, SKIP_DIRS, SUMMARIES_COLLECTION};
use crate::graph_writer::GraphWriter;
use crate::metadata::MetadataGenerator;
use crate::summarizer::{Subject, Summarizer};
use crate::vector_indexer;

/// The state machine's states, in fixed order. `Failed` absorbs a run that
/// aborts from any other state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Scanning,
    Parsing,
    GraphBuilding,
    Summarizing,
    Metadata,
    Embedding,
    Completed,
    Failed,
}

/// One message on the orchestrator's progress channel (§9 "Progress
/// callbacks"). Published by [`ProgressTracker`], consumed by whatever's on
/// the other end of the `mpsc` pair a caller wires into
/// [`PipelineOptions::progress_tx`] — the CLI's console renderer is the
/// expected subscriber, but rendering itself is out of this crate's scope.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    StageStarted { stage: Stage },
    StageProgress { stage: Stage, done: usize, total: usize },
    StageCompleted { stage: Stage },
    StageFailed { stage: Stage, message: String },
}

/// Tracks the current stage and within-stage progress. `set_stage`
/// transitions and resets the counters; `update_stage` advances progress
/// without transitioning, logging every [`PROGRESS_UPDATE_INTERVAL`]th item.
/// Both also publish a [`ProgressEvent`] on the optional channel, when one
/// is attached.
#[derive(Clone)]
pub struct ProgressTracker {
    stage: Stage,
    current: usize,
    total: usize,
    sender: Option<mpsc::UnboundedSender<ProgressEvent>>,
}

impl ProgressTracker {
    #[must_use]
    pub fn new() -> Self {
        Self { stage: Stage::Scanning, current: 0, total: 0, sender: None }
    }

    #[must_use]
    pub fn with_sender(sender: mpsc::UnboundedSender<ProgressEvent>) -> Self {
        Self { stage: Stage::Scanning, current: 0, total: 0, sender: Some(sender) }
    }

    pub fn set_stage(&mut self, stage: Stage) {
        info!(?stage, "pipeline stage transition");
        self.stage = stage;
        self.current = 0;
        self.total = 0;
        if !matches!(stage, Stage::Completed | Stage::Failed) {
            self.emit(ProgressEvent::StageStarted { stage });
        }
    }

    pub fn set_total(&mut self, total: usize) {
        self.total = total;
    }

    pub fn update_stage(&mut self, current: usize) {
        self.current = current;
        if self.total == 0 || current >= self.total || current % PROGRESS_UPDATE_INTERVAL == 0 {
            info!(stage = ?self.stage, current, total = self.total, "pipeline progress");
        }
        self.emit(ProgressEvent::StageProgress { stage: self.stage, done: current, total: self.total });
    }

    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub(crate) fn emit(&self, event: ProgressEvent) {
        if let Some(sender) = &self.sender {
            let _ = sender.send(event);
        }
    }
}

impl std::fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressTracker").field("stage", &self.stage).field("current", &self.current).field("total", &self.total).finish()
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// One run's configuration, matching the CLI's `index <path> [--name N]
/// [--force] [--skip-metadata]` surface (§6).
pub struct PipelineOptions {
    pub project_name: String,
    pub root: PathBuf,
    pub force: bool,
    pub skip_metadata: bool,
    pub ignore_patterns: Vec<String>,
    pub max_workers: usize,
    pub batch_size: usize,
    pub chunk_max_tokens: usize,
    pub chunk_overlap_tokens: usize,
    pub summary_concurrency: usize,
    pub progress_tx: Option<mpsc::UnboundedSender<ProgressEvent>>,
}

impl PipelineOptions {
    #[must_use]
    pub fn new(project_name: impl Into<String>, root: PathBuf) -> Self {
        Self {
            project_name: project_name.into(),
            root,
            force: false,
            skip_metadata: false,
            ignore_patterns: Vec::new(),
            max_workers: num_cpus::get().max(1),
            batch_size: DEFAULT_BATCH_SIZE,
            chunk_max_tokens: codegraph_domain::constants::indexing::DEFAULT_CHUNK_MAX_TOKENS,
            chunk_overlap_tokens: codegraph_domain::constants::indexing::DEFAULT_CHUNK_OVERLAP_TOKENS,
            summary_concurrency: DEFAULT_SUMMARY_CONCURRENCY,
            progress_tx: None,
        }
    }

    #[must_use]
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    #[must_use]
    pub fn with_skip_metadata(mut self, skip_metadata: bool) -> Self {
        self.skip_metadata = skip_metadata;
        self
    }

    #[must_use]
    pub fn with_progress_tx(mut self, progress_tx: mpsc::UnboundedSender<ProgressEvent>) -> Self {
        self.progress_tx = Some(progress_tx);
        self
    }
}

/// Shared state mutated during parse and read during graph build and call
/// resolution (§4.13, §5: "single-writer per pipeline run").
pub struct PipelineContext {
    pub registry: SymbolRegistry,
    pub imports: ImportProcessor,
    pub inheritance: InheritanceTracker,
    pub parsed_files: Vec<ParsedFile>,
    pub api_semaphore: Arc<Semaphore>,
    pub graph_semaphore: Arc<Semaphore>,
    pub progress: ProgressTracker,
    pub options: PipelineOptions,
}

impl PipelineContext {
    fn new(options: PipelineOptions) -> Self {
        let api_permits = options.summary_concurrency.max(1);
        let progress = options.progress_tx.clone().map_or_else(ProgressTracker::new, ProgressTracker::with_sender);
        Self {
            registry: SymbolRegistry::new(),
            imports: ImportProcessor::new(),
            inheritance: InheritanceTracker::new(),
            parsed_files: Vec::new(),
            api_semaphore: Arc::new(Semaphore::new(api_permits)),
            graph_semaphore: Arc::new(Semaphore::new(1)),
            progress,
            options,
        }
    }
}

/// Counts returned on a completed run, for the CLI's `index` command output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineReport {
    pub files_scanned: usize,
    pub files_parsed: usize,
    pub files_skipped_unchanged: usize,
    pub entities_summarized: usize,
    pub chunks_embedded: usize,
    pub metadata_regenerated: bool,
}

/// Owns the external-collaborator handles for one orchestrator run. Not
/// safe for concurrent runs against the same project (§5: the graph writer
/// it constructs per run is single-task-owned).
pub struct Pipeline {
    graph: Arc<dyn GraphStore>,
    vector: Arc<dyn VectorStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    llm: Arc<dyn LlmProvider>,
    relational: Arc<dyn RelationalStore>,
    cache: AstCache,
}

impl Pipeline {
    #[must_use]
    pub fn new(
        graph: Arc<dyn GraphStore>,
        vector: Arc<dyn VectorStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
        relational: Arc<dyn RelationalStore>,
        cache_limits: AstCacheLimits,
    ) -> Self {
        Self { graph, vector, embedder, llm, relational, cache: AstCache::new(cache_limits) }
    }

    /// Run the full `scan -> parse -> graph -> summarize ->
    /// metadata(optional) -> embed` pipeline.
    pub async fn run(&mut self, options: PipelineOptions) -> Result<PipelineReport> {
        self.graph.ping().await.map_err(|err| codegraph_domain::Error::indexing(format!("graph store unreachable at pipeline start: {err}")))?;

        let mut ctx = PipelineContext::new(options);
        let mut report = PipelineReport::default();

        match self.run_inner(&mut ctx, &mut report).await {
            Ok(()) => {
                ctx.progress.set_stage(Stage::Completed);
                ctx.progress.emit(ProgressEvent::StageCompleted { stage: Stage::Completed });
                Ok(report)
            }
            Err(err) => {
                ctx.progress.set_stage(Stage::Failed);
                ctx.progress.emit(ProgressEvent::StageFailed { stage: Stage::Failed, message: err.to_string() });
                warn!(error = %err, "pipeline run aborted");
                Err(err)
            }
        }
    }

    async fn run_inner(&mut self, ctx: &mut PipelineContext, report: &mut PipelineReport) -> Result<()> {
        let files = self.scan(ctx).await?;
        report.files_scanned = files.len();

        self.parse(ctx, files).await?;
        report.files_parsed = ctx.parsed_files.len();

        let mut writer = GraphWriter::new(Arc::clone(&self.graph), ctx.options.batch_size);
        self.build_graph(ctx, &mut writer).await?;

        report.entities_summarized = self.summarize(ctx).await?;

        if !ctx.options.skip_metadata {
            self.regenerate_metadata(ctx).await?;
            report.metadata_regenerated = true;
        }

        report.chunks_embedded = self.embed(ctx, &writer).await?;

        Ok(())
    }

    async fn scan(&self, ctx: &mut PipelineContext) -> Result<Vec<FileInfo>> {
        ctx.progress.set_stage(Stage::Scanning);

        let mut ignore_patterns: Vec<String> = SKIP_DIRS.iter().map(|s| (*s).to_owned()).collect();
        ignore_patterns.extend(ctx.options.ignore_patterns.iter().cloned());
        let scanner = Scanner::new(&ignore_patterns);

        let files = scanner.scan(&ctx.options.root);
        ctx.progress.set_total(files.len());
        Ok(files)
    }

    async fn parse(&mut self, ctx: &mut PipelineContext, files: Vec<FileInfo>) -> Result<()> {
        ctx.progress.set_stage(Stage::Parsing);
        ctx.progress.set_total(files.len());

        let semaphore = Arc::new(Semaphore::new(ctx.options.max_workers.max(1)));
        let mut handles = Vec::with_capacity(files.len());

        for file_info in files {
            let semaphore = Arc::clone(&semaphore);
            let project_name = ctx.options.project_name.clone();
            handles.push(tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                let source = match tokio::fs::read(&file_info.absolute_path).await {
                    Ok(bytes) => bytes,
                    Err(err) => return Err(codegraph_domain::Error::parse(file_info.absolute_path.display().to_string(), err.to_string())),
                };
                tokio::task::spawn_blocking(move || parse_file(&file_info, &source, &project_name))
                    .await
                    .map_err(|err| codegraph_domain::Error::parse("<join>".to_owned(), err.to_string()))?
            }));
        }

        let mut parsed = Vec::new();
        for (i, handle) in handles.into_iter().enumerate() {
            match handle.await {
                Ok(Ok(pf)) => parsed.push(pf),
                Ok(Err(err)) => warn!(error = %err, "file failed to parse, skipping"),
                Err(err) => warn!(error = %err, "parse task panicked, skipping"),
            }
            ctx.progress.update_stage(i + 1);
        }

        for pf in &parsed {
            self.cache.put(pf.file_info.absolute_path.clone(), pf.tree.clone(), pf.file_info.language, pf.file_info.size_bytes as usize);
        }

        for pf in &parsed {
            let module_qn = QualifiedName::for_module(&ctx.options.project_name, &pf.file_info.relative_path);
            register_entities(&pf.entities, &mut ctx.registry);
            ctx.inheritance.record_all(&pf.entities, module_qn.as_str(), &ctx.registry, |module_qn, local_name| ctx_resolve_import(&ctx.imports, module_qn, local_name));
            process_imports(&mut ctx.imports, pf, module_qn.as_str(), &ctx.options.project_name);
        }

        ctx.parsed_files = parsed;
        Ok(())
    }

    async fn build_graph(&self, ctx: &mut PipelineContext, writer: &mut GraphWriter) -> Result<()> {
        ctx.progress.set_stage(Stage::GraphBuilding);
        ctx.progress.set_total(ctx.parsed_files.len());
        let _permit = ctx.graph_semaphore.acquire().await.map_err(|e| codegraph_domain::Error::graph(e.to_string()))?;
        writer.upsert_project(&ctx.options.project_name, &ctx.options.root.to_string_lossy()).await?;

        for (i, pf) in ctx.parsed_files.iter().enumerate() {
            let file_path = pf.file_info.relative_path.to_string_lossy().into_owned();
            if !ctx.options.force && !writer.file_needs_update(&file_path, &pf.file_info.content_hash).await? {
                ctx.progress.update_stage(i + 1);
                continue;
            }

            writer.delete_file_entities(&file_path).await?;
            writer.add_parsed_file(pf, &ctx.options.project_name).await?;

            let module_qn = QualifiedName::for_module(&ctx.options.project_name, &pf.file_info.relative_path);
            resolve_classes_and_calls(&pf.entities, &module_qn, None, &ctx.registry, &ctx.imports, &ctx.inheritance, writer).await?;

            ctx.progress.update_stage(i + 1);
        }

        let flush = writer.flush_all().await?;
        info!(entities = flush.entities_flushed, relationships = flush.relationships_flushed, unresolved_calls = flush.unresolved_calls, "graph build flushed");
        Ok(())
    }

    async fn summarize(&self, ctx: &mut PipelineContext) -> Result<usize> {
        ctx.progress.set_stage(Stage::Summarizing);
        ctx.progress.set_total(ctx.parsed_files.len());

        let summarizer = Summarizer::new(Arc::clone(&self.llm), ctx.options.summary_concurrency);
        let mut count = 0usize;

        for (i, pf) in ctx.parsed_files.iter().enumerate() {
            let entity_names: Vec<String> = pf.entities.iter().map(|e| e.name.clone()).collect();
            {
                let _permit = ctx.api_semaphore.acquire().await.map_err(|e| codegraph_domain::Error::llm(e.to_string()))?;
                let file_summary = summarizer.summarize(Subject::File { info: &pf.file_info, entity_names: &entity_names }).await;
                if !file_summary.is_empty() {
                    self.persist_summary(&pf.file_info.relative_path, "file", pf.file_info.relative_path.to_string_lossy().as_ref(), &file_summary, &ctx.options.project_name).await?;
                    count += 1;
                }
            }

            for entity in flatten_entities(&pf.entities) {
                let subject = match &entity.kind {
                    EntityKind::Class { .. } => Subject::Class(entity),
                    EntityKind::Function { .. } | EntityKind::Method { .. } => Subject::Function(entity),
                };

                let _permit = ctx.api_semaphore.acquire().await.map_err(|e| codegraph_domain::Error::llm(e.to_string()))?;
                let summary = summarizer.summarize(subject).await;
                if !summary.is_empty() {
                    self.persist_summary(&entity.file_path, entity.kind.tag(), entity.qualified_name.as_str(), &summary, &ctx.options.project_name).await?;
                    count += 1;
                }
            }

            ctx.progress.update_stage(i + 1);
        }

        Ok(count)
    }

    async fn persist_summary(&self, file_path: &std::path::Path, entity_type: &str, entity_qn: &str, summary: &str, project_name: &str) -> Result<()> {
        self.vector.ensure_collection(SUMMARIES_COLLECTION, self.embedder.dimensions()).await?;
        let vector = self.embedder.embed(summary).await?;
        let point = VectorPoint {
            id: Uuid::new_v4(),
            vector,
            payload: json!({
                "file_path": file_path.to_string_lossy(),
                "project_name": project_name,
                "entity_type": entity_type,
                "graph_node_id": entity_qn,
                "summary": summary,
            })
            .as_object()
            .cloned()
            .unwrap_or_default(),
        };
        self.vector.upsert(SUMMARIES_COLLECTION, vec![point]).await
    }

    async fn regenerate_metadata(&self, ctx: &mut PipelineContext) -> Result<()> {
        ctx.progress.set_stage(Stage::Metadata);

        let mut project = Project::new(&ctx.options.project_name, ctx.options.root.clone());
        for pf in &ctx.parsed_files {
            count_entities(&pf.entities, &mut project.entity_counts);
        }
        *project.entity_counts.entry("File".to_owned()).or_insert(0) += ctx.parsed_files.len();

        let top_level_names: Vec<String> = ctx.parsed_files.iter().flat_map(|pf| pf.entities.iter().map(|e| e.qualified_name.as_str().to_owned())).take(50).collect();

        let generator = MetadataGenerator::new(Arc::clone(&self.llm), Arc::clone(&self.relational));
        generator.regenerate(&project, ctx.parsed_files.len(), &top_level_names, "post_index").await?;
        Ok(())
    }

    async fn embed(&self, ctx: &mut PipelineContext, writer: &GraphWriter) -> Result<usize> {
        ctx.progress.set_stage(Stage::Embedding);
        ctx.progress.set_total(ctx.parsed_files.len());

        let counter = TokenCounter::new();
        let mut total = 0usize;

        for (i, pf) in ctx.parsed_files.iter().enumerate() {
            let file_path = pf.file_info.relative_path.to_string_lossy().into_owned();
            if !ctx.options.force && !vector_indexer::file_needs_update(&self.vector, &file_path, &pf.file_info.content_hash, &ctx.options.project_name).await? {
                ctx.progress.update_stage(i + 1);
                continue;
            }

            let chunks = vector_indexer::chunk_file(&pf.entities, &pf.file_info, &ctx.options.project_name, &counter, ctx.options.chunk_max_tokens, ctx.options.chunk_overlap_tokens);
            total += vector_indexer::embed_and_upsert(chunks, &self.embedder, &self.vector, &ctx.options.project_name).await?;
            ctx.progress.update_stage(i + 1);
        }

        let _ = writer;
        Ok(total)
    }
}

pub(crate) fn ctx_resolve_import(imports: &ImportProcessor, module_qn: &str, local_name: &str) -> Option<String> {
    imports.resolve(module_qn, local_name).map(str::to_owned)
}

pub(crate) fn register_entities(entities: &[CodeEntity], registry: &mut SymbolRegistry) {
    for entity in entities {
        registry.register(entity.qualified_name.as_str(), entity.kind.tag());
        match &entity.kind {
            EntityKind::Class { children, .. } => register_entities(children, registry),
            EntityKind::Function { .. } | EntityKind::Method { .. } => {
                if let Some(return_type) = codegraph_resolver::extract_return_type(&entity.signature) {
                    registry.register_return_type(entity.qualified_name.as_str(), &return_type);
                }
            }
        }
    }
}

pub(crate) fn process_imports(imports: &mut ImportProcessor, pf: &ParsedFile, module_qn: &str, project_name: &str) {
    for import in &pf.imports {
        match pf.file_info.language {
            codegraph_domain::value_objects::Language::Python => imports.process_python(module_qn, &import.name, project_name),
            codegraph_domain::value_objects::Language::JavaScript
            | codegraph_domain::value_objects::Language::Jsx
            | codegraph_domain::value_objects::Language::TypeScript
            | codegraph_domain::value_objects::Language::Tsx => imports.process_javascript(module_qn, &import.name, project_name, &pf.file_info.relative_path),
            _ => {}
        }
    }
}

fn flatten_entities(entities: &[CodeEntity]) -> Vec<&CodeEntity> {
    let mut out = Vec::new();
    for entity in entities {
        out.push(entity);
        if let EntityKind::Class { children, .. } = &entity.kind {
            out.extend(flatten_entities(children));
        }
    }
    out
}

fn count_entities(entities: &[CodeEntity], counts: &mut std::collections::BTreeMap<String, usize>) {
    for entity in entities {
        *counts.entry(entity.kind.tag().to_owned()).or_insert(0) += 1;
        if let EntityKind::Class { children, .. } = &entity.kind {
            count_entities(children, counts);
        }
    }
}

/// Resolve `EXTENDS` edges and `CALLS` edges for `entities` (recursing into
/// class children), writing them into `writer`. Shared by the orchestrator
/// (§4.13, over a freshly built `PipelineContext`) and the watcher (§4.14,
/// over its persistent, incrementally-updated resolver state).
pub(crate) fn resolve_classes_and_calls<'a>(
    entities: &'a [CodeEntity],
    module_qn: &'a QualifiedName,
    class_context: Option<&'a str>,
    registry: &'a SymbolRegistry,
    imports: &'a ImportProcessor,
    inheritance: &'a InheritanceTracker,
    writer: &'a mut GraphWriter,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<()>> + 'a>> {
    Box::pin(async move {
        for entity in entities {
            match &entity.kind {
                EntityKind::Class { base_classes, children } => {
                    let class_qn = entity.qualified_name.as_str().to_owned();
                    let resolved_parents = inheritance.parents_of(&class_qn).to_vec();
                    for (raw, resolved) in base_classes.iter().zip(resolved_parents.iter()) {
                        let raw_simple = raw.split(['<', '(']).next().unwrap_or(raw).trim();
                        if raw_simple != resolved {
                            writer.resolve_extends(&class_qn, raw_simple, resolved);
                        }
                    }
                    resolve_classes_and_calls(children, module_qn, Some(class_qn.as_str()), registry, imports, inheritance, writer).await?;
                }
                EntityKind::Function { calls, .. } | EntityKind::Method { calls, .. } => {
                    let locals = codegraph_resolver::infer_locals(&entity.signature, &entity.code, module_qn.as_str(), registry);
                    for raw_call in calls {
                        let resolver_ctx = ResolverContext {
                            registry,
                            imports,
                            inheritance,
                            caller_module_qn: module_qn.as_str(),
                            class_context,
                            local_var_types: Some(&locals),
                        };
                        if let Some(codegraph_resolver::Resolved::Entity { qn, .. }) = resolve(raw_call, &resolver_ctx) {
                            writer.add_call(entity.qualified_name.as_str(), &qn).await?;
                        }
                    }
                }
            }
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use codegraph_domain::entities::{Document, DocumentChunk, DocumentLink, DriftAnalysis, DriftStatus, ProjectMetadata};
    use codegraph_domain::ports::{ChatMessage, EmbedProgress, GraphRow, VectorSearchHit};
    use codegraph_domain::value_objects::{ChunkId, DocumentId};
    use std::sync::Mutex;

    struct NullGraphStore;

    #[async_trait]
    impl GraphStore for NullGraphStore {
        async fn execute(&self, _query: &str, _params: serde_json::Value) -> Result<Vec<GraphRow>> {
            Ok(vec![])
        }
        async fn ping(&self) -> Result<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct NullVectorStore {
        upserted: Mutex<usize>,
    }

    #[async_trait]
    impl VectorStore for NullVectorStore {
        async fn ensure_collection(&self, _collection: &str, _dimensions: usize) -> Result<()> {
            Ok(())
        }
        async fn upsert(&self, _collection: &str, points: Vec<VectorPoint>) -> Result<()> {
            *self.upserted.lock().unwrap() += points.len();
            Ok(())
        }
        async fn delete_by_filter(&self, _collection: &str, _filter: codegraph_domain::ports::PayloadFilter) -> Result<()> {
            Ok(())
        }
        async fn search(&self, _collection: &str, _query_vector: &[f32], _limit: usize, _filter: Option<codegraph_domain::ports::PayloadFilter>) -> Result<Vec<VectorSearchHit>> {
            Ok(vec![])
        }
        async fn scroll_by_filter(&self, _collection: &str, _filter: codegraph_domain::ports::PayloadFilter, _limit: usize) -> Result<Vec<VectorSearchHit>> {
            Ok(vec![])
        }
        async fn ping(&self) -> Result<()> {
            Ok(())
        }
    }

    struct FixedEmbeddingProvider;

    #[async_trait]
    impl EmbeddingProvider for FixedEmbeddingProvider {
        fn dimensions(&self) -> usize {
            3
        }
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![0.1, 0.2, 0.3])
        }
        async fn embed_batch(&self, texts: &[String], _progress: Option<EmbedProgress<'_>>) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![0.1, 0.2, 0.3]).collect())
        }
    }

    struct StubLlm;

    #[async_trait]
    impl LlmProvider for StubLlm {
        async fn complete(&self, _messages: &[ChatMessage], _max_tokens: Option<u32>, _temperature: Option<f32>) -> Result<String> {
            Ok("a summary".to_owned())
        }
    }

    #[derive(Default)]
    struct NullRelationalStore {
        metadata_calls: Mutex<usize>,
    }

    #[async_trait]
    impl RelationalStore for NullRelationalStore {
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
        async fn upsert_project_metadata(&self, _metadata: &ProjectMetadata) -> Result<()> {
            *self.metadata_calls.lock().unwrap() += 1;
            Ok(())
        }
        async fn latest_project_metadata(&self, _project_name: &str) -> Result<Option<ProjectMetadata>> {
            Ok(None)
        }
        async fn delete_project_data(&self, _project_name: &str) -> Result<()> {
            Ok(())
        }
        async fn ping(&self) -> Result<()> {
            Ok(())
        }
    }

    fn make_pipeline() -> (Pipeline, Arc<NullRelationalStore>) {
        let relational = Arc::new(NullRelationalStore::default());
        let pipeline = Pipeline::new(
            Arc::new(NullGraphStore),
            Arc::new(NullVectorStore::default()),
            Arc::new(FixedEmbeddingProvider),
            Arc::new(StubLlm),
            Arc::clone(&relational) as Arc<dyn RelationalStore>,
            AstCacheLimits { max_entries: 100, max_memory_bytes: 10_000_000 },
        );
        (pipeline, relational)
    }

    #[tokio::test]
    async fn full_run_completes_and_regenerates_metadata_by_default() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.py"), "def f():\n    return g()\n\ndef g():\n    return 1\n").unwrap();

        let (mut pipeline, relational) = make_pipeline();
        let options = PipelineOptions::new("proj", dir.path().to_path_buf());
        let report = pipeline.run(options).await.expect("pipeline run succeeds");

        assert_eq!(report.files_scanned, 1);
        assert_eq!(report.files_parsed, 1);
        assert!(report.metadata_regenerated);
        assert_eq!(*relational.metadata_calls.lock().unwrap(), 1);
        assert!(report.chunks_embedded >= 1);
    }

    #[tokio::test]
    async fn skip_metadata_flag_skips_metadata_stage() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.py"), "def f():\n    pass\n").unwrap();

        let (mut pipeline, relational) = make_pipeline();
        let options = PipelineOptions::new("proj", dir.path().to_path_buf()).with_skip_metadata(true);
        let report = pipeline.run(options).await.expect("pipeline run succeeds");

        assert!(!report.metadata_regenerated);
        assert_eq!(*relational.metadata_calls.lock().unwrap(), 0);
    }

    #[test]
    fn progress_tracker_reset_on_stage_transition() {
        let mut tracker = ProgressTracker::new();
        tracker.set_total(10);
        tracker.update_stage(5);
        tracker.set_stage(Stage::Parsing);
        assert_eq!(tracker.stage(), Stage::Parsing);
    }

    #[tokio::test]
    async fn full_run_publishes_stage_events_on_the_progress_channel() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.py"), "def f():\n    pass\n").unwrap();

        let (mut pipeline, _relational) = make_pipeline();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let options = PipelineOptions::new("proj", dir.path().to_path_buf()).with_progress_tx(tx);
        pipeline.run(options).await.expect("pipeline run succeeds");

        let mut saw_scanning_started = false;
        let mut saw_completed = false;
        while let Ok(event) = rx.try_recv() {
            match event {
                ProgressEvent::StageStarted { stage: Stage::Scanning } => saw_scanning_started = true,
                ProgressEvent::StageCompleted { stage: Stage::Completed } => saw_completed = true,
                _ => {}
            }
        }
        assert!(saw_scanning_started);
        assert!(saw_completed);
    }
}
