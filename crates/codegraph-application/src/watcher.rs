//! File watcher (§4.14): debounced, incremental re-indexing of a project
//! already indexed by [`crate::pipeline::Pipeline`].
//!
//! Resolver state (`SymbolRegistry`, `ImportProcessor`, `InheritanceTracker`)
//! and the AST cache are rebuilt by a full scan+parse at startup and kept
//! live for the watcher's lifetime — nothing here is persisted, so a
//! restart always re-bootstraps from disk (§3 Lifecycles).
//!
//! One `notify` observer feeds a bounded channel; a single consumer task
//! debounces bursts of events per path and applies them in strict order:
//! `delete_file_entities -> evict AST cache -> re-parse -> register ->
//! graph build -> vector index -> rebuild_calls (optional)`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use codegraph_domain::entities::FileInfo;
use codegraph_domain::ports::{EmbeddingProvider, GraphStore, VectorStore};
use codegraph_domain::value_objects::QualifiedName;
use codegraph_domain::Result;
use codegraph_language::{language_for, parse_file, AstCache, AstCacheLimits, Scanner};
use codegraph_resolver::{ImportProcessor, InheritanceTracker, SymbolRegistry};
use codegraph_utils::TokenCounter;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as _};
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::constants::{DEFAULT_BATCH_SIZE, SKIP_DIRS};
use crate::graph_writer::GraphWriter;
use crate::pipeline::{process_imports, register_entities, resolve_classes_and_calls};
use crate::vector_indexer;

/// One watcher run's configuration, matching the CLI's `watch <path> [--name
/// N] [--no-calls]` surface (§6).
pub struct WatcherOptions {
    pub project_name: String,
    pub root: PathBuf,
    pub recalculate_calls: bool,
    pub ignore_patterns: Vec<String>,
    pub chunk_max_tokens: usize,
    pub chunk_overlap_tokens: usize,
    pub batch_size: usize,
}

impl WatcherOptions {
    #[must_use]
    pub fn new(project_name: impl Into<String>, root: PathBuf) -> Self {
        Self {
            project_name: project_name.into(),
            root,
            recalculate_calls: true,
            ignore_patterns: Vec::new(),
            chunk_max_tokens: codegraph_domain::constants::indexing::DEFAULT_CHUNK_MAX_TOKENS,
            chunk_overlap_tokens: codegraph_domain::constants::indexing::DEFAULT_CHUNK_OVERLAP_TOKENS,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    #[must_use]
    pub fn with_recalculate_calls(mut self, recalculate_calls: bool) -> Self {
        self.recalculate_calls = recalculate_calls;
        self
    }
}

/// Resolver state shared between the bootstrap scan and every subsequent
/// incremental update, behind a single mutex: one update runs at a time,
/// matching the orchestrator's single-writer-per-run design (§5).
struct ResolverState {
    registry: SymbolRegistry,
    imports: ImportProcessor,
    inheritance: InheritanceTracker,
    cache: AstCache,
}

/// A running watcher. Dropping this without calling [`Watcher::stop`] leaves
/// the background consumer task running; always call `stop` during shutdown.
pub struct Watcher {
    options: WatcherOptions,
    graph: Arc<dyn GraphStore>,
    vector: Arc<dyn VectorStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    state: Arc<Mutex<ResolverState>>,
    cancel: CancellationToken,
    consumer: Option<tokio::task::JoinHandle<()>>,
    _observer: RecommendedWatcher,
}

impl Watcher {
    /// Bootstrap resolver state from a full scan+parse of `options.root`,
    /// start the OS-level observer, and spawn the debounced consumer task.
    pub async fn start(options: WatcherOptions, graph: Arc<dyn GraphStore>, vector: Arc<dyn VectorStore>, embedder: Arc<dyn EmbeddingProvider>, cache_limits: AstCacheLimits) -> Result<Self> {
        let mut ignore_patterns: Vec<String> = SKIP_DIRS.iter().map(|s| (*s).to_owned()).collect();
        ignore_patterns.extend(options.ignore_patterns.iter().cloned());
        let scanner = Scanner::new(&ignore_patterns);
        let files = scanner.scan(&options.root);

        let mut state = ResolverState { registry: SymbolRegistry::new(), imports: ImportProcessor::new(), inheritance: InheritanceTracker::new(), cache: AstCache::new(cache_limits) };

        for file_info in &files {
            let source = tokio::fs::read(&file_info.absolute_path).await.map_err(|err| codegraph_domain::Error::scan(err.to_string()))?;
            let pf = match parse_file(file_info, &source, &options.project_name) {
                Ok(pf) => pf,
                Err(err) => {
                    warn!(error = %err, path = %file_info.relative_path.display(), "file failed to parse during watcher bootstrap, skipping");
                    continue;
                }
            };
            let module_qn = QualifiedName::for_module(&options.project_name, &pf.file_info.relative_path);
            register_entities(&pf.entities, &mut state.registry);
            state.inheritance.record_all(&pf.entities, module_qn.as_str(), &state.registry, |m, l| state.imports.resolve(m, l).map(str::to_owned));
            process_imports(&mut state.imports, &pf, module_qn.as_str(), &options.project_name);
            state.cache.put(pf.file_info.absolute_path.clone(), pf.tree.clone(), pf.file_info.language, pf.file_info.size_bytes as usize);
        }

        info!(files = files.len(), project = %options.project_name, "watcher bootstrap complete");

        let state = Arc::new(Mutex::new(state));
        let cancel = CancellationToken::new();

        let (tx, rx) = mpsc::channel::<PathBuf>(crate::constants::WATCHER_QUEUE_CAPACITY);
        let root = options.root.clone();
        let observer = Self::spawn_observer(&root, tx)?;

        let consumer = tokio::spawn(Self::run_consumer(
            rx,
            cancel.clone(),
            Arc::clone(&state),
            Arc::clone(&graph),
            Arc::clone(&vector),
            Arc::clone(&embedder),
            WatcherOptions {
                project_name: options.project_name.clone(),
                root: options.root.clone(),
                recalculate_calls: options.recalculate_calls,
                ignore_patterns: options.ignore_patterns.clone(),
                chunk_max_tokens: options.chunk_max_tokens,
                chunk_overlap_tokens: options.chunk_overlap_tokens,
                batch_size: options.batch_size,
            },
        ));

        Ok(Self { options, graph, vector, embedder, state, cancel, consumer: Some(consumer), _observer: observer })
    }

    fn spawn_observer(root: &Path, tx: mpsc::Sender<PathBuf>) -> Result<RecommendedWatcher> {
        let root = root.to_owned();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                let event = match res {
                    Ok(event) => event,
                    Err(err) => {
                        warn!(error = %err, "file watch error");
                        return;
                    }
                };
                if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)) {
                    return;
                }
                for path in event.paths {
                    if path.is_dir() {
                        continue;
                    }
                    if language_for(&path).is_none() {
                        continue;
                    }
                    if let Err(mpsc::error::TrySendError::Full(_)) = tx.try_send(path.clone()) {
                        warn!(path = %path.display(), "watcher queue full, dropping event");
                    }
                }
            },
            notify::Config::default(),
        )
        .map_err(|err| codegraph_domain::Error::indexing(format!("failed to create file watcher: {err}")))?;

        watcher.watch(&root, RecursiveMode::Recursive).map_err(|err| codegraph_domain::Error::indexing(format!("failed to watch {}: {err}", root.display())))?;
        Ok(watcher)
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_consumer(
        mut rx: mpsc::Receiver<PathBuf>,
        cancel: CancellationToken,
        state: Arc<Mutex<ResolverState>>,
        graph: Arc<dyn GraphStore>,
        vector: Arc<dyn VectorStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        options: WatcherOptions,
    ) {
        let debounce_delay = codegraph_domain::constants::watcher::default_debounce_delay();
        let mut pending: HashMap<PathBuf, ()> = HashMap::new();
        let sleep = tokio::time::sleep(debounce_delay);
        tokio::pin!(sleep);
        let mut armed = false;

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    info!("watcher consumer stopping");
                    break;
                }
                maybe_path = rx.recv() => {
                    match maybe_path {
                        Some(path) => {
                            pending.insert(path, ());
                            if !armed {
                                sleep.as_mut().reset(tokio::time::Instant::now() + debounce_delay);
                                armed = true;
                            }
                        }
                        None => break,
                    }
                }
                () = &mut sleep, if armed => {
                    armed = false;
                    let batch: Vec<PathBuf> = pending.drain().map(|(p, ())| p).collect();
                    for path in batch {
                        if let Err(err) = Self::handle_path_event(&path, &options, &state, &graph, &vector, &embedder).await {
                            warn!(error = %err, path = %path.display(), "incremental update failed");
                        }
                    }
                }
            }
        }
    }

    async fn handle_path_event(
        absolute_path: &Path,
        options: &WatcherOptions,
        state: &Arc<Mutex<ResolverState>>,
        graph: &Arc<dyn GraphStore>,
        vector: &Arc<dyn VectorStore>,
        embedder: &Arc<dyn EmbeddingProvider>,
    ) -> Result<()> {
        let relative_path = codegraph_utils::paths::relative_to(&options.root, absolute_path);
        let file_path = relative_path.to_string_lossy().into_owned();
        let mut writer = GraphWriter::new(Arc::clone(graph), options.batch_size);

        let mut guard = state.lock().await;

        writer.delete_file_entities(&file_path).await?;
        guard.cache.evict(absolute_path);
        let module_qn = QualifiedName::for_module(&options.project_name, &relative_path);
        guard.registry.remove_by_prefix(module_qn.as_str());

        if options.recalculate_calls {
            writer.delete_calls_for_file(&file_path).await?;
        }

        let Ok(exists) = tokio::fs::try_exists(absolute_path).await else {
            warn!(path = %file_path, "could not stat changed file, treating as deleted from the graph only");
            writer.flush_all().await?;
            return Ok(());
        };
        if !exists {
            vector
                .delete_by_filter(
                    vector_indexer::CODE_CHUNKS_COLLECTION,
                    codegraph_domain::ports::PayloadFilter::eq("file_path", file_path.clone()).and_eq("project_name", options.project_name.clone()),
                )
                .await?;
            writer.flush_all().await?;
            info!(path = %file_path, "removed deleted file from graph and vector store");
            return Ok(());
        }

        let Some(language) = language_for(absolute_path) else {
            return Ok(());
        };

        let source = tokio::fs::read(absolute_path).await.map_err(|err| codegraph_domain::Error::scan(err.to_string()))?;
        let absolute_path_buf = absolute_path.to_path_buf();
        let file_info = FileInfo::from_bytes(absolute_path_buf.clone(), relative_path.clone(), language, &source);
        let project_name = options.project_name.clone();
        let pf = tokio::task::spawn_blocking(move || parse_file(&file_info, &source, &project_name))
            .await
            .map_err(|err| codegraph_domain::Error::parse(file_path.clone(), err.to_string()))??;

        let module_qn = QualifiedName::for_module(&options.project_name, &pf.file_info.relative_path);
        register_entities(&pf.entities, &mut guard.registry);
        guard.inheritance.record_all(&pf.entities, module_qn.as_str(), &guard.registry, |m, l| guard.imports.resolve(m, l).map(str::to_owned));
        process_imports(&mut guard.imports, &pf, module_qn.as_str(), &options.project_name);
        guard.cache.put(pf.file_info.absolute_path.clone(), pf.tree.clone(), pf.file_info.language, pf.file_info.size_bytes as usize);

        writer.add_parsed_file(&pf, &options.project_name).await?;
        let flush = writer.flush_all().await?;
        info!(path = %relative_path.display(), entities = flush.entities_flushed, relationships = flush.relationships_flushed, "incremental graph update flushed");

        let counter = TokenCounter::new();
        let chunks = vector_indexer::chunk_file(&pf.entities, &pf.file_info, &options.project_name, &counter, options.chunk_max_tokens, options.chunk_overlap_tokens);
        vector_indexer::embed_and_upsert(chunks, embedder, vector, &options.project_name).await?;

        // CALLS re-resolution runs last: it's the only step that can see
        // this file's freshly embedded vectors alongside its graph nodes.
        resolve_classes_and_calls(&pf.entities, &module_qn, None, &guard.registry, &guard.imports, &guard.inheritance, &mut writer).await?;
        let calls_flush = writer.flush_all().await?;
        info!(path = %relative_path.display(), relationships = calls_flush.relationships_flushed, "incremental CALLS update flushed");

        Ok(())
    }

    /// Signal the consumer task to stop and join the OS observer, waiting up
    /// to [`crate::constants::WATCHER_JOIN_TIMEOUT`] before giving up.
    pub async fn stop(mut self) -> Result<()> {
        self.cancel.cancel();
        if let Some(handle) = self.consumer.take() {
            match tokio::time::timeout(crate::constants::WATCHER_JOIN_TIMEOUT, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => warn!(error = %err, "watcher consumer task panicked"),
                Err(_) => warn!("timed out waiting for watcher consumer to stop"),
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn project_name(&self) -> &str {
        &self.options.project_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use codegraph_domain::ports::{EmbedProgress, GraphRow, VectorPoint, VectorSearchHit};
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct RecordingGraphStore {
        queries: StdMutex<Vec<String>>,
    }

    #[async_trait]
    impl GraphStore for RecordingGraphStore {
        async fn execute(&self, query: &str, _params: serde_json::Value) -> Result<Vec<GraphRow>> {
            self.queries.lock().unwrap().push(query.to_owned());
            Ok(vec![])
        }
        async fn ping(&self) -> Result<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct NullVectorStore;

    #[async_trait]
    impl VectorStore for NullVectorStore {
        async fn ensure_collection(&self, _collection: &str, _dimensions: usize) -> Result<()> {
            Ok(())
        }
        async fn upsert(&self, _collection: &str, _points: Vec<VectorPoint>) -> Result<()> {
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

    #[tokio::test]
    async fn bootstrap_registers_entities_from_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.py"), "def f():\n    return g()\n\ndef g():\n    return 1\n").unwrap();

        let options = WatcherOptions::new("proj", dir.path().to_path_buf());
        let watcher = Watcher::start(
            options,
            Arc::new(RecordingGraphStore::default()),
            Arc::new(NullVectorStore),
            Arc::new(FixedEmbeddingProvider),
            AstCacheLimits { max_entries: 100, max_memory_bytes: 10_000_000 },
        )
        .await
        .expect("watcher starts");

        assert!(watcher.state.lock().await.registry.get("proj.a.f").is_some());
        watcher.stop().await.expect("watcher stops");
    }

    #[tokio::test]
    async fn created_file_is_incrementally_indexed() {
        let dir = tempfile::tempdir().unwrap();
        let options = WatcherOptions::new("proj", dir.path().to_path_buf());
        let graph = Arc::new(RecordingGraphStore::default());
        let watcher = Watcher::start(
            options,
            Arc::clone(&graph) as Arc<dyn GraphStore>,
            Arc::new(NullVectorStore),
            Arc::new(FixedEmbeddingProvider),
            AstCacheLimits { max_entries: 100, max_memory_bytes: 10_000_000 },
        )
        .await
        .expect("watcher starts");

        let file_path = dir.path().join("b.py");
        std::fs::write(&file_path, "def h():\n    pass\n").unwrap();

        Watcher::handle_path_event(&file_path, &watcher.options, &watcher.state, &watcher.graph, &watcher.vector, &watcher.embedder).await.expect("update succeeds");

        assert!(watcher.state.lock().await.registry.get("proj.b.h").is_some());
        assert!(graph.queries.lock().unwrap().iter().any(|q| q.contains("MERGE (n:Function")));
        watcher.stop().await.expect("watcher stops");
    }
}
