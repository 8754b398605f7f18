//! Application layer constants.
//!
//! Configuration-bindable defaults (chunk sizes, concurrency, retry policy)
//! live in `codegraph_domain::constants` and are reused from there; this
//! module only holds constants specific to orchestration.

// ============================================================================
// SCANNING
// ============================================================================

/// Directories skipped during codebase scanning regardless of ignore files.
pub const SKIP_DIRS: &[&str] = &[".git", "node_modules", "target", "__pycache__", "dist", "build"];

/// Publish a progress event every N files during a pipeline stage.
pub const PROGRESS_UPDATE_INTERVAL: usize = 10;

// ============================================================================
// GRAPH WRITER (§4.8)
// ============================================================================

/// Auto-flush an entity/relationship buffer once it holds this many records.
pub const DEFAULT_BATCH_SIZE: usize = 500;

// ============================================================================
// SUMMARIZER (§4.10) / DRIFT DETECTOR (§4.12)
// ============================================================================

/// Default bound on concurrent in-flight LLM summarization requests.
pub const DEFAULT_SUMMARY_CONCURRENCY: usize = 4;

/// Default bound on concurrent drift analyses within one project (§5:
/// "default 1 to protect rate limits").
pub const DEFAULT_DRIFT_CONCURRENCY: usize = 1;

/// Number of top-N candidate code chunks submitted to the implicit-link
/// finder per document chunk.
pub const IMPLICIT_LINK_CANDIDATE_COUNT: usize = 10;

/// Vector collection holding one embedded point per file/function/class
/// summary, alongside `code_chunks` and `document_chunks` (§6).
pub const SUMMARIES_COLLECTION: &str = "summaries";

// ============================================================================
// DOCUMENT PIPELINE (§4.11)
// ============================================================================

/// Markdown file extensions recognized by the document scanner.
pub const DOC_EXTENSIONS: &[&str] = &["md", "markdown", "mdx"];

/// Number of leading lines scanned for a document's title heading.
pub const TITLE_SCAN_LINES: usize = 20;

// ============================================================================
// WATCHER (§4.14)
// ============================================================================

/// Bounded channel capacity for the watcher's event queue.
pub const WATCHER_QUEUE_CAPACITY: usize = 1024;

/// Timeout for joining the OS filesystem observer on stop.
pub const WATCHER_JOIN_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);
