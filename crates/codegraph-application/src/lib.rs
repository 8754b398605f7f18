//! Application layer: orchestrates the domain ports into the indexing and
//! documentation pipelines described in §4.
//!
//! This crate depends only on `codegraph-domain`, `codegraph-language`,
//! `codegraph-resolver`, `codegraph-utils`, and pure-Rust libraries for
//! async, serialization, and logging. It has no dependency on any concrete
//! provider — those live in `codegraph-infrastructure` and
//! `codegraph-providers` and are reached only through the domain ports.

pub mod constants;
pub mod document_pipeline;
pub mod drift;
pub mod graph_writer;
pub mod metadata;
pub mod pipeline;
pub mod project_manager;
pub mod summarizer;
pub mod vector_indexer;
pub mod watcher;

pub use drift::{DriftDetector, DriftInput};
pub use graph_writer::{FlushReport, GraphWriter};
pub use metadata::MetadataGenerator;
pub use pipeline::{Pipeline, PipelineContext, PipelineOptions, PipelineReport, ProgressEvent, Stage};
pub use project_manager::{ProjectDetail, ProjectManager, ProjectSummary};
pub use summarizer::{Subject, Summarizer};
pub use watcher::{Watcher, WatcherOptions};
