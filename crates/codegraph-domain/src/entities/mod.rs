//! Core domain entities.
//!
//! Entities here are plain data with no behavior beyond small invariant
//! helpers — the rules that act on them (parsing, resolving, batching) live
//! in the crates that consume this one.

mod chunk;
mod code_entity;
mod document;
mod drift;
mod file_info;
mod import_record;
mod project;
mod project_metadata;

pub use chunk::Chunk;
pub use code_entity::{CodeEntity, EntityKind};
pub use document::{Document, DocumentChunk, DocumentLink, DriftStatus, ExplicitMatchPattern, LinkType, Relevance};
pub use drift::{DriftAnalysis, DriftIssue, DriftSeverity};
pub use file_info::FileInfo;
pub use import_record::ImportRecord;
pub use project::Project;
pub use project_metadata::ProjectMetadata;
