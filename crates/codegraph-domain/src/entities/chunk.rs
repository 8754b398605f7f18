//! `Chunk`: one unit submitted to the embedding provider and upserted to
//! the `code_chunks` vector collection.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::value_objects::{Language, QualifiedName};

/// A chunk of code text ready for embedding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Formatted chunk text (signature + docstring + body, or whole file).
    pub content: String,
    /// Path of the source file, relative to the project root.
    pub file_path: PathBuf,
    /// `"class" | "function" | "method" | "file"`.
    pub entity_type: String,
    /// Local name of the entity, or the file stem for whole-file chunks.
    pub entity_name: String,
    /// Source language.
    pub language: Language,
    /// 1-based, inclusive start line.
    pub start_line: usize,
    /// 1-based, inclusive end line.
    pub end_line: usize,
    /// Qualified name of the entity this chunk documents, used as the
    /// graph-node join key (`qualified_name` for sub-chunks, e.g.
    /// `proj.a.Foo.bar_part2`).
    pub graph_node_id: QualifiedName,
    /// SHA-256 hex digest of `content`, used for dedup and "needs update"
    /// checks.
    pub content_hash: String,
    /// Name of the project this chunk belongs to.
    pub project_name: String,
}

impl Chunk {
    /// Build a chunk, computing `content_hash` deterministically from
    /// `content`.
    #[must_use]
    pub fn new(
        content: String,
        file_path: PathBuf,
        entity_type: impl Into<String>,
        entity_name: impl Into<String>,
        language: Language,
        start_line: usize,
        end_line: usize,
        graph_node_id: QualifiedName,
        project_name: impl Into<String>,
    ) -> Self {
        let content_hash = hex::encode(Sha256::digest(content.as_bytes()));
        Self {
            content,
            file_path,
            entity_type: entity_type.into(),
            entity_name: entity_name.into(),
            language,
            start_line,
            end_line,
            graph_node_id,
            content_hash,
            project_name: project_name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_hash_is_deterministic_function_of_content() {
        let qn = QualifiedName::new("proj.a.foo");
        let a = Chunk::new(
            "fn foo() {}".to_owned(),
            "a.rs".into(),
            "function",
            "foo",
            Language::Rust,
            1,
            1,
            qn.clone(),
            "proj",
        );
        let b = Chunk::new(
            "fn foo() {}".to_owned(),
            "b.rs".into(),
            "function",
            "foo",
            Language::Rust,
            5,
            5,
            qn,
            "proj",
        );
        assert_eq!(a.content_hash, b.content_hash);
    }
}
