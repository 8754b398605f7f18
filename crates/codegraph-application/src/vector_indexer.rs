//! Vector indexer (§4.9): chunk parsed entities and upsert their embeddings
//! into the `code_chunks` collection.

use std::sync::Arc;

use codegraph_domain::entities::{Chunk, CodeEntity, EntityKind, FileInfo};
use codegraph_domain::ports::{EmbeddingProvider, PayloadFilter, VectorPoint, VectorStore};
use codegraph_domain::value_objects::QualifiedName;
use codegraph_domain::Result;
use codegraph_utils::TokenCounter;
use serde_json::json;
use uuid::Uuid;

pub const CODE_CHUNKS_COLLECTION: &str = "code_chunks";

/// Format and split one file's parsed entities into chunks. Files with no
/// entities produce a single whole-file chunk.
pub fn chunk_file(entities: &[CodeEntity], file_info: &FileInfo, project_name: &str, counter: &TokenCounter, max_tokens: usize, overlap_tokens: usize) -> Vec<Chunk> {
    if entities.is_empty() {
        let content = format!("# {}\n", file_info.relative_path.display());
        let qn = QualifiedName::for_module(project_name, &file_info.relative_path);
        return split_into_chunks(&content, &file_info.relative_path, "file", qn.simple_name(), file_info.language, 1, file_info.line_count.max(1), &qn, project_name, counter, max_tokens, overlap_tokens);
    }

    let mut chunks = Vec::new();
    for entity in entities {
        chunk_entity(entity, file_info, project_name, counter, max_tokens, overlap_tokens, &mut chunks);
    }
    chunks
}

fn chunk_entity(entity: &CodeEntity, file_info: &FileInfo, project_name: &str, counter: &TokenCounter, max_tokens: usize, overlap_tokens: usize, out: &mut Vec<Chunk>) {
    let content = format_entity(entity);
    out.extend(split_into_chunks(
        &content,
        &entity.file_path,
        entity.kind.tag(),
        &entity.name,
        file_info.language,
        entity.start_line,
        entity.end_line,
        &entity.qualified_name,
        project_name,
        counter,
        max_tokens,
        overlap_tokens,
    ));

    if let EntityKind::Class { children, .. } = &entity.kind {
        for child in children {
            chunk_entity(child, file_info, project_name, counter, max_tokens, overlap_tokens, out);
        }
    }
}

fn format_entity(entity: &CodeEntity) -> String {
    let mut text = entity.signature.clone();
    if let Some(doc) = &entity.docstring {
        text.push('\n');
        text.push_str(doc);
    }
    text.push('\n');
    text.push_str(&entity.code);
    text
}

#[allow(clippy::too_many_arguments)]
fn split_into_chunks(
    content: &str,
    file_path: &std::path::Path,
    entity_type: &str,
    entity_name: &str,
    language: codegraph_domain::value_objects::Language,
    start_line: usize,
    end_line: usize,
    qn: &QualifiedName,
    project_name: &str,
    counter: &TokenCounter,
    max_tokens: usize,
    overlap_tokens: usize,
) -> Vec<Chunk> {
    if counter.count(content) <= max_tokens {
        return vec![Chunk::new(content.to_owned(), file_path.to_path_buf(), entity_type, entity_name, language, start_line, end_line, qn.clone(), project_name)];
    }

    let parts = counter.split_with_overlap(content, max_tokens, overlap_tokens);
    let lines_per_part = ((end_line - start_line + 1) as f64 / parts.len().max(1) as f64).ceil() as usize;

    parts
        .into_iter()
        .enumerate()
        .map(|(i, part)| {
            let part_qn = if i == 0 { qn.clone() } else { QualifiedName::new(format!("{}_part{}", qn.as_str(), i + 1)) };
            let part_start = start_line + i * lines_per_part;
            let part_end = (part_start + lines_per_part).min(end_line);
            Chunk::new(part, file_path.to_path_buf(), entity_type, entity_name, language, part_start, part_end, part_qn, project_name)
        })
        .collect()
}

/// Embed `chunks` and upsert them. Bounded concurrency and rate-limit
/// back-off are the embedding provider's own responsibility (its
/// `embed_batch` contract); existing points for each distinct `file_path`
/// in the batch are deleted first so re-indexing a file doesn't leave
/// stale sub-chunks behind.
pub async fn embed_and_upsert(chunks: Vec<Chunk>, embedder: &Arc<dyn EmbeddingProvider>, store: &Arc<dyn VectorStore>, project_name: &str) -> Result<usize> {
    if chunks.is_empty() {
        return Ok(0);
    }

    store.ensure_collection(CODE_CHUNKS_COLLECTION, embedder.dimensions()).await?;

    let mut file_paths: Vec<String> = chunks.iter().map(|c| c.file_path.to_string_lossy().into_owned()).collect();
    file_paths.sort();
    file_paths.dedup();
    for path in &file_paths {
        store.delete_by_filter(CODE_CHUNKS_COLLECTION, PayloadFilter::eq("file_path", path.clone()).and_eq("project_name", project_name.to_owned())).await?;
    }

    let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
    let vectors = embedder.embed_batch(&texts, None).await?;

    let points: Vec<VectorPoint> = chunks
        .iter()
        .zip(vectors)
        .map(|(chunk, vector)| VectorPoint {
            id: Uuid::new_v4(),
            vector,
            payload: json!({
                "file_path": chunk.file_path.to_string_lossy(),
                "project_name": chunk.project_name,
                "entity_type": chunk.entity_type,
                "entity_name": chunk.entity_name,
                "language": chunk.language.to_string(),
                "content_hash": chunk.content_hash,
                "graph_node_id": chunk.graph_node_id.as_str(),
            })
            .as_object()
            .cloned()
            .unwrap_or_default(),
        })
        .collect();

    let count = points.len();
    store.upsert(CODE_CHUNKS_COLLECTION, points).await?;
    Ok(count)
}

/// True iff no point with this exact `(file_path, content_hash)` exists.
pub async fn file_needs_update(store: &Arc<dyn VectorStore>, path: &str, hash: &str, project_name: &str) -> Result<bool> {
    let filter = PayloadFilter::eq("file_path", path.to_owned()).and_eq("project_name", project_name.to_owned()).and_eq("content_hash", hash.to_owned());
    let hits = store.scroll_by_filter(CODE_CHUNKS_COLLECTION, filter, 1).await?;
    Ok(hits.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use codegraph_domain::value_objects::Language;
    use std::path::PathBuf;

    fn counter() -> TokenCounter {
        TokenCounter::new()
    }

    #[test]
    fn short_entity_produces_single_chunk() {
        let entity = CodeEntity {
            name: "f".to_owned(),
            qualified_name: QualifiedName::new("proj.a.f"),
            signature: "def f():".to_owned(),
            docstring: None,
            code: "def f():\n    pass\n".to_owned(),
            start_line: 1,
            end_line: 2,
            file_path: PathBuf::from("a.py"),
            kind: EntityKind::Function { is_async: false, calls: vec![] },
        };
        let info = FileInfo::from_bytes(PathBuf::from("/repo/a.py"), PathBuf::from("a.py"), Language::Python, b"def f():\n    pass\n");

        let chunks = chunk_file(std::slice::from_ref(&entity), &info, "proj", &counter(), 512, 64);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].graph_node_id.as_str(), "proj.a.f");
    }

    #[test]
    fn long_entity_splits_into_overlapping_parts_with_suffix_names() {
        let body = "x = 1\n".repeat(2000);
        let entity = CodeEntity {
            name: "big".to_owned(),
            qualified_name: QualifiedName::new("proj.a.big"),
            signature: "def big():".to_owned(),
            docstring: None,
            code: body,
            start_line: 1,
            end_line: 2000,
            file_path: PathBuf::from("a.py"),
            kind: EntityKind::Function { is_async: false, calls: vec![] },
        };
        let info = FileInfo::from_bytes(PathBuf::from("/repo/a.py"), PathBuf::from("a.py"), Language::Python, b"x");

        let chunks = chunk_file(std::slice::from_ref(&entity), &info, "proj", &counter(), 100, 10);
        assert!(chunks.len() > 1);
        assert_eq!(chunks[1].graph_node_id.as_str(), "proj.a.big_part2");
    }

    #[test]
    fn file_with_no_entities_produces_whole_file_chunk() {
        let info = FileInfo::from_bytes(PathBuf::from("/repo/README.py"), PathBuf::from("README.py"), Language::Python, b"# nothing here\n");
        let chunks = chunk_file(&[], &info, "proj", &counter(), 512, 64);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].entity_type, "file");
    }
}
