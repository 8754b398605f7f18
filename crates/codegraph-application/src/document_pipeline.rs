//! Markdown document pipeline (§4.11): scan, title/heading chunking, and
//! explicit + implicit link establishment against the code graph.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use codegraph_domain::entities::{Document, DocumentChunk, DocumentLink, DriftStatus, ExplicitMatchPattern, LinkType, Relevance};
use codegraph_domain::ports::{ChatMessage, EmbeddingProvider, LlmProvider, PayloadFilter, RelationalStore, VectorStore};
use codegraph_domain::value_objects::{ChunkId, DocumentId};
use codegraph_domain::Result;
use codegraph_resolver::SymbolRegistry;
use codegraph_utils::TokenCounter;
use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};
use regex::Regex;
use serde::Deserialize;
use tracing::warn;

use crate::constants::{DOC_EXTENSIONS, IMPLICIT_LINK_CANDIDATE_COUNT, TITLE_SCAN_LINES};
use crate::vector_indexer::CODE_CHUNKS_COLLECTION;

/// Recursively collect every Markdown file (`.md`, `.markdown`, `.mdx`)
/// under `root`.
#[must_use]
pub fn scan_markdown_files(root: &Path) -> Vec<PathBuf> {
    walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|path| path.extension().and_then(|ext| ext.to_str()).is_some_and(|ext| DOC_EXTENSIONS.contains(&ext.to_lowercase().as_str())))
        .collect()
}

/// The title is the first level-1 heading (`# Title`) in the first
/// [`TITLE_SCAN_LINES`] lines, or the file stem if none is found.
#[must_use]
pub fn extract_title(content: &str, file_path: &Path) -> String {
    for line in content.lines().take(TITLE_SCAN_LINES) {
        if let Some(rest) = line.trim_start().strip_prefix("# ") {
            return rest.trim().to_owned();
        }
    }
    file_path.file_stem().and_then(|s| s.to_str()).unwrap_or("untitled").to_owned()
}

struct Section {
    heading_path: Vec<String>,
    heading_level: u8,
    start_line: usize,
    end_line: usize,
    content: String,
}

fn heading_level_as_u8(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn line_of_offset(content: &str, offset: usize) -> usize {
    content.as_bytes()[..offset.min(content.len())].iter().filter(|&&b| b == b'\n').count() + 1
}

/// Walk `content`'s Markdown heading structure and split it into sections,
/// one per heading (plus a leading section for any content before the
/// first heading), tracking the stack of enclosing headings.
fn split_into_sections(content: &str) -> Vec<Section> {
    let mut heading_starts: Vec<(usize, u8, String)> = Vec::new();
    let mut in_heading: Option<(u8, String)> = None;
    let mut heading_text = String::new();

    for (event, range) in Parser::new(content).into_offset_iter() {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                in_heading = Some((heading_level_as_u8(level), String::new()));
                let _ = range;
            }
            Event::Text(text) | Event::Code(text) if in_heading.is_some() => {
                heading_text.push_str(&text);
            }
            Event::End(TagEnd::Heading(level)) => {
                let lvl = heading_level_as_u8(level);
                heading_starts.push((range.start, lvl, heading_text.trim().to_owned()));
                heading_text.clear();
                in_heading = None;
            }
            _ => {}
        }
    }

    let mut sections = Vec::new();
    let mut stack: Vec<(u8, String)> = Vec::new();
    let mut cursor = 0usize;

    for (offset, level, title) in heading_starts {
        if offset > cursor {
            sections.push(make_section(&stack, content, cursor, offset));
        }
        stack.retain(|(lvl, _)| *lvl < level);
        stack.push((level, title));
        cursor = offset;
    }
    if cursor < content.len() || sections.is_empty() {
        sections.push(make_section(&stack, content, cursor, content.len()));
    }

    sections
}

fn make_section(stack: &[(u8, String)], content: &str, start: usize, end: usize) -> Section {
    Section {
        heading_path: stack.iter().map(|(_, title)| title.clone()).collect(),
        heading_level: stack.last().map_or(0, |(level, _)| *level),
        start_line: line_of_offset(content, start),
        end_line: line_of_offset(content, end.saturating_sub(1).max(start)),
        content: content[start..end].to_owned(),
    }
}

/// Chunk a document's content by Markdown heading, sub-splitting any
/// section that exceeds `max_tokens` and carrying explicit references into
/// [`DocumentChunk::explicit_references`].
#[must_use]
pub fn chunk_markdown(content: &str, document_id: DocumentId, project_name: &str, counter: &TokenCounter, max_tokens: usize, overlap_tokens: usize) -> Vec<DocumentChunk> {
    let mut chunks = Vec::new();

    for section in split_into_sections(content) {
        let parts = counter.split_with_overlap(&section.content, max_tokens, overlap_tokens);
        let lines_per_part = ((section.end_line - section.start_line + 1) as f64 / parts.len().max(1) as f64).ceil() as usize;

        for (i, part) in parts.into_iter().enumerate() {
            let start_line = section.start_line + i * lines_per_part;
            let end_line = (start_line + lines_per_part).min(section.end_line);
            chunks.push(DocumentChunk {
                id: ChunkId::new(),
                document_id,
                project_name: project_name.to_owned(),
                explicit_references: extract_explicit_references(&part),
                content: part,
                heading_path: section.heading_path.clone(),
                heading_level: section.heading_level,
                start_line,
                end_line,
                content_hash: codegraph_utils::sha256_hex(""),
                drift_status: DriftStatus::Unknown,
                drift_score: None,
            });
        }
    }

    for chunk in &mut chunks {
        chunk.content_hash = codegraph_utils::sha256_hex(&chunk.content);
    }

    chunks
}

fn reference_candidate_regex() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)+").expect("valid reference regex"))
}

/// Extract candidate dotted-identifier reference strings from inline code
/// spans and fenced code blocks in `text`.
#[must_use]
pub fn extract_explicit_references(text: &str) -> Vec<String> {
    let mut refs: Vec<String> = Vec::new();
    let mut in_fence = false;

    for line in text.lines() {
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            refs.extend(reference_candidate_regex().find_iter(line).map(|m| m.as_str().to_owned()));
            continue;
        }
        for span in line.split('`').skip(1).step_by(2) {
            refs.extend(reference_candidate_regex().find_iter(span).map(|m| m.as_str().to_owned()));
        }
    }

    refs.sort();
    refs.dedup();
    refs
}

/// Match a chunk's explicit reference candidates against the symbol
/// registry, keeping only the highest-confidence link per resolved entity
/// QN.
#[must_use]
pub fn match_explicit_links(chunk: &DocumentChunk, registry: &SymbolRegistry) -> Vec<DocumentLink> {
    let mut best: HashMap<String, DocumentLink> = HashMap::new();

    for reference in &chunk.explicit_references {
        let hits = explicit_matches(reference, registry);
        for (qn, kind, pattern) in hits {
            let confidence = DocumentLink::explicit_confidence(pattern);
            let better = match best.get(&qn) {
                Some(existing) => confidence > existing.confidence,
                None => true,
            };
            if better {
                best.insert(
                    qn.clone(),
                    DocumentLink {
                        id: LinkIdFactory::new(chunk.id, &qn),
                        chunk_id: chunk.id,
                        entity_qn: qn,
                        entity_kind: kind.to_owned(),
                        file_path: PathBuf::new(),
                        link_type: LinkType::Explicit,
                        confidence,
                        line_range_start: None,
                        line_range_end: None,
                        code_version_hash: None,
                        reasoning: None,
                    },
                );
            }
        }
    }

    best.into_values().collect()
}

fn explicit_matches(reference: &str, registry: &SymbolRegistry) -> Vec<(String, &'static str, ExplicitMatchPattern)> {
    if let Some(kind) = registry.get(reference) {
        return vec![(reference.to_owned(), kind, ExplicitMatchPattern::ExactQn)];
    }

    let segments: Vec<&str> = reference.rsplit('.').take(2).collect();
    if segments.len() == 2 {
        let two_segment_suffix = format!("{}.{}", segments[1], segments[0]);
        let suffix_hits: Vec<_> = registry
            .find_ending_with(&two_segment_suffix)
            .into_iter()
            .filter_map(|qn| registry.get(&qn).map(|kind| (qn, kind, ExplicitMatchPattern::TwoSegmentSuffix)))
            .collect();
        if !suffix_hits.is_empty() {
            return suffix_hits;
        }
    }

    let simple = reference.rsplit('.').next().unwrap_or(reference);
    registry.find_by_simple_name(simple).into_iter().filter_map(|qn| registry.get(&qn).map(|kind| (qn, kind, ExplicitMatchPattern::SimpleNameSuffix))).collect()
}

/// Deterministic id derivation so re-running link establishment over an
/// unchanged chunk produces the same link ids instead of churning them.
struct LinkIdFactory;

impl LinkIdFactory {
    fn new(chunk_id: ChunkId, entity_qn: &str) -> codegraph_domain::value_objects::LinkId {
        codegraph_domain::value_objects::LinkId::from_name(&format!("{chunk_id}:{entity_qn}"))
    }
}

#[derive(Debug, Deserialize)]
struct LinkVerdict {
    entity_qn: String,
    relevance: Relevance,
    reasoning: String,
}

#[derive(Debug, Deserialize)]
struct LinkVerdicts {
    links: Vec<LinkVerdict>,
}

/// Orchestrates the document pipeline's store/provider dependencies.
pub struct DocumentPipeline {
    relational: Arc<dyn RelationalStore>,
    vector: Arc<dyn VectorStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    llm: Arc<dyn LlmProvider>,
}

impl DocumentPipeline {
    #[must_use]
    pub fn new(relational: Arc<dyn RelationalStore>, vector: Arc<dyn VectorStore>, embedder: Arc<dyn EmbeddingProvider>, llm: Arc<dyn LlmProvider>) -> Self {
        Self { relational, vector, embedder, llm }
    }

    /// Upsert `document`, replace its chunks, and return the freshly
    /// inserted chunks for link establishment.
    pub async fn reindex_document(&self, document: &Document, chunks: Vec<DocumentChunk>) -> Result<Vec<DocumentChunk>> {
        self.relational.upsert_document(document).await?;
        self.relational.delete_chunks_for_document(document.id).await?;
        self.relational.insert_chunks(&chunks).await?;
        Ok(chunks)
    }

    /// Establish explicit and implicit links for `chunk` and persist them,
    /// replacing any links from a previous run.
    pub async fn establish_links(&self, chunk: &DocumentChunk, registry: &SymbolRegistry, project_name: &str) -> Result<Vec<DocumentLink>> {
        let mut links = match_explicit_links(chunk, registry);
        let explicit_qns: std::collections::HashSet<&str> = links.iter().map(|l| l.entity_qn.as_str()).collect();

        let implicit = self.find_implicit_links(chunk, project_name).await?;
        for link in implicit {
            if !explicit_qns.contains(link.entity_qn.as_str()) {
                links.push(link);
            }
        }

        self.relational.replace_links(chunk.id, &links).await?;
        Ok(links)
    }

    async fn find_implicit_links(&self, chunk: &DocumentChunk, project_name: &str) -> Result<Vec<DocumentLink>> {
        let vector = self.embedder.embed(&chunk.content).await?;
        let filter = PayloadFilter::eq("project_name", project_name.to_owned());
        let hits = self.vector.search(CODE_CHUNKS_COLLECTION, &vector, IMPLICIT_LINK_CANDIDATE_COUNT, Some(filter)).await?;

        if hits.is_empty() {
            return Ok(Vec::new());
        }

        let candidates: Vec<(String, String)> = hits
            .iter()
            .filter_map(|hit| {
                let qn = hit.payload.get("graph_node_id")?.as_str()?.to_owned();
                let kind = hit.payload.get("entity_type")?.as_str()?.to_owned();
                Some((qn, kind))
            })
            .collect();

        let prompt = render_link_finder_prompt(chunk, &candidates);
        let reply = self.llm.complete(&prompt, Some(512), Some(0.0)).await?;

        let verdicts: LinkVerdicts = match codegraph_utils::parse_tolerant(&reply) {
            Ok(v) => v,
            Err(err) => {
                warn!(error = %err, "link finder returned unparseable JSON, skipping implicit links for this chunk");
                return Ok(Vec::new());
            }
        };

        let candidate_kinds: HashMap<&str, &str> = candidates.iter().map(|(qn, kind)| (qn.as_str(), kind.as_str())).collect();

        Ok(verdicts
            .links
            .into_iter()
            .filter_map(|verdict| {
                let kind = candidate_kinds.get(verdict.entity_qn.as_str())?;
                Some(DocumentLink {
                    id: LinkIdFactory::new(chunk.id, &verdict.entity_qn),
                    chunk_id: chunk.id,
                    confidence: DocumentLink::implicit_confidence(verdict.relevance),
                    entity_qn: verdict.entity_qn,
                    entity_kind: (*kind).to_owned(),
                    file_path: PathBuf::new(),
                    link_type: LinkType::Implicit,
                    line_range_start: None,
                    line_range_end: None,
                    code_version_hash: None,
                    reasoning: Some(verdict.reasoning),
                })
            })
            .collect())
    }
}

fn render_link_finder_prompt(chunk: &DocumentChunk, candidates: &[(String, String)]) -> Vec<ChatMessage> {
    let system = ChatMessage::system(
        "You judge whether a documentation passage is actually about specific code entities. \
         Reply with JSON only: {\"links\": [{\"entity_qn\": string, \"relevance\": \"high\"|\"medium\"|\"low\", \"reasoning\": string}]}. \
         Only include entity_qn values taken verbatim from the candidate list.",
    );
    let candidate_list: String = candidates.iter().map(|(qn, kind)| format!("- {qn} ({kind})")).collect::<Vec<_>>().join("\n");
    let user = ChatMessage::user(format!("Documentation passage:\n{}\n\nCandidate entities:\n{candidate_list}\n", chunk.content));
    vec![system, user]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_title_from_first_level_one_heading() {
        let content = "intro text\n# My Title\nmore text\n";
        assert_eq!(extract_title(content, Path::new("doc.md")), "My Title");
    }

    #[test]
    fn falls_back_to_file_stem_when_no_heading_present() {
        let content = "no headings here\n";
        assert_eq!(extract_title(content, Path::new("readme.md")), "readme");
    }

    #[test]
    fn chunk_markdown_tracks_heading_path_per_section() {
        let content = "# Top\n\nintro\n\n## Sub\n\ndetail\n";
        let counter = TokenCounter::new();
        let chunks = chunk_markdown(content, DocumentId::new(), "proj", &counter, 1000, 100);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].heading_path, vec!["Top".to_owned()]);
        assert_eq!(chunks[1].heading_path, vec!["Top".to_owned(), "Sub".to_owned()]);
    }

    #[test]
    fn extract_explicit_references_finds_dotted_identifiers_in_code_spans() {
        let text = "See `proj.a.Foo.bar` for details, plain prose `not.this.one` too.\n```\nproj.b.Baz.qux()\n```\n";
        let refs = extract_explicit_references(text);
        assert!(refs.contains(&"proj.a.Foo.bar".to_owned()));
        assert!(refs.contains(&"proj.b.Baz.qux".to_owned()));
    }

    #[test]
    fn match_explicit_links_prefers_exact_qn_over_suffix() {
        let mut registry = SymbolRegistry::new();
        registry.register("proj.a.Foo.bar", "method");

        let chunk = DocumentChunk {
            id: ChunkId::new(),
            document_id: DocumentId::new(),
            project_name: "proj".to_owned(),
            content: String::new(),
            heading_path: vec![],
            heading_level: 0,
            start_line: 1,
            end_line: 1,
            content_hash: String::new(),
            explicit_references: vec!["proj.a.Foo.bar".to_owned()],
            drift_status: DriftStatus::Unknown,
            drift_score: None,
        };

        let links = match_explicit_links(&chunk, &registry);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].confidence, DocumentLink::explicit_confidence(ExplicitMatchPattern::ExactQn));
    }
}
