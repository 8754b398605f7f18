use std::path::{Path, PathBuf};

use codegraph_application::document_pipeline::{chunk_markdown, extract_title, scan_markdown_files, DocumentPipeline};
use codegraph_application::{DriftDetector, DriftInput};
use codegraph_application::ProjectManager;
use codegraph_domain::entities::Document;
use codegraph_domain::ports::RelationalStore;
use codegraph_domain::value_objects::{DocumentId, Language};
use codegraph_resolver::SymbolRegistry;
use codegraph_utils::TokenCounter;
use serde_json::json;

use crate::cli::DocsCommand;
use crate::context::AppContext;

pub async fn run(ctx: &AppContext, command: DocsCommand) -> anyhow::Result<()> {
    match command {
        DocsCommand::Index { path, project, doc_type, force } => index(ctx, path, project, doc_type, force).await,
        DocsCommand::Drift { project, document, entity } => drift(ctx, project, document, entity).await,
        DocsCommand::List { project, drifted, json } => list(ctx, project, drifted, json).await,
        DocsCommand::Links { document, entity, project } => links(ctx, document, entity, project).await,
        DocsCommand::Show { path, project, chunks } => show(ctx, path, project, chunks).await,
    }
}

async fn index(ctx: &AppContext, path: PathBuf, project: String, doc_type: String, force: bool) -> anyhow::Result<()> {
    let _ = doc_type;
    let pipeline = DocumentPipeline::new(ctx.relational.clone(), ctx.vector.clone(), ctx.embedder.clone(), ctx.llm.clone());
    let registry = build_symbol_registry(ctx, &project).await?;
    let counter = TokenCounter::new();

    let mut indexed = 0usize;
    for file in scan_markdown_files(&path) {
        let relative = file.strip_prefix(&path).unwrap_or(&file).to_path_buf();
        let content = std::fs::read_to_string(&file)?;
        let content_hash = codegraph_utils::sha256_hex(&content);

        if !force {
            if let Some(existing) = ctx.relational.document_by_path(&project, &relative.to_string_lossy()).await? {
                if existing.content_hash == content_hash {
                    continue;
                }
            }
        }

        let document = Document {
            id: DocumentId::from_name(&format!("{project}:{}", relative.to_string_lossy())),
            project_name: project.clone(),
            file_path: relative.clone(),
            title: extract_title(&content, &relative),
            content_hash,
        };

        let chunks = chunk_markdown(&content, document.id, &project, &counter, ctx.config.indexing.chunk_max_tokens, ctx.config.indexing.chunk_overlap_tokens);
        let chunks = pipeline.reindex_document(&document, chunks).await?;

        for chunk in &chunks {
            pipeline.establish_links(chunk, &registry, &project).await?;
        }

        indexed += 1;
        println!("indexed {}", relative.display());
    }

    println!("{indexed} document(s) indexed");
    Ok(())
}

async fn drift(ctx: &AppContext, project: String, document: Option<String>, entity: Option<String>) -> anyhow::Result<()> {
    let manager = ProjectManager::new(ctx.graph.clone(), ctx.vector.clone(), ctx.relational.clone());
    let Some(detail) = manager.get_project(&project).await? else {
        anyhow::bail!("no such project: {project}");
    };
    let detector = DriftDetector::new(ctx.llm.clone(), ctx.relational.clone(), ctx.config.tuning.drift.get("max_parallel").and_then(|v| v.as_integer()).map_or(1, |n| n as usize));

    let documents = match &document {
        Some(path) => ctx.relational.document_by_path(&project, path).await?.into_iter().collect(),
        None => ctx.relational.documents_for_project(&project).await?,
    };

    let mut analyzed = 0usize;
    for doc in documents {
        for chunk in ctx.relational.chunks_for_document(doc.id).await? {
            for link in ctx.relational.links_for_chunk(chunk.id).await? {
                if let Some(wanted) = &entity {
                    if &link.entity_qn != wanted {
                        continue;
                    }
                }

                let Some((kind, file_path, language, code_content)) = fetch_entity_code(ctx, &detail.root_path, &link.entity_qn).await? else {
                    continue;
                };

                let result = detector
                    .analyze(DriftInput {
                        chunk_id: chunk.id,
                        doc_path: &doc.file_path.to_string_lossy(),
                        entity_qn: &link.entity_qn,
                        entity_kind: &kind,
                        file_path: &file_path,
                        doc_excerpt: &chunk.content,
                        doc_hash: &chunk.content_hash,
                        code_content: &code_content,
                        code_hash: &codegraph_utils::sha256_hex(&code_content),
                        language,
                        trigger: "manual",
                    })
                    .await?;

                if let Some(analysis) = result {
                    analyzed += 1;
                    println!("{}\t{}\t{:?}\t{:.2}", doc.file_path.display(), link.entity_qn, analysis.drift_severity, analysis.drift_score);
                }
            }
        }
    }

    println!("{analyzed} drift analysis/analyses recorded");
    Ok(())
}

async fn list(ctx: &AppContext, project: String, drifted: bool, as_json: bool) -> anyhow::Result<()> {
    let documents = ctx.relational.documents_for_project(&project).await?;

    for doc in documents {
        let is_drifted = if drifted {
            let chunks = ctx.relational.chunks_for_document(doc.id).await?;
            chunks.iter().any(|c| !matches!(c.drift_status, codegraph_domain::entities::DriftStatus::Aligned | codegraph_domain::entities::DriftStatus::Unknown))
        } else {
            true
        };
        if !is_drifted {
            continue;
        }

        if as_json {
            println!("{}", json!({ "file_path": doc.file_path, "title": doc.title, "content_hash": doc.content_hash }));
        } else {
            println!("{}\t{}", doc.file_path.display(), doc.title);
        }
    }
    Ok(())
}

async fn links(ctx: &AppContext, document: Option<String>, entity: Option<String>, project: Option<String>) -> anyhow::Result<()> {
    let Some(project) = project else {
        anyhow::bail!("--project is required");
    };

    let documents = match &document {
        Some(path) => ctx.relational.document_by_path(&project, path).await?.into_iter().collect(),
        None => ctx.relational.documents_for_project(&project).await?,
    };

    for doc in documents {
        for chunk in ctx.relational.chunks_for_document(doc.id).await? {
            for link in ctx.relational.links_for_chunk(chunk.id).await? {
                if let Some(wanted) = &entity {
                    if &link.entity_qn != wanted {
                        continue;
                    }
                }
                println!("{}\t{}\t{:?}\t{:.2}", doc.file_path.display(), link.entity_qn, link.link_type, link.confidence);
            }
        }
    }
    Ok(())
}

async fn show(ctx: &AppContext, path: String, project: String, chunks: bool) -> anyhow::Result<()> {
    let Some(document) = ctx.relational.document_by_path(&project, &path).await? else {
        anyhow::bail!("no such document: {path}");
    };

    if !chunks {
        println!("{}\t{}", document.file_path.display(), document.title);
        return Ok(());
    }

    for chunk in ctx.relational.chunks_for_document(document.id).await? {
        println!("--- {} (lines {}-{}) ---", chunk.heading_path.join(" / "), chunk.start_line, chunk.end_line);
        println!("{}", chunk.content);
    }
    Ok(())
}

async fn build_symbol_registry(ctx: &AppContext, project: &str) -> anyhow::Result<SymbolRegistry> {
    let rows = ctx
        .graph
        .execute(
            "MATCH (n) WHERE n.project_name = $project AND (n:Class OR n:Function OR n:Method) RETURN n.qualified_name AS qn, n.kind AS kind",
            json!({ "project": project }),
        )
        .await?;

    let mut registry = SymbolRegistry::new();
    for row in rows {
        let (Some(qn), Some(kind)) = (row.get_str("qn"), row.get_str("kind")) else { continue };
        let kind: codegraph_resolver::Kind = match kind {
            "class" => "class",
            "method" => "method",
            _ => "function",
        };
        registry.register(qn, kind);
    }
    Ok(registry)
}

/// Read the linked entity's current source text off disk, using the
/// project's root path plus the entity's recorded file/line range.
async fn fetch_entity_code(ctx: &AppContext, project_root: &str, entity_qn: &str) -> anyhow::Result<Option<(String, String, Language, String)>> {
    let rows = ctx
        .graph
        .execute(
            "MATCH (n {qualified_name: $qn}) RETURN n.kind AS kind, n.file_path AS file_path, n.start_line AS start_line, n.end_line AS end_line",
            json!({ "qn": entity_qn }),
        )
        .await?;
    let Some(row) = rows.first() else {
        return Ok(None);
    };
    let kind = row.get_str("kind").unwrap_or("function").to_owned();
    let Some(file_path) = row.get_str("file_path") else {
        return Ok(None);
    };
    let start_line = row.get_i64("start_line").unwrap_or(1).max(1) as usize;
    let end_line = row.get_i64("end_line").unwrap_or(start_line as i64).max(start_line as i64) as usize;

    let full_path = Path::new(project_root).join(file_path);
    let Ok(content) = std::fs::read_to_string(&full_path) else {
        return Ok(None);
    };
    let language = Language::from_extension(full_path.extension().and_then(|e| e.to_str()).unwrap_or_default()).unwrap_or(Language::Python);
    let excerpt: String = content.lines().skip(start_line.saturating_sub(1)).take(end_line.saturating_sub(start_line) + 1).collect::<Vec<_>>().join("\n");

    Ok(Some((kind, file_path.to_owned(), language, excerpt)))
}
