use std::path::PathBuf;

use codegraph_application::{Pipeline, PipelineOptions};
use codegraph_language::AstCacheLimits;
use tokio::sync::mpsc;

use crate::context::AppContext;
use crate::render::print_progress;

pub async fn run(ctx: &AppContext, path: PathBuf, name: Option<String>, force: bool, skip_metadata: bool) -> anyhow::Result<()> {
    let project_name = name.unwrap_or_else(|| default_project_name(&path));

    let cache_limits = AstCacheLimits {
        max_entries: ctx.config.caching.max_entries,
        max_memory_bytes: ctx.config.caching.max_memory_mb * 1024 * 1024,
    };
    let mut pipeline = Pipeline::new(ctx.graph.clone(), ctx.vector.clone(), ctx.embedder.clone(), ctx.llm.clone(), ctx.relational.clone(), cache_limits);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let options = PipelineOptions::new(project_name, path)
        .with_force(force)
        .with_skip_metadata(skip_metadata)
        .with_progress_tx(tx);

    let renderer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            print_progress(&event);
        }
    });

    let report = pipeline.run(options).await?;
    let _ = renderer.await;

    println!("files scanned:      {}", report.files_scanned);
    println!("files parsed:       {}", report.files_parsed);
    println!("files unchanged:    {}", report.files_skipped_unchanged);
    println!("entities summarized: {}", report.entities_summarized);
    println!("chunks embedded:    {}", report.chunks_embedded);
    println!("metadata regenerated: {}", report.metadata_regenerated);
    Ok(())
}

fn default_project_name(path: &std::path::Path) -> String {
    path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_else(|| "project".to_owned())
}
