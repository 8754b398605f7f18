use std::path::PathBuf;

use codegraph_application::{Watcher, WatcherOptions};
use codegraph_language::AstCacheLimits;

use crate::context::AppContext;

pub async fn run(ctx: &AppContext, path: PathBuf, name: Option<String>, no_calls: bool) -> anyhow::Result<()> {
    let project_name = name.unwrap_or_else(|| path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_else(|| "project".to_owned()));

    let cache_limits = AstCacheLimits {
        max_entries: ctx.config.caching.max_entries,
        max_memory_bytes: ctx.config.caching.max_memory_mb * 1024 * 1024,
    };
    let options = WatcherOptions::new(project_name, path).with_recalculate_calls(!no_calls);

    let watcher = Watcher::start(options, ctx.graph.clone(), ctx.vector.clone(), ctx.embedder.clone(), cache_limits).await?;
    println!("watching {} for changes, press ctrl-c to stop", watcher.project_name());

    tokio::signal::ctrl_c().await?;
    watcher.stop().await?;
    Ok(())
}
