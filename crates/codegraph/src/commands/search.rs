use codegraph_application::vector_indexer::CODE_CHUNKS_COLLECTION;
use codegraph_domain::ports::PayloadFilter;

use crate::context::AppContext;

pub async fn run(ctx: &AppContext, query: String, project: Option<String>, limit: usize) -> anyhow::Result<()> {
    let vector = ctx.embedder.embed(&query).await?;
    let filter = project.map(|name| PayloadFilter::eq("project_name", name));
    let hits = ctx.vector.search(CODE_CHUNKS_COLLECTION, &vector, limit, filter).await?;

    if hits.is_empty() {
        println!("no matches");
        return Ok(());
    }
    for hit in hits {
        let file_path = hit.payload.get("file_path").and_then(|v| v.as_str()).unwrap_or("?");
        let name = hit.payload.get("entity_name").and_then(|v| v.as_str()).unwrap_or("?");
        println!("{:.3}\t{file_path}\t{name}", hit.score);
    }
    Ok(())
}
