use codegraph_application::vector_indexer::CODE_CHUNKS_COLLECTION;
use codegraph_domain::ports::{ChatMessage, PayloadFilter};
use serde_json::json;

use crate::context::AppContext;

pub async fn run(ctx: &AppContext, question: String, project: Option<String>, limit: usize, verbose: bool) -> anyhow::Result<()> {
    let vector = ctx.embedder.embed(&question).await?;
    let filter = project.map(|name| PayloadFilter::eq("project_name", name));
    let hits = ctx.vector.search(CODE_CHUNKS_COLLECTION, &vector, limit, filter).await?;

    if hits.is_empty() {
        println!("no indexed code matched this question");
        return Ok(());
    }

    let mut context = String::new();
    for hit in &hits {
        let file_path = hit.payload.get("file_path").and_then(|v| v.as_str()).unwrap_or("?");
        let name = hit.payload.get("entity_name").and_then(|v| v.as_str()).unwrap_or("?");
        if verbose {
            eprintln!("matched {file_path} ({name}), score {:.3}", hit.score);
        }

        let excerpt = fetch_entity_excerpt(ctx, file_path, name).await.unwrap_or_default();
        context.push_str(&format!("--- {file_path} ({name}) ---\n{excerpt}\n\n"));
    }

    let messages = vec![
        ChatMessage::system("Answer the question using only the provided code excerpts. If they don't contain the answer, say so."),
        ChatMessage::user(format!("Question: {question}\n\nCode excerpts:\n{context}")),
    ];
    let answer = ctx.llm.complete(&messages, Some(1024), Some(0.2)).await?;
    println!("{answer}");
    Ok(())
}

/// The matched entity's signature and docstring, read back from the graph
/// (the vector store only carries search metadata, not the code body).
async fn fetch_entity_excerpt(ctx: &AppContext, file_path: &str, name: &str) -> anyhow::Result<String> {
    let rows = ctx
        .graph
        .execute(
            "MATCH (n {file_path: $file_path, name: $name}) RETURN n.signature AS signature, n.docstring AS docstring LIMIT 1",
            json!({ "file_path": file_path, "name": name }),
        )
        .await?;
    let Some(row) = rows.first() else {
        return Ok(String::new());
    };
    let signature = row.get_str("signature").unwrap_or_default();
    let docstring = row.get_str("docstring").unwrap_or_default();
    Ok(format!("{signature}\n{docstring}"))
}
