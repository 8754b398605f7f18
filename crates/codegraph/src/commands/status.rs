use codegraph_application::ProjectManager;
use codegraph_domain::ports::{GraphStore, RelationalStore, VectorStore};

use crate::context::AppContext;

pub async fn run(ctx: &AppContext) -> anyhow::Result<()> {
    print_store_status("graph store", ctx.graph.ping().await);
    print_store_status("vector store", ctx.vector.ping().await);
    print_store_status("relational store", ctx.relational.ping().await);
    println!();

    let manager = ProjectManager::new(ctx.graph.clone(), ctx.vector.clone(), ctx.relational.clone());
    let projects = manager.list_projects().await?;
    if projects.is_empty() {
        println!("no indexed projects");
        return Ok(());
    }

    for summary in projects {
        println!("{}\tlast indexed: {}", summary.name, summary.last_indexed_at.as_deref().unwrap_or("never"));
    }
    Ok(())
}

fn print_store_status(label: &str, result: codegraph_domain::Result<()>) {
    match result {
        Ok(()) => println!("{label}: reachable"),
        Err(err) => println!("{label}: unreachable ({err})"),
    }
}
