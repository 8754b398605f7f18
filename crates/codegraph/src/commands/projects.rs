use codegraph_application::ProjectManager;

use crate::cli::ProjectsCommand;
use crate::context::AppContext;

pub async fn run(ctx: &AppContext, command: ProjectsCommand) -> anyhow::Result<()> {
    let manager = ProjectManager::new(ctx.graph.clone(), ctx.vector.clone(), ctx.relational.clone());

    match command {
        ProjectsCommand::List => {
            let projects = manager.list_projects().await?;
            if projects.is_empty() {
                println!("no indexed projects");
            }
            for project in projects {
                println!("{}\t{}\t{}", project.name, project.root_path, project.last_indexed_at.as_deref().unwrap_or("never"));
            }
        }
        ProjectsCommand::Show { name } => {
            let Some(detail) = manager.get_project(&name).await? else {
                anyhow::bail!("no such project: {name}");
            };
            println!("name:         {}", detail.name);
            println!("root:         {}", detail.root_path);
            println!("last indexed: {}", detail.last_indexed_at.as_deref().unwrap_or("never"));
            for (label, count) in &detail.entity_counts {
                println!("{label}: {count}");
            }
        }
        ProjectsCommand::Delete { name, yes } => {
            if !yes {
                anyhow::bail!("refusing to delete project \"{name}\" without --yes");
            }
            manager.delete_project(&name).await?;
            println!("deleted project {name}");
        }
    }
    Ok(())
}
