use codegraph_application::{MetadataGenerator, ProjectManager};
use codegraph_domain::entities::Project;
use codegraph_domain::ports::RelationalStore;
use serde_json::json;

use crate::cli::MetadataCommand;
use crate::context::AppContext;

pub async fn run(ctx: &AppContext, command: MetadataCommand) -> anyhow::Result<()> {
    match command {
        MetadataCommand::Show { name, json: as_json } => {
            let Some(metadata) = ctx.relational.latest_project_metadata(&name).await? else {
                anyhow::bail!("no summary generated yet for project \"{name}\"; run `metadata regenerate {name}` first");
            };
            if as_json {
                println!(
                    "{}",
                    json!({
                        "project_name": metadata.project_name,
                        "summary": metadata.summary,
                        "triggered_by": metadata.triggered_by,
                        "generated_at": metadata.generated_at.to_rfc3339(),
                    })
                );
            } else {
                println!("{}", metadata.summary);
            }
        }
        MetadataCommand::Regenerate { name } => {
            let manager = ProjectManager::new(ctx.graph.clone(), ctx.vector.clone(), ctx.relational.clone());
            let Some(detail) = manager.get_project(&name).await? else {
                anyhow::bail!("no such project: {name}");
            };

            let file_count = detail.entity_counts.get("File").copied().unwrap_or(0);
            let top_level_names = top_level_entity_names(ctx, &name).await?;
            let project = detail_to_project(detail);

            let generator = MetadataGenerator::new(ctx.llm.clone(), ctx.relational.clone());
            let metadata = generator.regenerate(&project, file_count, &top_level_names, "manual").await?;
            println!("{}", metadata.summary);
        }
    }
    Ok(())
}

async fn top_level_entity_names(ctx: &AppContext, project_name: &str) -> anyhow::Result<Vec<String>> {
    let rows = ctx
        .graph
        .execute(
            "MATCH (n) WHERE n.project_name = $name AND (n:Class OR n:Function) RETURN n.name AS name LIMIT 50",
            json!({ "name": project_name }),
        )
        .await?;
    Ok(rows.iter().filter_map(|row| row.get_str("name").map(str::to_owned)).collect())
}

fn detail_to_project(detail: codegraph_application::ProjectDetail) -> Project {
    let mut project = Project::new(detail.name, std::path::PathBuf::from(detail.root_path));
    project.last_indexed_at = detail.last_indexed_at.and_then(|raw| chrono::DateTime::parse_from_rfc3339(&raw).ok()).map(|dt| dt.with_timezone(&chrono::Utc));
    project.entity_counts = detail.entity_counts;
    project
}
