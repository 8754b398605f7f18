use clap::Parser;
use codegraph_cli::cli::{Cli, Commands};
use codegraph_cli::commands;
use codegraph_cli::context::AppContext;
use codegraph_infrastructure::logging::init_tracing;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let ctx = match AppContext::load(cli.config) {
        Ok(ctx) => ctx,
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(1);
        }
    };
    let _logging_guard = init_tracing(&ctx.config.logging);
    tracing::info!(command = ?cli.command, "codegraph starting");

    if let Err(err) = dispatch(&ctx, cli.command).await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn dispatch(ctx: &AppContext, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Index { path, name, force, skip_metadata } => commands::index::run(ctx, path, name, force, skip_metadata).await,
        Commands::Watch { path, name, no_calls } => commands::watch::run(ctx, path, name, no_calls).await,
        Commands::Projects { command } => commands::projects::run(ctx, command).await,
        Commands::Query { question, project, limit, verbose } => commands::query::run(ctx, question, project, limit, verbose).await,
        Commands::Search { query, project, limit } => commands::search::run(ctx, query, project, limit).await,
        Commands::Status => commands::status::run(ctx).await,
        Commands::Settings => commands::settings::run(ctx),
        Commands::Docs { command } => commands::docs::run(ctx, command).await,
        Commands::Metadata { command } => commands::metadata::run(ctx, command).await,
    }
}
