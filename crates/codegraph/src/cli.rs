//! Argument parsing (§6's CLI surface), in `clap`'s derive style.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "codegraph", version, about = "Index a codebase into a hybrid graph/vector store and query it")]
pub struct Cli {
    /// Path to a TOML config file, overriding `codegraph.toml` in the current directory.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Index a codebase into the graph, vector, and relational stores.
    Index {
        path: PathBuf,
        #[arg(long, short = 'n')]
        name: Option<String>,
        #[arg(long, short = 'f')]
        force: bool,
        #[arg(long)]
        skip_metadata: bool,
    },
    /// Watch a previously indexed codebase and apply incremental updates.
    Watch {
        path: PathBuf,
        #[arg(long, short = 'n')]
        name: Option<String>,
        #[arg(long)]
        no_calls: bool,
    },
    /// Manage indexed projects.
    Projects {
        #[command(subcommand)]
        command: ProjectsCommand,
    },
    /// Ask a natural-language question, answered from indexed code.
    Query {
        question: String,
        #[arg(long, short = 'p')]
        project: Option<String>,
        #[arg(long, short = 'l', default_value_t = 15)]
        limit: usize,
        #[arg(long, short = 'v')]
        verbose: bool,
    },
    /// Run a raw similarity search over indexed code chunks.
    Search {
        query: String,
        #[arg(long, short = 'p')]
        project: Option<String>,
        #[arg(long, short = 'l', default_value_t = 15)]
        limit: usize,
    },
    /// Report store connectivity and per-project entity counts.
    Status,
    /// Print the effective configuration (secrets redacted).
    Settings,
    /// Manage project documentation (markdown indexing, drift, links).
    Docs {
        #[command(subcommand)]
        command: DocsCommand,
    },
    /// Generate or inspect a project's LLM-authored summary.
    Metadata {
        #[command(subcommand)]
        command: MetadataCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum ProjectsCommand {
    /// List every indexed project.
    List,
    /// Show one project's detail, including per-label entity counts.
    Show { name: String },
    /// Delete a project and every row/point/node it owns.
    Delete {
        name: String,
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum DocsCommand {
    /// Scan and index a project's markdown documentation.
    Index {
        path: PathBuf,
        #[arg(long, short = 'p')]
        project: String,
        #[arg(long, short = 't', default_value = "markdown")]
        doc_type: String,
        #[arg(long, short = 'f')]
        force: bool,
    },
    /// Re-run drift analysis for a document or entity.
    Drift {
        #[arg(long, short = 'p')]
        project: String,
        #[arg(long, short = 'd')]
        document: Option<String>,
        #[arg(long, short = 'e')]
        entity: Option<String>,
    },
    /// List indexed documents for a project.
    List {
        #[arg(long, short = 'p')]
        project: String,
        #[arg(long)]
        drifted: bool,
        #[arg(long)]
        json: bool,
    },
    /// List the code links established for a document or entity.
    Links {
        #[arg(long, short = 'd')]
        document: Option<String>,
        #[arg(long, short = 'e')]
        entity: Option<String>,
        #[arg(long, short = 'p')]
        project: Option<String>,
    },
    /// Show one document's content, optionally its chunk boundaries.
    Show {
        path: String,
        #[arg(long, short = 'p')]
        project: String,
        #[arg(long)]
        chunks: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum MetadataCommand {
    /// Show a project's current summary.
    Show {
        name: String,
        #[arg(long)]
        json: bool,
    },
    /// Regenerate a project's summary.
    Regenerate { name: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_parses_path_and_flags() {
        let cli = Cli::try_parse_from(["codegraph", "index", "/repo", "--name", "demo", "--force"]).expect("parses");
        match cli.command {
            Commands::Index { path, name, force, skip_metadata } => {
                assert_eq!(path, PathBuf::from("/repo"));
                assert_eq!(name.as_deref(), Some("demo"));
                assert!(force);
                assert!(!skip_metadata);
            }
            other => panic!("expected Index, got {other:?}"),
        }
    }

    #[test]
    fn query_defaults_limit_to_fifteen() {
        let cli = Cli::try_parse_from(["codegraph", "query", "how does auth work?"]).expect("parses");
        match cli.command {
            Commands::Query { limit, verbose, .. } => {
                assert_eq!(limit, 15);
                assert!(!verbose);
            }
            other => panic!("expected Query, got {other:?}"),
        }
    }

    #[test]
    fn projects_delete_without_yes_still_parses() {
        let cli = Cli::try_parse_from(["codegraph", "projects", "delete", "demo"]).expect("parses");
        match cli.command {
            Commands::Projects { command: ProjectsCommand::Delete { name, yes } } => {
                assert_eq!(name, "demo");
                assert!(!yes);
            }
            other => panic!("expected Projects::Delete, got {other:?}"),
        }
    }

    #[test]
    fn unknown_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["codegraph", "bogus"]).is_err());
    }
}
