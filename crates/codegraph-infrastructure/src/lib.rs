//! Configuration loading, logging initialization, and the concrete adapters
//! implementing [`codegraph_domain::ports`] against a real graph store,
//! vector store, relational store, and HTTP-based LLM/embedding backends.
//!
//! This crate is the only place in the workspace that depends on neo4rs,
//! qdrant-client, sqlx, and reqwest directly — `codegraph-application`
//! reaches these concerns only through the domain ports.

pub mod adapters;
pub mod config;
pub mod logging;

pub use config::{AppConfig, CachingConfig, ConfigLoader, IndexingConfig, ProvidersConfig, Secrets, StoresConfig};
pub use logging::init_tracing;
