//! Type-safe, layered configuration (§A.4).
//!
//! Loaded with `figment`: a `codegraph.toml` (or an explicit `--config`
//! path) layered under environment variables prefixed `CODEGRAPH_`, with
//! `__` as the nesting separator (e.g. `CODEGRAPH_INDEXING__MAX_WORKERS`
//! overrides `indexing.max_workers`). Defaults for every key are the same
//! constants `codegraph_domain::constants` hands to the pipeline directly,
//! so the config layer and the domain layer never disagree.
//!
//! Secrets (`OPENAI_API_KEY`, `ANTHROPIC_API_KEY`, `GOOGLE_API_KEY`,
//! `POSTGRES_PASSWORD`, `MEMGRAPH_*`, `QDRANT_*`) are read directly from the
//! process environment by [`Secrets::from_env`], never from the TOML file —
//! a provider whose secret is missing at startup raises `Error::Config`.

use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use codegraph_domain::constants::{caching, indexing};
use codegraph_domain::{Error, Result};

/// `indexing.*` configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexingConfig {
    pub max_workers: usize,
    pub max_concurrent_requests: usize,
    pub chunk_max_tokens: usize,
    pub chunk_overlap_tokens: usize,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            max_workers: num_cpus::get().max(1),
            max_concurrent_requests: indexing::DEFAULT_MAX_CONCURRENT_REQUESTS,
            chunk_max_tokens: indexing::DEFAULT_CHUNK_MAX_TOKENS,
            chunk_overlap_tokens: indexing::DEFAULT_CHUNK_OVERLAP_TOKENS,
        }
    }
}

/// `caching.*` configuration (AST cache, §4.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachingConfig {
    pub max_entries: usize,
    pub max_memory_mb: usize,
    pub eviction_fraction: usize,
    pub memory_pressure_threshold: f64,
}

impl Default for CachingConfig {
    fn default() -> Self {
        Self {
            max_entries: caching::DEFAULT_MAX_ENTRIES,
            max_memory_mb: caching::DEFAULT_MAX_MEMORY_MB,
            eviction_fraction: caching::DEFAULT_EVICTION_FRACTION_PCT,
            memory_pressure_threshold: caching::DEFAULT_MEMORY_PRESSURE_THRESHOLD,
        }
    }
}

/// `watcher.*` configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Debounce delay in seconds (default `0.5`).
    pub debounce_delay_secs: f64,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self { debounce_delay_secs: codegraph_domain::constants::watcher::default_debounce_delay().as_secs_f64() }
    }
}

/// `ranking.*`, `query.*`, `summarization.*`, `documents.*`, and `drift.*`
/// groups: consumed by the query engine and document pipeline, whose
/// tunables are free-form key/value pairs rather than a fixed schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComponentTuning {
    #[serde(default)]
    pub ranking: std::collections::BTreeMap<String, toml::Value>,
    #[serde(default)]
    pub query: std::collections::BTreeMap<String, toml::Value>,
    #[serde(default)]
    pub summarization: std::collections::BTreeMap<String, toml::Value>,
    #[serde(default)]
    pub documents: std::collections::BTreeMap<String, toml::Value>,
    #[serde(default)]
    pub drift: std::collections::BTreeMap<String, toml::Value>,
}

/// Connection settings for the three backing stores. Endpoints are
/// ordinary config; credentials live in [`Secrets`] instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoresConfig {
    /// Bolt URI for the graph store (Memgraph/Neo4j), e.g. `bolt://localhost:7687`.
    pub graph_uri: String,
    /// Qdrant gRPC/HTTP endpoint.
    pub vector_uri: String,
    /// Postgres connection string, minus password (supplied via `POSTGRES_PASSWORD`).
    pub postgres_uri: String,
}

impl Default for StoresConfig {
    fn default() -> Self {
        Self {
            graph_uri: "bolt://localhost:7687".to_owned(),
            vector_uri: "http://localhost:6334".to_owned(),
            postgres_uri: "postgres://codegraph@localhost:5432/codegraph".to_owned(),
        }
    }
}

/// Which named provider (per §A.5's `linkme` registries) backs each port,
/// plus the model names to request from the LLM and embedding backends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    pub graph_store: String,
    pub vector_store: String,
    pub relational_store: String,
    pub llm: String,
    pub llm_model: Option<String>,
    pub llm_base_url: Option<String>,
    pub embedding: String,
    pub embedding_model: Option<String>,
    pub embedding_base_url: Option<String>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            graph_store: "neo4j".to_owned(),
            vector_store: "qdrant".to_owned(),
            relational_store: "postgres".to_owned(),
            llm: "openai".to_owned(),
            llm_model: None,
            llm_base_url: None,
            embedding: "openai".to_owned(),
            embedding_model: None,
            embedding_base_url: None,
        }
    }
}

/// Logging configuration, consumed by [`crate::logging::init_tracing`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Emit JSON-formatted log lines instead of the human-readable default.
    pub json: bool,
    /// Directory to write a rolling, non-blocking log file to. `None`
    /// disables file logging (stderr only).
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { json: false, log_dir: None }
    }
}

/// The complete, validated application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub indexing: IndexingConfig,
    #[serde(default)]
    pub caching: CachingConfig,
    #[serde(default)]
    pub watcher: WatcherConfig,
    #[serde(default)]
    pub tuning: ComponentTuning,
    #[serde(default)]
    pub stores: StoresConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Secrets read directly from the process environment (§A.4): never from
/// the TOML file, never logged, never part of [`AppConfig`]'s `Debug`
/// output by virtue of living in a separate type entirely.
#[derive(Clone, Default)]
pub struct Secrets {
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub google_api_key: Option<String>,
    pub postgres_password: Option<String>,
    pub memgraph_user: Option<String>,
    pub memgraph_password: Option<String>,
    pub qdrant_api_key: Option<String>,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets").finish_non_exhaustive()
    }
}

impl Secrets {
    /// Read every recognized secret from the environment. Missing secrets
    /// are left as `None`; whether that's fatal depends on which provider
    /// the configuration selects, checked by [`Secrets::require`].
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            openai_api_key: std::env::var("OPENAI_API_KEY").ok(),
            anthropic_api_key: std::env::var("ANTHROPIC_API_KEY").ok(),
            google_api_key: std::env::var("GOOGLE_API_KEY").ok(),
            postgres_password: std::env::var("POSTGRES_PASSWORD").ok(),
            memgraph_user: std::env::var("MEMGRAPH_USER").ok(),
            memgraph_password: std::env::var("MEMGRAPH_PASSWORD").ok(),
            qdrant_api_key: std::env::var("QDRANT_API_KEY").ok(),
        }
    }

    /// Fetch a named secret, promoting its absence to a fatal
    /// [`Error::Config`] (§7's "missing configuration secrets on pipeline
    /// startup" case).
    pub fn require(value: &Option<String>, name: &str) -> Result<String> {
        value.clone().ok_or_else(|| Error::Config { message: format!("missing required secret: {name}") })
    }
}

/// Loads [`AppConfig`] by layering a TOML file under `CODEGRAPH_`-prefixed
/// environment variables, following the same "env overrides file" order
/// every `marlonsc-mcb` config consumer expects.
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Use an explicit config file path instead of the default
    /// `codegraph.toml` in the current directory.
    #[must_use]
    pub fn with_config_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Load and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the TOML file exists but fails to
    /// parse, or if the merged configuration fails validation.
    pub fn load(&self) -> Result<AppConfig> {
        let toml_path = self.config_path.clone().unwrap_or_else(|| PathBuf::from("codegraph.toml"));

        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));
        if toml_path.exists() {
            figment = figment.merge(Toml::file(&toml_path));
        }
        figment = figment.merge(Env::prefixed("CODEGRAPH_").split("__"));

        let config: AppConfig = figment.extract().map_err(|err| Error::Config { message: format!("failed to load configuration: {err}") })?;
        Self::validate(&config)?;
        Ok(config)
    }

    fn validate(config: &AppConfig) -> Result<()> {
        if config.indexing.max_workers == 0 {
            return Err(Error::Config { message: "indexing.max_workers cannot be 0".to_owned() });
        }
        if config.caching.max_entries == 0 {
            return Err(Error::Config { message: "caching.max_entries cannot be 0".to_owned() });
        }
        if config.watcher.debounce_delay_secs < 0.0 {
            return Err(Error::Config { message: "watcher.debounce_delay_secs cannot be negative".to_owned() });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn defaults_load_without_a_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigLoader::new().with_config_path(dir.path().join("missing.toml")).load().expect("defaults are valid");
        assert_eq!(config.indexing.chunk_max_tokens, 1000);
        assert_eq!(config.caching.max_entries, 1000);
    }

    #[test]
    #[serial]
    fn env_var_overrides_default() {
        // SAFETY: test runs serially; no other thread reads this process's env concurrently.
        #[allow(unsafe_code)]
        unsafe {
            std::env::set_var("CODEGRAPH_INDEXING__MAX_CONCURRENT_REQUESTS", "9");
        }
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigLoader::new().with_config_path(dir.path().join("missing.toml")).load().expect("config loads");
        assert_eq!(config.indexing.max_concurrent_requests, 9);
        #[allow(unsafe_code)]
        unsafe {
            std::env::remove_var("CODEGRAPH_INDEXING__MAX_CONCURRENT_REQUESTS");
        }
    }

    #[test]
    fn toml_file_overrides_default_and_env_overrides_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("codegraph.toml");
        std::fs::write(&path, "[indexing]\nmax_workers = 3\n").unwrap();
        let config = ConfigLoader::new().with_config_path(&path).load().expect("config loads");
        assert_eq!(config.indexing.max_workers, 3);
    }

    #[test]
    fn require_reports_missing_secret_by_name() {
        let err = Secrets::require(&None, "OPENAI_API_KEY").unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn zero_max_workers_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("codegraph.toml");
        std::fs::write(&path, "[indexing]\nmax_workers = 0\n").unwrap();
        let result = ConfigLoader::new().with_config_path(&path).load();
        assert!(result.is_err());
    }
}
