//! Domain error taxonomy.
//!
//! Mirrors the propagation policy of the pipeline: most errors are recovered
//! locally by the caller (a stage logs and skips one file, one batch, one
//! LLM call) and only a narrow set of variants are meant to abort a run —
//! see [`Error::is_fatal`].

use thiserror::Error;

/// Result type alias for operations that can fail with a domain [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type shared across the indexing pipeline.
#[derive(Error, Debug)]
pub enum Error {
    /// The scan root does not exist or is not a directory. Fatal only at the
    /// CLI boundary.
    #[error("scan error: {message}")]
    Scan {
        /// Description of the failure.
        message: String,
    },

    /// A single file failed to parse. Recovered locally: the file is logged
    /// and skipped, the pipeline continues.
    #[error("parse error in {path}: {message}")]
    Parse {
        /// Path of the file that failed to parse.
        path: String,
        /// Description of the failure.
        message: String,
    },

    /// A graph-store operation failed. Batched writes recover by clearing
    /// the failed buffer and continuing.
    #[error("graph store error: {message}")]
    Graph {
        /// Description of the failure.
        message: String,
        /// Optional underlying error.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A vector-store operation failed.
    #[error("vector store error: {message}")]
    VectorStore {
        /// Description of the failure.
        message: String,
        /// Optional underlying error.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A relational-store (Postgres) operation failed.
    #[error("relational store error: {message}")]
    Postgres {
        /// Description of the failure.
        message: String,
        /// Optional underlying error.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An LLM provider call failed permanently (after retries). Yields an
    /// empty summary or a null drift result — never aborts the pipeline.
    #[error("LLM provider error: {message}")]
    Llm {
        /// Description of the failure.
        message: String,
    },

    /// An LLM provider call failed due to rate limiting. Retried with
    /// exponential back-off by the caller; see [`crate::constants::retry`].
    #[error("LLM rate limit: {message}")]
    RateLimit {
        /// Description of the failure.
        message: String,
    },

    /// A stage could not make progress at all (e.g. the graph store is
    /// unreachable at stage entry). Aborts the pipeline.
    #[error("indexing error: {message}")]
    Indexing {
        /// Description of the failure.
        message: String,
    },

    /// Surfaced to the caller of the query engine; does not affect
    /// indexing.
    #[error("query error: {message}")]
    Query {
        /// Description of the failure.
        message: String,
    },

    /// Surfaced to the caller of the metadata generator; does not affect
    /// indexing.
    #[error("metadata error: {message}")]
    Metadata {
        /// Description of the failure.
        message: String,
    },

    /// Configuration is missing or invalid at startup. Fatal.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the failure.
        message: String,
    },

    /// A resource was not found.
    #[error("not found: {resource}")]
    NotFound {
        /// The resource that was not found.
        resource: String,
    },

    /// An invalid argument was supplied to a domain operation.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument.
        message: String,
    },

    /// I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Construct a [`Error::Scan`].
    pub fn scan<S: Into<String>>(message: S) -> Self {
        Self::Scan {
            message: message.into(),
        }
    }

    /// Construct a [`Error::Parse`].
    pub fn parse<S: Into<String>>(path: S, message: S) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Construct a [`Error::Graph`] with no source.
    pub fn graph<S: Into<String>>(message: S) -> Self {
        Self::Graph {
            message: message.into(),
            source: None,
        }
    }

    /// Construct a [`Error::VectorStore`] with no source.
    pub fn vector_store<S: Into<String>>(message: S) -> Self {
        Self::VectorStore {
            message: message.into(),
            source: None,
        }
    }

    /// Construct a [`Error::Postgres`] with no source.
    pub fn postgres<S: Into<String>>(message: S) -> Self {
        Self::Postgres {
            message: message.into(),
            source: None,
        }
    }

    /// Construct a [`Error::Llm`].
    pub fn llm<S: Into<String>>(message: S) -> Self {
        Self::Llm {
            message: message.into(),
        }
    }

    /// Construct a [`Error::RateLimit`].
    pub fn rate_limit<S: Into<String>>(message: S) -> Self {
        Self::RateLimit {
            message: message.into(),
        }
    }

    /// Construct a [`Error::Indexing`].
    pub fn indexing<S: Into<String>>(message: S) -> Self {
        Self::Indexing {
            message: message.into(),
        }
    }

    /// Construct a [`Error::Metadata`].
    pub fn metadata<S: Into<String>>(message: S) -> Self {
        Self::Metadata {
            message: message.into(),
        }
    }

    /// Construct a [`Error::NotFound`].
    pub fn not_found<S: Into<String>>(resource: S) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Construct a [`Error::InvalidArgument`].
    pub fn invalid_argument<S: Into<String>>(message: S) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Detect a rate-limit condition from a provider error message using the
    /// substring heuristic from the pipeline's error handling design:
    /// `"rate"|"limit"|"429"|"overloaded"`.
    #[must_use]
    pub fn looks_like_rate_limit(message: &str) -> bool {
        let lower = message.to_lowercase();
        ["rate", "limit", "429", "overloaded"]
            .iter()
            .any(|needle| lower.contains(needle))
    }

    /// Whether this error promotes to a fatal, pipeline-aborting condition.
    ///
    /// Per the propagation policy, only missing configuration, an
    /// unreachable graph store at stage entry, and [`Error::Indexing`] are
    /// promoted; every other variant is recovered locally by its caller.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config { .. } | Self::Indexing { .. })
    }
}
