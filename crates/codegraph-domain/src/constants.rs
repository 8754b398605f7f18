//! Domain-level constants: configuration defaults enumerated in the
//! external-interfaces contract, and the retry back-off formula shared by
//! every LLM/embedding client.

/// Default `indexing.*` configuration values.
pub mod indexing {
    /// `indexing.max_concurrent_requests` default.
    pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 5;
    /// `indexing.chunk_max_tokens` default.
    pub const DEFAULT_CHUNK_MAX_TOKENS: usize = 1000;
    /// `indexing.chunk_overlap_tokens` default.
    pub const DEFAULT_CHUNK_OVERLAP_TOKENS: usize = 100;
}

/// Default `caching.*` configuration values (AST cache, §4.2).
pub mod caching {
    /// `caching.max_entries` default.
    pub const DEFAULT_MAX_ENTRIES: usize = 1000;
    /// `caching.max_memory_mb` default.
    pub const DEFAULT_MAX_MEMORY_MB: usize = 500;
    /// `caching.eviction_fraction` default, as a percentage.
    pub const DEFAULT_EVICTION_FRACTION_PCT: usize = 10;
    /// `caching.memory_pressure_threshold` default.
    pub const DEFAULT_MEMORY_PRESSURE_THRESHOLD: f64 = 0.8;
}

/// Default `watcher.*` configuration values.
pub mod watcher {
    use std::time::Duration;

    /// `watcher.debounce_delay` default.
    #[must_use]
    pub fn default_debounce_delay() -> Duration {
        Duration::from_millis(500)
    }
}

/// Retry / back-off policy shared by LLM, embedding, graph, and vector
/// clients.
pub mod retry {
    use std::time::Duration;

    /// Default maximum retry attempts for a rate-limited call.
    pub const DEFAULT_MAX_RETRIES: u32 = 5;

    /// Back-off delay before retry attempt `attempt` (0-based):
    /// `(2^attempt) * 2 + 5` seconds, per §5.
    #[must_use]
    pub fn backoff_delay(attempt: u32) -> Duration {
        let seconds = 2f64.powi(attempt as i32).mul_add(2.0, 5.0);
        Duration::from_secs_f64(seconds)
    }
}

/// Extensions recognized by the scanner, grouped by language (§6).
pub mod languages {
    use crate::value_objects::Language;

    /// All languages the scanner recognizes, in a stable order.
    pub const ALL: [Language; 9] = [
        Language::Python,
        Language::JavaScript,
        Language::Jsx,
        Language::TypeScript,
        Language::Tsx,
        Language::Rust,
        Language::Java,
        Language::Go,
        Language::Cpp,
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_delay_matches_formula() {
        assert_eq!(retry::backoff_delay(0), std::time::Duration::from_secs(7));
        assert_eq!(retry::backoff_delay(1), std::time::Duration::from_secs(9));
        assert_eq!(retry::backoff_delay(2), std::time::Duration::from_secs(13));
    }
}
