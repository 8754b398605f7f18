//! `tracing` initialization (§A.3): an `EnvFilter` driven by `RUST_LOG`
//! (default `info`), an optional JSON formatter, and an optional
//! non-blocking rolling file sink layered alongside stderr.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;

/// Guard returned by [`init_tracing`]. Dropping it flushes the file
/// appender's background worker; callers must keep it alive for the
/// process lifetime (typically bound to a `let _guard = ...;` in `main`).
pub struct LoggingGuard {
    _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
}

/// Initialize the global `tracing` subscriber from `config`.
///
/// # Panics
///
/// Panics if called more than once per process, matching
/// `tracing_subscriber`'s own global-subscriber contract.
pub fn init_tracing(config: &LoggingConfig) -> LoggingGuard {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_layer = if config.json {
        fmt::layer().with_writer(std::io::stderr).with_target(false).json().boxed()
    } else {
        fmt::layer().with_writer(std::io::stderr).with_target(false).boxed()
    };

    let (file_layer, file_guard) = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "codegraph.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(non_blocking).with_ansi(false).json().boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry().with(env_filter).with(stderr_layer).with(file_layer).init();

    LoggingGuard { _file_guard: file_guard }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_logging_config_disables_file_sink() {
        let config = LoggingConfig::default();
        assert!(config.log_dir.is_none());
        assert!(!config.json);
    }
}
