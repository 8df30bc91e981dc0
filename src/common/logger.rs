use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins when set; otherwise the filter is built from the
/// `[logging]` config section (level plus optional per-target filters).
pub fn init(config: Option<&LoggingConfig>) {
    let log_level = config.and_then(|l| l.level.as_deref()).unwrap_or("info");
    let filters = config.and_then(|l| l.filters.as_deref()).unwrap_or("");

    let filter_str = if filters.is_empty() {
        log_level.to_string()
    } else {
        format!("{log_level},{filters}")
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_str));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}
