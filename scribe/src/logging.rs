//! Subscriber setup for `tracing` output

use tracing::Subscriber;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    EnvFilter,
};

use crate::config::LogConfig;
use crate::error::ConfigError;

/// `RUST_LOG` wins over the configured level
fn build_filter(level: &str) -> Result<EnvFilter, ConfigError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(level).map_err(|e| ConfigError::InvalidValue {
            key: "log.level",
            reason: e.to_string(),
        }),
    }
}

/// Install the global tracing subscriber
pub fn setup_logging(config: &LogConfig) -> Result<(), ConfigError> {
    let builder = fmt::Subscriber::builder()
        .with_env_filter(build_filter(&config.level)?)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .with_span_events(FmtSpan::NONE)
        .with_ansi(!config.json);

    let subscriber: Box<dyn Subscriber + Send + Sync> = if config.json {
        Box::new(builder.json().flatten_event(true).finish())
    } else {
        Box::new(builder.compact().finish())
    };

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| ConfigError::Logging(e.to_string()))
}
