//! Structured logging with tracing

use tracing_subscriber::{EnvFilter, fmt};

use crate::config::LoggingConfig;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level when it is set. Fails if a global
/// subscriber has already been installed.
pub fn init_tracing(
    config: &LoggingConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))?;

    match config.format.as_str() {
        "pretty" => fmt().with_env_filter(filter).pretty().try_init()?,
        _ => fmt()
            .with_env_filter(filter)
            .json()
            .with_current_span(false)
            .try_init()?,
    }

    Ok(())
}
