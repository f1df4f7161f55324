//! Structured logging setup

use tracing_subscriber::EnvFilter;

use crate::{config::Config, error::Result};

/// Initialize the global JSON subscriber
///
/// The filter comes from `service.log_level`; an invalid directive falls back
/// to `info`. Calling this twice is harmless: the second install fails and is
/// reported at debug level.
pub fn init_tracing(config: &Config) -> Result<()> {
    let log_level = config.service.log_level.clone();

    let installed = tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::try_new(&log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init();

    if let Err(e) = installed {
        tracing::debug!("Tracing subscriber already installed: {}", e);
    }

    tracing::info!("Tracing initialized for service: {}", config.service.name);

    Ok(())
}

/// Root span every request log line is parented to
///
/// The dispatcher receives this span at construction instead of reaching for
/// a global logger.
pub fn service_span(config: &Config) -> tracing::Span {
    tracing::info_span!(
        "service",
        name = %config.service.name,
        environment = %config.service.environment
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_twice_does_not_fail() {
        let config = Config::default();
        assert!(init_tracing(&config).is_ok());
        assert!(init_tracing(&config).is_ok());
    }
}
