//! Tracing Setup

use std::io::{self, IsTerminal};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{TelemetryConfig, TelemetryError};

/// Filter from `RUST_LOG` when set, otherwise from the configured level.
fn build_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.log_level)
            .map_err(|e| TelemetryError::InvalidFilter(format!("{}: {}", config.log_level, e))),
    }
}

/// Initialize the global tracing subscriber.
///
/// Logs always go to stderr so commands that print JSON on stdout stay
/// pipeable.
pub fn init_tracing(service_name: &str, config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = build_filter(config)?;

    let json_layer = config.json_logs.then(|| {
        fmt::layer().json().with_writer(io::stderr)
    });
    let text_layer = (!config.json_logs).then(|| {
        fmt::layer()
            .with_writer(io::stderr)
            .with_ansi(io::stderr().is_terminal())
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .try_init()
        .map_err(|e| TelemetryError::TracingInit(e.to_string()))?;

    tracing::debug!(
        service = service_name,
        log_level = %config.log_level,
        json_logs = config.json_logs,
        "Tracing initialized"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_level_is_rejected() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let config = TelemetryConfig::default().with_log_level("info,[[[");
        assert!(matches!(build_filter(&config), Err(TelemetryError::InvalidFilter(_))));
    }

    #[test]
    fn test_directive_level_is_accepted() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let config = TelemetryConfig::default().with_log_level("storeman_timeline=debug,info");
        assert!(build_filter(&config).is_ok());
    }
}
