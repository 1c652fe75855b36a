//! Structured logging set up for binaries embedding the toolbox.
//!
//! The filter can be overridden at runtime with `RUST_LOG`; otherwise the
//! caller supplied level is used (e.g. `"info"` or
//! `"warn,chaos_toolbox::referenda=debug"`).

use serde::Deserialize;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable lines, for local runs.
    #[default]
    Human,
    /// Newline delimited JSON, for log aggregation.
    Json,
}

/// Installs the global subscriber. Fails if one is already installed.
pub fn init_logging(format: LogFormat, level: &str) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Human => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(true))
            .try_init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_initialisation_is_rejected() {
        assert!(init_logging(LogFormat::Json, "debug").is_ok());
        assert!(init_logging(LogFormat::Human, "info").is_err());
        tracing::info!(target: "chaos_toolbox::logging", "subscriber installed");
    }

    #[test]
    fn format_from_settings() {
        let format: LogFormat = serde_json::from_str("\"json\"").unwrap();
        assert_eq!(format, LogFormat::Json);
    }
}
