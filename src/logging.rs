// Logging setup for hosts embedding the model event registry
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{EventsError, Result};

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: Level,
    /// Output format
    pub format: LogFormat,
    /// Whether to show targets (module names)
    pub show_targets: bool,
}

/// Log output format options
#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    /// Pretty output for terminals
    Pretty,
    /// JSON output for programmatic use
    Json,
    /// Compact format for structured logging
    Compact,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: LogFormat::Pretty,
            show_targets: false,
        }
    }
}

impl LogConfig {
    /// Verbose logging traces every dispatch
    pub fn verbose() -> Self {
        Self {
            level: Level::TRACE,
            ..Self::default()
        }
    }

    /// Filter directive applied to this crate's spans and events
    pub fn directive(&self) -> String {
        format!("{}={}", env!("CARGO_CRATE_NAME"), self.level)
    }
}

/// Initialize the global subscriber. Fails if one is already installed.
pub fn init_logging(config: LogConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.directive()));

    let result = match config.format {
        LogFormat::Pretty => fmt()
            .with_env_filter(env_filter)
            .with_target(config.show_targets)
            .try_init(),
        LogFormat::Json => fmt().with_env_filter(env_filter).json().try_init(),
        LogFormat::Compact => fmt()
            .with_env_filter(env_filter)
            .compact()
            .with_target(config.show_targets)
            .try_init(),
    };

    result.map_err(|e| EventsError::Logging(e.to_string()))
}

/// Logging utilities for common operations
pub mod utils {
    use tracing::{span, Level, Span};

    /// Span covering one save/delete/restore flow
    pub fn lifecycle_span(model: &str, operation: &str) -> Span {
        span!(Level::DEBUG, "model_lifecycle", model = %model, operation = %operation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_config_default() {
        let config = LogConfig::default();
        assert_eq!(config.level, Level::INFO);
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(!config.show_targets);
    }

    #[test]
    fn test_verbose_config() {
        let config = LogConfig::verbose();
        assert_eq!(config.level, Level::TRACE);
        assert_eq!(config.format, LogFormat::Pretty);
    }

    #[test]
    fn test_directive_names_crate() {
        let config = LogConfig::default();
        assert_eq!(config.directive(), "model_events=INFO");
    }
}
