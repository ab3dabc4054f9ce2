// Error handling for the model event layer
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EventsError>;

/// Main error type. Registry and dispatch operations never fail; errors only
/// surface from configuration loading and the lifecycle driver.
#[derive(Debug, Error)]
pub enum EventsError {
    #[error("Configuration error: {0}")]
    Config(#[from] Box<ConfigError>),

    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Logging initialisation failed: {0}")]
    Logging(String),

    #[error("Persisting {model} failed during {event}: {message}")]
    Persistence {
        model: String,
        event: String,
        message: String,
    },
}

/// Configuration-related errors with detailed context
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid YAML syntax: {message}")]
    InvalidYaml {
        message: String,
        line: Option<u32>,
        column: Option<u32>,
        file_path: Option<PathBuf>,
    },

    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Invalid configuration value: {message}")]
    InvalidValue {
        message: String,
        field: String,
        value: String,
        expected: String,
    },
}

impl EventsError {
    /// Build a persistence error for the given model type and lifecycle event.
    pub fn persistence(
        model: impl Into<String>,
        event: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        EventsError::Persistence {
            model: model.into(),
            event: event.into(),
            message: message.into(),
        }
    }

    /// Whether the error came from configuration loading or validation
    pub fn is_config(&self) -> bool {
        matches!(self, EventsError::Config(_))
    }
}

// Conversion from serde_yaml::Error to ConfigError
impl From<serde_yaml::Error> for Box<ConfigError> {
    fn from(error: serde_yaml::Error) -> Self {
        let location = error.location();
        Box::new(ConfigError::InvalidYaml {
            message: error.to_string(),
            line: location.as_ref().map(|l| l.line() as u32),
            column: location.as_ref().map(|l| l.column() as u32),
            file_path: None,
        })
    }
}

impl From<serde_yaml::Error> for EventsError {
    fn from(error: serde_yaml::Error) -> Self {
        EventsError::Config(Box::<ConfigError>::from(error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = EventsError::Config(Box::new(ConfigError::InvalidValue {
            message: "channel prefix must not be empty".to_string(),
            field: "channel_prefix".to_string(),
            value: String::new(),
            expected: "non-empty string".to_string(),
        }));
        assert_eq!(
            error.to_string(),
            "Configuration error: Invalid configuration value: channel prefix must not be empty"
        );
        assert!(error.is_config());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error = EventsError::from(io_error);
        assert!(error.to_string().contains("IO operation failed"));
        assert!(!error.is_config());
    }

    #[test]
    fn test_persistence_error_display() {
        let error = EventsError::persistence("app::User", "saving", "unique constraint");
        assert_eq!(
            error.to_string(),
            "Persisting app::User failed during saving: unique constraint"
        );
    }

    #[test]
    fn test_yaml_error_conversion_keeps_location() {
        let yaml_error = serde_yaml::from_str::<Vec<String>>("- a\n- [b").unwrap_err();
        let error = EventsError::from(yaml_error);
        match error {
            EventsError::Config(config_error) => {
                assert!(matches!(*config_error, ConfigError::InvalidYaml { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
