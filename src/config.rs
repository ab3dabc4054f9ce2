// Configuration handling for the model event registry
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{ConfigError, EventsError, Result};
use crate::events::EventName;

pub const DEFAULT_CHANNEL_PREFIX: &str = "eloquent";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegistryConfig {
    /// When false no dispatcher can be installed and every firing proceeds
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_channel_prefix")]
    pub channel_prefix: String,
    #[serde(default)]
    pub default_priority: i32,
    /// Extra observable event names per model class name
    #[serde(default)]
    pub observables: HashMap<String, Vec<EventName>>,
}

fn default_enabled() -> bool {
    true
}

fn default_channel_prefix() -> String {
    DEFAULT_CHANNEL_PREFIX.to_string()
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            channel_prefix: default_channel_prefix(),
            default_priority: 0,
            observables: HashMap::new(),
        }
    }
}

impl RegistryConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(EventsError::Config(Box::new(ConfigError::NotFound {
                path: path.to_path_buf(),
            })));
        }

        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content).map_err(|e| match e {
            EventsError::Config(config_error) => match *config_error {
                ConfigError::InvalidYaml {
                    message,
                    line,
                    column,
                    ..
                } => EventsError::Config(Box::new(ConfigError::InvalidYaml {
                    message,
                    line,
                    column,
                    file_path: Some(path.to_path_buf()),
                })),
                other => EventsError::Config(Box::new(other)),
            },
            other => other,
        })
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: RegistryConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Extra observable names configured for a class
    pub fn observables_for(&self, class_name: &str) -> &[EventName] {
        self.observables
            .get(class_name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn validate(&self) -> Result<()> {
        if self.channel_prefix.trim().is_empty() {
            return Err(invalid_value(
                "channel prefix must not be empty",
                "channel_prefix",
                &self.channel_prefix,
                "non-empty string",
            ));
        }

        for (class_name, names) in &self.observables {
            if class_name.trim().is_empty() {
                return Err(invalid_value(
                    "observables entry has an empty class name",
                    "observables",
                    class_name,
                    "class name",
                ));
            }
            if let Some(name) = names.iter().find(|n| n.as_str().trim().is_empty()) {
                return Err(invalid_value(
                    &format!("empty event name configured for {class_name}"),
                    &format!("observables.{class_name}"),
                    name.as_str(),
                    "non-empty event name",
                ));
            }
        }

        Ok(())
    }
}

fn invalid_value(message: &str, field: &str, value: &str, expected: &str) -> EventsError {
    EventsError::Config(Box::new(ConfigError::InvalidValue {
        message: message.to_string(),
        field: field.to_string(),
        value: value.to_string(),
        expected: expected.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_config() {
        let config = RegistryConfig::from_yaml("{}").unwrap();
        assert!(config.enabled);
        assert_eq!(config.channel_prefix, "eloquent");
        assert_eq!(config.default_priority, 0);
        assert!(config.observables.is_empty());
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
enabled: false
channel_prefix: orm
default_priority: 5
observables:
  app::models::Post:
    - published
    - archived
"#;
        let config = RegistryConfig::from_yaml(yaml).unwrap();
        assert!(!config.enabled);
        assert_eq!(config.channel_prefix, "orm");
        assert_eq!(config.default_priority, 5);
        assert_eq!(
            config.observables_for("app::models::Post"),
            &[EventName::new("published"), EventName::new("archived")]
        );
        assert!(config.observables_for("app::models::User").is_empty());
    }

    #[test]
    fn test_parse_invalid_yaml_syntax() {
        let result = RegistryConfig::from_yaml("channel_prefix: [unclosed");
        assert!(matches!(
            result,
            Err(EventsError::Config(ref e)) if matches!(**e, ConfigError::InvalidYaml { .. })
        ));
    }

    #[test]
    fn test_validation_empty_prefix() {
        let result = RegistryConfig::from_yaml("channel_prefix: \"  \"");
        assert!(matches!(
            result,
            Err(EventsError::Config(ref e)) if matches!(**e, ConfigError::InvalidValue { ref field, .. } if field == "channel_prefix")
        ));
    }

    #[test]
    fn test_validation_empty_event_name() {
        let yaml = r#"
observables:
  Post:
    - published
    - ""
"#;
        let err = RegistryConfig::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("empty event name configured for Post"));
    }

    #[test]
    fn test_default_matches_empty_yaml() {
        let config = RegistryConfig::default();
        assert!(config.enabled);
        assert_eq!(config.channel_prefix, DEFAULT_CHANNEL_PREFIX);
    }
}
