//! Responder configuration.
//!
//! Configuration is an explicit value handed to the [`Responder`](crate::responders::Responder)
//! at construction. [`ResponderConfig::from_env`] reads it from the process
//! environment for applications that want the conventional behaviour.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Environment variable holding the [`Environment`] name.
pub const ENVIRONMENT_VAR: &str = "RESOURCE_ENGINE_ENV";

/// Environment variable holding the HTML layout name.
pub const LAYOUT_VAR: &str = "RESOURCE_ENGINE_LAYOUT";

/// Errors raised while reading configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown environment: {0}")]
    UnknownEnvironment(String),
}

/// The deployment environment.
///
/// Only `Development` exposes error details that are otherwise replaced by
/// generic errors (authentication failures and unexpected errors).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    Development,
    Test,
    #[default]
    Production,
}

impl Environment {
    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "test" => Ok(Environment::Test),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(ConfigError::UnknownEnvironment(other.to_string())),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Environment::Development => "development",
            Environment::Test => "test",
            Environment::Production => "production",
        };
        f.write_str(name)
    }
}

/// Settings of the JSON and HTML responders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponderConfig {
    pub environment: Environment,
    /// Layout for rendered pages. `None` renders components without a layout.
    pub layout: Option<String>,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            layout: Some("page".to_string()),
        }
    }
}

impl ResponderConfig {
    pub fn new(environment: Environment) -> Self {
        Self {
            environment,
            ..Self::default()
        }
    }

    pub fn with_layout(mut self, layout: Option<String>) -> Self {
        self.layout = layout;
        self
    }

    /// Reads [`ENVIRONMENT_VAR`] and [`LAYOUT_VAR`], falling back to defaults for
    /// unset variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(environment) = lookup(ENVIRONMENT_VAR) {
            config.environment = environment.parse()?;
        }
        if let Some(layout) = lookup(LAYOUT_VAR) {
            let layout = layout.trim();
            config.layout = (!layout.is_empty()).then(|| layout.to_string());
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_to_production_with_page_layout() {
        let config = ResponderConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ResponderConfig::default());
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.layout.as_deref(), Some("page"));
    }

    #[test]
    fn test_reads_environment_and_layout() {
        let config = ResponderConfig::from_lookup(lookup(&[
            (ENVIRONMENT_VAR, "Development"),
            (LAYOUT_VAR, ""),
        ]))
        .unwrap();
        assert!(config.environment.is_development());
        assert_eq!(config.layout, None);
    }

    #[test]
    fn test_rejects_unknown_environment() {
        let result = ResponderConfig::from_lookup(lookup(&[(ENVIRONMENT_VAR, "staging")]));
        assert_eq!(result, Err(ConfigError::UnknownEnvironment("staging".into())));
    }

    #[test]
    fn test_deserializes_partial_config() {
        let config: ResponderConfig =
            serde_json::from_str(r#"{ "environment": "development" }"#).unwrap();
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.layout.as_deref(), Some("page"));
    }
}
