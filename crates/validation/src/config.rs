//! Validator configuration

use crate::messages::MessageCatalog;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Environment variable toggling strict rule resolution
pub const STRICT_ENV: &str = "EXPERT_VALIDATION_STRICT";
/// Environment variable selecting the built-in message catalog
pub const LOCALE_ENV: &str = "EXPERT_VALIDATION_LOCALE";

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Unknown message key '{0}'")]
    UnknownMessageKey(String),

    #[error("Invalid value for {field}: '{value}', expected {expected}")]
    InvalidValue {
        field: String,
        value: String,
        expected: String,
    },
}

/// Locale of the built-in message catalog
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    #[serde(rename = "en")]
    En,
    #[serde(rename = "pt-br")]
    PtBr,
}

impl FromStr for Locale {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "en" | "english" => Ok(Locale::En),
            "pt-br" | "pt_br" | "ptbr" => Ok(Locale::PtBr),
            _ => Err(ConfigError::InvalidValue {
                field: "locale".to_string(),
                value: s.to_string(),
                expected: "en or pt-br".to_string(),
            }),
        }
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let locale = match self {
            Locale::En => "en",
            Locale::PtBr => "pt-br",
        };
        write!(f, "{}", locale)
    }
}

/// Runtime options for a [`Validator`](crate::Validator)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Reject unknown rule names instead of skipping them
    pub strict_rules: bool,
    /// Built-in catalog used when no catalog is supplied explicitly
    pub locale: Locale,
}

impl ValidatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration that rejects unknown rule names
    pub fn strict() -> Self {
        Self {
            strict_rules: true,
            ..Self::default()
        }
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup(STRICT_ENV) {
            config.strict_rules = parse_bool(STRICT_ENV, &value)?;
        }
        if let Some(value) = lookup(LOCALE_ENV) {
            config.locale = value.parse()?;
        }

        Ok(config)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Built-in catalog for the configured locale
    pub fn catalog(&self) -> MessageCatalog {
        MessageCatalog::for_locale(self.locale)
    }
}

fn parse_bool(field: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            expected: "true or false".to_string(),
        }),
    }
}
