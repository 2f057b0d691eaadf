//! Message catalogs and placeholder rendering

use crate::config::{ConfigError, Locale};
use std::collections::HashMap;
use std::path::Path;

/// Message keys every catalog answers for
pub const MESSAGE_KEYS: [&str; 8] = [
    "required",
    "string",
    "integer",
    "float",
    "min",
    "max",
    "exists",
    "not_exists",
];

const ENGLISH: [(&str, &str); 8] = [
    ("required", "The :input field is required."),
    ("string", "The :input field must be a string."),
    ("integer", "The :input field must be an integer."),
    ("float", "The :input field must be a float."),
    ("min", "The :input field must be at least :min characters."),
    ("max", "The :input field must not be greater than :max characters."),
    ("exists", "The :input field already exists in the table."),
    ("not_exists", "The :input field does not exist in the table."),
];

const PORTUGUESE: [(&str, &str); 8] = [
    ("required", "O campo :input é obrigatório."),
    ("string", "O campo :input deve ser do tipo string."),
    ("integer", "O campo :input deve ser do tipo integer."),
    ("float", "O campo :input deve ser do tipo float."),
    ("min", "O campo :input deve conter pelo menos :min caracteres."),
    ("max", "O campo :input não deve conter mais de :max caracteres."),
    ("exists", "O campo :input já existe na tabela."),
    ("not_exists", "O campo :input não existe na tabela."),
];

/// Render a template for a failed rule.
///
/// `:input` becomes the field name; `:min` and `:max` both become the rule's
/// first parameter (or nothing when it has none).
pub fn render(template: &str, field: &str, params: &[String]) -> String {
    let bound = params.first().map(String::as_str).unwrap_or("");

    template
        .replace(":input", field)
        .replace(":min", bound)
        .replace(":max", bound)
}

/// Immutable mapping from message key to template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageCatalog {
    templates: HashMap<String, String>,
}

impl MessageCatalog {
    /// English catalog
    pub fn english() -> Self {
        Self::from_pairs(&ENGLISH)
    }

    /// Brazilian Portuguese catalog
    pub fn pt_br() -> Self {
        Self::from_pairs(&PORTUGUESE)
    }

    /// Built-in catalog for a locale
    pub fn for_locale(locale: Locale) -> Self {
        match locale {
            Locale::En => Self::english(),
            Locale::PtBr => Self::pt_br(),
        }
    }

    fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self {
            templates: pairs
                .iter()
                .map(|(key, template)| (key.to_string(), template.to_string()))
                .collect(),
        }
    }

    /// Replace the template for one key
    pub fn with_template(
        mut self,
        key: &str,
        template: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        if !MESSAGE_KEYS.contains(&key) {
            return Err(ConfigError::UnknownMessageKey(key.to_string()));
        }
        self.templates.insert(key.to_string(), template.into());
        Ok(self)
    }

    /// Load overrides from YAML (`key: template`) on top of `base`
    pub fn from_yaml_str_over(base: Self, yaml: &str) -> Result<Self, ConfigError> {
        let overrides: HashMap<String, String> = serde_yaml::from_str(yaml)?;

        overrides
            .into_iter()
            .try_fold(base, |catalog, (key, template)| {
                catalog.with_template(&key, template)
            })
    }

    /// Load overrides from YAML on top of the English catalog
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Self::from_yaml_str_over(Self::english(), yaml)
    }

    /// Load overrides from a YAML file on top of the English catalog
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Template for a key
    pub fn template(&self, key: &str) -> Option<&str> {
        self.templates.get(key).map(String::as_str)
    }

    /// Render the message for a failed rule. A missing template renders as the key.
    pub fn render(&self, key: &str, field: &str, params: &[String]) -> String {
        render(self.template(key).unwrap_or(key), field, params)
    }
}

impl Default for MessageCatalog {
    fn default() -> Self {
        Self::english()
    }
}
