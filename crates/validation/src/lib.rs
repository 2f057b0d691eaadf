//! # expert-validation
//!
//! Rule-string driven field validation. Each field gets a pipe-delimited
//! spec such as `"required|string|min:3|exists:users,email"`; the validator
//! runs the rules left to right and collects rendered messages per field.
//!
//! Existence rules delegate to an injected [`ExistenceChecker`], so the
//! engine itself never talks to a data store.

pub mod config;
pub mod error;
pub mod existence;
pub mod identifier;
pub mod messages;
pub mod parser;
pub mod rules;
pub mod validator;

// Re-exports for easy access
pub use config::{ConfigError, Locale, ValidatorConfig};
pub use error::{ValidationError, ValidationErrors, ValidatorError};
pub use existence::{DependencyError, ExistenceChecker, InMemoryExistenceChecker, NoDatabase};
pub use identifier::{validate_identifier, IdentifierError};
pub use messages::{render, MessageCatalog, MESSAGE_KEYS};
pub use parser::{parse_rule, parse_rules, RuleInvocation};
pub use rules::{ParameterError, Rule, RuleKind, RuleOutcome};
pub use validator::{RuleSpec, ValidationInput, Validator};
