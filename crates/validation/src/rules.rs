//! Rule registry and evaluators
//!
//! Rule names resolve to a closed set of [`RuleKind`]s. Resolving an
//! invocation also checks its parameters, producing a [`Rule`] that can be
//! evaluated against a field of the input.

use crate::existence::{DependencyError, ExistenceChecker};
use crate::identifier::{validate_identifier, IdentifierError};
use crate::parser::RuleInvocation;
use crate::validator::ValidationInput;
use serde_json::{Number, Value};
use std::fmt;
use thiserror::Error;

/// Every rule name the registry knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    Required,
    Nullable,
    String,
    Integer,
    Float,
    Min,
    Max,
    Exists,
    NotExists,
}

impl RuleKind {
    pub const ALL: [RuleKind; 9] = [
        RuleKind::Required,
        RuleKind::Nullable,
        RuleKind::String,
        RuleKind::Integer,
        RuleKind::Float,
        RuleKind::Min,
        RuleKind::Max,
        RuleKind::Exists,
        RuleKind::NotExists,
    ];

    /// Name used in rule specs; failing rules also use it as their message key
    pub fn name(&self) -> &'static str {
        match self {
            RuleKind::Required => "required",
            RuleKind::Nullable => "nullable",
            RuleKind::String => "string",
            RuleKind::Integer => "integer",
            RuleKind::Float => "float",
            RuleKind::Min => "min",
            RuleKind::Max => "max",
            RuleKind::Exists => "exists",
            RuleKind::NotExists => "not_exists",
        }
    }

    /// Look up a rule by its spec name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of evaluating one rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOutcome {
    /// Short-circuit signal; `true` stops the field's remaining rules
    Nullable(bool),
    Checked {
        error: bool,
        message_key: &'static str,
    },
}

impl RuleOutcome {
    fn checked(kind: RuleKind, error: bool) -> Self {
        RuleOutcome::Checked {
            error,
            message_key: kind.name(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, RuleOutcome::Checked { error: true, .. })
    }
}

/// Why a rule's parameters cannot be used
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParameterError {
    #[error("expected a numeric bound")]
    MissingBound,

    #[error("'{0}' is not a numeric bound")]
    InvalidBound(String),

    #[error("expected 'table,column', got '{0}'")]
    TableColumn(String),

    #[error(transparent)]
    Identifier(#[from] IdentifierError),
}

/// A rule whose parameters have been checked
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    Required,
    Nullable,
    String,
    Integer,
    Float,
    Min(f64),
    Max(f64),
    Exists { table: String, column: String },
    NotExists { table: String, column: String },
}

impl Rule {
    /// Resolve a parsed invocation.
    ///
    /// `Ok(None)` means the name is unknown.
    pub fn resolve(invocation: &RuleInvocation) -> Result<Option<Rule>, ParameterError> {
        let Some(kind) = RuleKind::from_name(&invocation.name) else {
            return Ok(None);
        };

        let rule = match kind {
            RuleKind::Required => Rule::Required,
            RuleKind::Nullable => Rule::Nullable,
            RuleKind::String => Rule::String,
            RuleKind::Integer => Rule::Integer,
            RuleKind::Float => Rule::Float,
            RuleKind::Min => Rule::Min(bound(invocation)?),
            RuleKind::Max => Rule::Max(bound(invocation)?),
            RuleKind::Exists => {
                let (table, column) = table_column(invocation)?;
                Rule::Exists { table, column }
            }
            RuleKind::NotExists => {
                let (table, column) = table_column(invocation)?;
                Rule::NotExists { table, column }
            }
        };

        Ok(Some(rule))
    }

    pub fn kind(&self) -> RuleKind {
        match self {
            Rule::Required => RuleKind::Required,
            Rule::Nullable => RuleKind::Nullable,
            Rule::String => RuleKind::String,
            Rule::Integer => RuleKind::Integer,
            Rule::Float => RuleKind::Float,
            Rule::Min(_) => RuleKind::Min,
            Rule::Max(_) => RuleKind::Max,
            Rule::Exists { .. } => RuleKind::Exists,
            Rule::NotExists { .. } => RuleKind::NotExists,
        }
    }

    /// Evaluate the rule for `field` against the full input.
    ///
    /// Only existence rules touch the checker, and only their lookups can fail.
    pub async fn evaluate(
        &self,
        field: &str,
        data: &ValidationInput,
        checker: &dyn ExistenceChecker,
    ) -> Result<RuleOutcome, DependencyError> {
        let value = data.get(field);
        let kind = self.kind();

        let error = match self {
            Rule::Nullable => {
                return Ok(RuleOutcome::Nullable(value.map_or(true, Value::is_null)));
            }
            Rule::Required => is_empty(value),
            Rule::String => value.is_some_and(|v| !v.is_string()),
            Rule::Integer => value.is_some_and(|v| !is_integer(v)),
            Rule::Float => value.is_some_and(|v| !is_float(v)),
            Rule::Min(min) => (text_length(value) as f64) < *min,
            Rule::Max(max) => (text_length(value) as f64) > *max,
            Rule::Exists { table, column } => match value {
                None | Some(Value::Null) => false,
                Some(v) => checker.exists(table, column, v).await?,
            },
            Rule::NotExists { table, column } => match value {
                Some(v) if !is_empty(value) => !checker.exists(table, column, v).await?,
                _ => true,
            },
        };

        Ok(RuleOutcome::checked(kind, error))
    }
}

fn bound(invocation: &RuleInvocation) -> Result<f64, ParameterError> {
    let raw = invocation.param(0).ok_or(ParameterError::MissingBound)?;

    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(ParameterError::InvalidBound(raw.to_string())),
    }
}

fn table_column(invocation: &RuleInvocation) -> Result<(String, String), ParameterError> {
    match invocation.params.as_slice() {
        [table, column] if !table.is_empty() && !column.is_empty() => {
            validate_identifier(table)?;
            validate_identifier(column)?;
            Ok((table.clone(), column.clone()))
        }
        _ => Err(ParameterError::TableColumn(invocation.params.join(","))),
    }
}

/// Loose emptiness: absent, null, `""`, `"0"`, `false`, zero and empty containers
pub fn is_empty(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::Bool(b)) => !b,
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        Some(Value::String(s)) => s.is_empty() || s == "0",
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(map)) => map.is_empty(),
    }
}

/// Length of a value's textual form; containers count their elements
pub fn text_length(value: Option<&Value>) -> usize {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => 0,
        Some(Value::Bool(true)) => 1,
        Some(Value::Number(n)) => number_text(n).chars().count(),
        Some(Value::String(s)) => s.chars().count(),
        Some(Value::Array(items)) => items.len(),
        Some(Value::Object(map)) => map.len(),
    }
}

/// Decimal form of a number; whole floats drop their fraction (`3.0` is `"3"`)
fn number_text(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() => f.to_string(),
        _ => n.to_string(),
    }
}

fn is_integer(value: &Value) -> bool {
    matches!(value, Value::Number(n) if n.is_i64() || n.is_u64())
}

fn is_float(value: &Value) -> bool {
    matches!(value, Value::Number(n) if n.is_f64())
}
