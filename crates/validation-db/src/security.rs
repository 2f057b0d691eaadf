//! Quoting for table and column names taken from rule specs
//!
//! Every identifier is validated with the engine's rules and then quoted.

pub use expert_validation::identifier::{validate_identifier, IdentifierError};

/// Escape a SQL identifier by doubling quotes and wrapping it in double quotes
///
/// ```
/// use expert_validation_db::security::escape_identifier;
///
/// assert_eq!(escape_identifier("users"), "\"users\"");
/// assert_eq!(escape_identifier("odd\"name"), "\"odd\"\"name\"");
/// ```
pub fn escape_identifier(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

/// Validate and quote an identifier in one step
pub fn quote_identifier(identifier: &str) -> Result<String, IdentifierError> {
    validate_identifier(identifier)?;
    Ok(escape_identifier(identifier))
}
