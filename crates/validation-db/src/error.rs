//! Errors raised while setting up a database checker

use expert_validation::IdentifierError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbCheckerError {
    #[error("Failed to create database pool: {0}")]
    Connect(#[from] sqlx::Error),

    #[error("Invalid schema name: {0}")]
    Schema(#[from] IdentifierError),

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}
