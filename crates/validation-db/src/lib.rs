//! PostgreSQL-backed [`ExistenceChecker`](expert_validation::ExistenceChecker)
//! for the `exists` and `not_exists` rules.

pub mod checker;
pub mod config;
pub mod error;
pub mod security;

pub use checker::PgExistenceChecker;
pub use config::CheckerConfig;
pub use error::DbCheckerError;
