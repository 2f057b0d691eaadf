//! Data-store lookups used by the `exists` and `not_exists` rules

use crate::identifier::IdentifierError;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Failure of the data store itself, as opposed to a negative answer
#[derive(Debug, Error)]
pub enum DependencyError {
    #[error("lookup timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("invalid lookup target: {0}")]
    InvalidIdentifier(#[from] IdentifierError),

    #[error("no data store is configured")]
    Unavailable,
}

/// Answers "is there a row in `table` whose `column` equals `value`?"
#[async_trait]
pub trait ExistenceChecker: Send + Sync {
    async fn exists(&self, table: &str, column: &str, value: &Value)
        -> Result<bool, DependencyError>;
}

#[async_trait]
impl<T> ExistenceChecker for Arc<T>
where
    T: ExistenceChecker + ?Sized,
{
    async fn exists(
        &self,
        table: &str,
        column: &str,
        value: &Value,
    ) -> Result<bool, DependencyError> {
        (**self).exists(table, column, value).await
    }
}

/// Checker for validators that never reach a data store.
///
/// Any existence rule evaluated against it fails the run with
/// [`DependencyError::Unavailable`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDatabase;

#[async_trait]
impl ExistenceChecker for NoDatabase {
    async fn exists(&self, _: &str, _: &str, _: &Value) -> Result<bool, DependencyError> {
        Err(DependencyError::Unavailable)
    }
}

/// In-memory table of known values, keyed by table then column.
///
/// Values compare with JSON equality, so `5` and `"5"` are different rows.
#[derive(Debug, Default)]
pub struct InMemoryExistenceChecker {
    tables: HashMap<String, HashMap<String, Vec<Value>>>,
    lookups: AtomicUsize,
}

impl InMemoryExistenceChecker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a value as present in `table.column`
    pub fn insert(&mut self, table: impl Into<String>, column: impl Into<String>, value: Value) {
        self.tables
            .entry(table.into())
            .or_default()
            .entry(column.into())
            .or_default()
            .push(value);
    }

    /// Builder form of [`insert`](Self::insert)
    pub fn with(mut self, table: impl Into<String>, column: impl Into<String>, value: Value) -> Self {
        self.insert(table, column, value);
        self
    }

    /// Load fixtures shaped as `table: { column: [values...] }`
    pub fn from_yaml_str(yaml: &str) -> Result<Self, serde_yaml::Error> {
        let tables: HashMap<String, HashMap<String, Vec<Value>>> = serde_yaml::from_str(yaml)?;
        Ok(Self {
            tables,
            lookups: AtomicUsize::new(0),
        })
    }

    /// Number of lookups answered so far
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ExistenceChecker for InMemoryExistenceChecker {
    async fn exists(
        &self,
        table: &str,
        column: &str,
        value: &Value,
    ) -> Result<bool, DependencyError> {
        self.lookups.fetch_add(1, Ordering::Relaxed);

        Ok(self
            .tables
            .get(table)
            .and_then(|columns| columns.get(column))
            .is_some_and(|values| values.contains(value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_in_memory_lookup() {
        let checker = InMemoryExistenceChecker::new()
            .with("users", "email", json!("a@x.com"))
            .with("users", "id", json!(7));

        assert!(checker.exists("users", "email", &json!("a@x.com")).await.unwrap());
        assert!(!checker.exists("users", "email", &json!("b@x.com")).await.unwrap());
        assert!(checker.exists("users", "id", &json!(7)).await.unwrap());
        assert!(!checker.exists("users", "id", &json!("7")).await.unwrap());
        assert!(!checker.exists("posts", "id", &json!(7)).await.unwrap());
        assert_eq!(checker.lookups(), 5);
    }

    #[tokio::test]
    async fn test_fixtures_from_yaml() {
        let checker = InMemoryExistenceChecker::from_yaml_str(
            "users:\n  email: [\"a@x.com\", \"b@x.com\"]\n  id: [1, 2]\n",
        )
        .unwrap();

        assert!(checker.exists("users", "email", &json!("b@x.com")).await.unwrap());
        assert!(checker.exists("users", "id", &json!(2)).await.unwrap());
        assert!(!checker.exists("users", "id", &json!(3)).await.unwrap());
    }

    #[tokio::test]
    async fn test_no_database_is_a_dependency_failure() {
        let result = NoDatabase.exists("users", "email", &json!("a@x.com")).await;
        assert!(matches!(result, Err(DependencyError::Unavailable)));
    }

    #[tokio::test]
    async fn test_shared_checker() {
        let checker: Arc<dyn ExistenceChecker> =
            Arc::new(InMemoryExistenceChecker::new().with("tags", "name", json!("rust")));
        assert!(checker.exists("tags", "name", &json!("rust")).await.unwrap());
    }
}
