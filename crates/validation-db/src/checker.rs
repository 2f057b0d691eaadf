//! Existence lookups against a PostgreSQL pool

use crate::config::CheckerConfig;
use crate::error::DbCheckerError;
use crate::security::{quote_identifier, IdentifierError};
use async_trait::async_trait;
use expert_validation::{DependencyError, ExistenceChecker};
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgPool, PgPoolOptions};
use sqlx::query::QueryScalar;
use sqlx::Postgres;
use std::time::Duration;

type ExistsQuery<'q> = QueryScalar<'q, Postgres, bool, PgArguments>;

/// SQLSTATEs raised when the value's type cannot be compared with the column
const TYPE_MISMATCH_STATES: [&str; 4] = [
    "42883", // undefined_function: no `=` operator for the pair
    "42804", // datatype_mismatch
    "22P02", // invalid_text_representation
    "22003", // numeric_value_out_of_range
];

/// Answers existence rules with `SELECT EXISTS (...)` against a pool
#[derive(Debug, Clone)]
pub struct PgExistenceChecker {
    pool: PgPool,
    config: CheckerConfig,
}

impl PgExistenceChecker {
    /// Connect with default settings
    pub async fn connect(database_url: &str) -> Result<Self, DbCheckerError> {
        Self::connect_with_config(database_url, CheckerConfig::default()).await
    }

    /// Connect eagerly, failing fast when the database is unreachable
    pub async fn connect_with_config(
        database_url: &str,
        config: CheckerConfig,
    ) -> Result<Self, DbCheckerError> {
        check_config(&config)?;
        tracing::debug!(
            "Creating existence-check pool: max={}, min={}, acquire_timeout={}s",
            config.max_connections,
            config.min_connections,
            config.acquire_timeout
        );

        let pool = pool_options(&config)
            .connect(database_url)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create database pool: {}", e);
                DbCheckerError::Connect(e)
            })?;

        tracing::info!(
            "Existence-check pool ready with {} max connections",
            config.max_connections
        );
        Ok(Self { pool, config })
    }

    /// Build the pool without opening a connection until the first lookup
    pub fn connect_lazy_with_config(
        database_url: &str,
        config: CheckerConfig,
    ) -> Result<Self, DbCheckerError> {
        check_config(&config)?;
        let pool = pool_options(&config).connect_lazy(database_url)?;
        Ok(Self { pool, config })
    }

    /// Wrap an existing pool
    pub fn from_pool(pool: PgPool, config: CheckerConfig) -> Result<Self, DbCheckerError> {
        check_config(&config)?;
        Ok(Self { pool, config })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }
}

#[async_trait]
impl ExistenceChecker for PgExistenceChecker {
    #[tracing::instrument(skip(self, value), level = "debug")]
    async fn exists(
        &self,
        table: &str,
        column: &str,
        value: &Value,
    ) -> Result<bool, DependencyError> {
        let sql = exists_query(
            self.config.schema.as_deref(),
            table,
            column,
            self.config.compare_as_text,
        )?;
        let query: Option<ExistsQuery<'_>> = if self.config.compare_as_text {
            text_value(value).map(|text| sqlx::query_scalar(&sql).bind(text))
        } else {
            bind_value(sqlx::query_scalar(&sql), value)
        };
        // No row can hold an array, an object or null
        let Some(query) = query else {
            tracing::debug!("value has no column representation, treating as not found");
            return Ok(false);
        };

        let timeout = self.config.query_timeout();
        match tokio::time::timeout(timeout, query.fetch_one(&self.pool)).await {
            Ok(Ok(found)) => {
                tracing::debug!(found, "existence lookup finished");
                Ok(found)
            }
            Ok(Err(e)) if is_type_mismatch(&e) => {
                tracing::debug!(
                    "value type does not match {}.{}, treating as not found: {}",
                    table,
                    column,
                    e
                );
                Ok(false)
            }
            Ok(Err(e)) => Err(map_sqlx_error(e, self.config.acquire_timeout())),
            Err(_) => {
                tracing::warn!("existence lookup on {}.{} timed out after {:?}", table, column, timeout);
                Err(DependencyError::Timeout(timeout))
            }
        }
    }
}

fn pool_options(config: &CheckerConfig) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout())
}

fn check_config(config: &CheckerConfig) -> Result<(), DbCheckerError> {
    if config.max_connections == 0 {
        return Err(DbCheckerError::Configuration {
            message: "max_connections must be at least 1".to_string(),
        });
    }
    if config.min_connections > config.max_connections {
        return Err(DbCheckerError::Configuration {
            message: format!(
                "min_connections ({}) exceeds max_connections ({})",
                config.min_connections, config.max_connections
            ),
        });
    }
    if let Some(schema) = &config.schema {
        quote_identifier(schema)?;
    }
    Ok(())
}

/// Build the `SELECT EXISTS` statement for `table.column`
pub(crate) fn exists_query(
    schema: Option<&str>,
    table: &str,
    column: &str,
    compare_as_text: bool,
) -> Result<String, DependencyError> {
    let table = quote_identifier(table)?;
    let column = quote_identifier(column)?;
    let relation = match schema {
        Some(schema) => format!("{}.{}", quote_identifier(schema)?, table),
        None => table,
    };
    let lhs = if compare_as_text {
        format!("CAST({} AS TEXT)", column)
    } else {
        column
    };

    Ok(format!(
        "SELECT EXISTS (SELECT 1 FROM {} WHERE {} = $1)",
        relation, lhs
    ))
}

/// Bind a scalar value; `None` for values no column can hold
fn bind_value<'q>(query: ExistsQuery<'q>, value: &Value) -> Option<ExistsQuery<'q>> {
    match value {
        Value::String(s) => Some(query.bind(s.clone())),
        Value::Bool(b) => Some(query.bind(*b)),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Some(query.bind(i)),
            (None, Some(f)) => Some(query.bind(f)),
            (None, None) => None,
        },
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Text form used when comparing as text
pub(crate) fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

pub(crate) fn is_type_mismatch(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(e) => e
            .code()
            .is_some_and(|code| TYPE_MISMATCH_STATES.contains(&&*code)),
        _ => false,
    }
}

pub(crate) fn map_sqlx_error(error: sqlx::Error, acquire_timeout: Duration) -> DependencyError {
    match error {
        sqlx::Error::PoolTimedOut => DependencyError::Timeout(acquire_timeout),
        sqlx::Error::PoolClosed => DependencyError::Connection("pool is closed".to_string()),
        sqlx::Error::Io(e) => DependencyError::Connection(e.to_string()),
        sqlx::Error::Tls(e) => DependencyError::Connection(e.to_string()),
        sqlx::Error::Configuration(e) => DependencyError::Connection(e.to_string()),
        sqlx::Error::Database(e) => DependencyError::Query(e.message().to_string()),
        other => DependencyError::Query(other.to_string()),
    }
}
