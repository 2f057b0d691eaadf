//! Pool and lookup settings

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for [`PgExistenceChecker`](crate::PgExistenceChecker)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckerConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    /// Seconds to wait for a pooled connection
    pub acquire_timeout: u64,
    /// Milliseconds a single lookup may take, acquisition included
    pub query_timeout_ms: u64,
    /// Schema the looked-up tables live in; unqualified when `None`
    pub schema: Option<String>,
    /// Compare `column::text` with the value's text form instead of binding typed values
    pub compare_as_text: bool,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            max_connections: 5,
            min_connections: 0,
            acquire_timeout: 5,
            query_timeout_ms: 3_000,
            schema: None,
            compare_as_text: false,
        }
    }
}

impl CheckerConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }
}
