//! Statement execution.

use std::fmt;

use serde_json::Value as JsonValue;
use tracing::debug;

use crate::bridge::NativeStatement;
use crate::error::{BridgeResult, Error};

/// A statement created from a managed connection.
///
/// Execution is delegated to the bridge, which owns SQL handling and
/// marshals result sets into JSON rows.
pub struct Statement {
    inner: Box<dyn NativeStatement>,
}

impl Statement {
    pub(crate) fn new(inner: Box<dyn NativeStatement>) -> Self {
        Self { inner }
    }

    /// Execute a query and return its rows.
    pub async fn execute_query(&self, sql: &str) -> BridgeResult<Vec<JsonValue>> {
        debug!(sql = %sql, "Executing query");
        self.inner
            .execute_query(sql)
            .await
            .map_err(|e| Error::statement(format!("Query failed: {}", e)))
    }

    /// Execute an update and return the affected row count.
    pub async fn execute_update(&self, sql: &str) -> BridgeResult<u64> {
        debug!(sql = %sql, "Executing update");
        self.inner
            .execute_update(sql)
            .await
            .map_err(|e| Error::statement(format!("Update failed: {}", e)))
    }
}

impl fmt::Debug for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Statement").finish_non_exhaustive()
    }
}
