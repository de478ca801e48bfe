//! Connection handle and lifecycle state.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::debug;

use crate::bridge::NativeConnection;
use crate::error::{BridgeResult, Error};
use crate::statement::Statement;

/// Lifecycle of a manager's cached connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No connection has been requested yet.
    Uninitialized,
    /// An acquisition is in flight.
    Acquiring,
    /// A connection is cached and reports open.
    Open,
    /// A connection is cached but reports closed.
    Closed,
}

impl ConnectionState {
    /// Whether an acquisition has completed and its connection is cached.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Open | Self::Closed)
    }

    /// Whether a usable open connection is cached.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::Acquiring => write!(f, "acquiring"),
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// A connection obtained through the driver bridge.
///
/// Clones are cheap and share the underlying native connection; closing one
/// handle closes them all.
#[derive(Clone)]
pub struct ManagedConnection {
    inner: Arc<dyn NativeConnection>,
    opened_at: Instant,
}

impl ManagedConnection {
    pub(crate) fn new(inner: Arc<dyn NativeConnection>) -> Self {
        Self {
            inner,
            opened_at: Instant::now(),
        }
    }

    /// Whether the underlying native connection reports itself closed.
    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    /// When this connection was acquired.
    pub fn opened_at(&self) -> Instant {
        self.opened_at
    }

    /// Create a statement on this connection.
    pub async fn create_statement(&self) -> BridgeResult<Statement> {
        let native = self
            .inner
            .create_statement()
            .await
            .map_err(|e| Error::statement(format!("Failed to create statement: {}", e)))?;
        Ok(Statement::new(native))
    }

    /// Close the underlying native connection.
    pub async fn close(&self) -> BridgeResult<()> {
        debug!("Closing connection");
        self.inner.close().await.map_err(|e| {
            Error::connection(
                format!("Failed to close connection: {}", e),
                "The connection may already be closed by the driver",
            )
        })
    }

    /// Whether two handles share the same underlying native connection.
    pub fn same_connection(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for ManagedConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedConnection")
            .field("closed", &self.is_closed())
            .field("opened_at", &self.opened_at)
            .finish()
    }
}
