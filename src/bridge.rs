//! The native driver bridge interface.
//!
//! Everything JDBC-specific lives behind these traits: loading a driver
//! class, registering it with the driver manager, opening connections, and
//! executing statements. The host supplies an implementation backed by
//! whatever runs the actual drivers (an embedded JVM, a sidecar process, an
//! emulation layer). This crate only composes the calls; it never interprets
//! driver internals.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use thiserror::Error;

/// Error reported by a bridge implementation.
///
/// Carries only a message. Classification into the crate's error taxonomy
/// happens at the call site, which knows which operation was in flight.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct BridgeError {
    message: String,
}

impl BridgeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for BridgeError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<&str> for BridgeError {
    fn from(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

/// Opaque handle to an instantiated driver class.
///
/// The payload is whatever the bridge implementation needs to identify the
/// driver instance on later calls; this crate never looks inside it.
#[derive(Clone)]
pub struct DriverHandle {
    class_name: String,
    payload: Arc<dyn Any + Send + Sync>,
}

impl DriverHandle {
    pub fn new(class_name: impl Into<String>, payload: Arc<dyn Any + Send + Sync>) -> Self {
        Self {
            class_name: class_name.into(),
            payload,
        }
    }

    /// Fully qualified class name this handle was instantiated from.
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Implementation payload, for the bridge to downcast back.
    pub fn payload(&self) -> &(dyn Any + Send + Sync) {
        self.payload.as_ref()
    }
}

impl fmt::Debug for DriverHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverHandle")
            .field("class_name", &self.class_name)
            .finish_non_exhaustive()
    }
}

/// Operations the bridge must provide for driver and connection management.
#[async_trait]
pub trait DriverBridge: Send + Sync {
    /// Load `class_name` and construct one instance of it.
    async fn instantiate(&self, class_name: &str) -> Result<DriverHandle, BridgeError>;

    /// Register an instantiated driver with the driver manager.
    async fn register_driver(&self, driver: &DriverHandle) -> Result<(), BridgeError>;

    /// Ask the driver manager for a connection to `url`.
    ///
    /// `None` credentials mean "not supplied", which drivers treat
    /// differently from an empty string.
    async fn connect(
        &self,
        url: &str,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<Box<dyn NativeConnection>, BridgeError>;
}

/// A live connection owned by the bridge.
#[async_trait]
pub trait NativeConnection: Send + Sync {
    /// Whether the connection reports itself closed. Must not block.
    fn is_closed(&self) -> bool;

    /// Create a statement on this connection.
    async fn create_statement(&self) -> Result<Box<dyn NativeStatement>, BridgeError>;

    /// Close the connection.
    async fn close(&self) -> Result<(), BridgeError>;
}

/// A statement created on a native connection.
///
/// The bridge owns execution and marshals result sets into JSON rows.
#[async_trait]
pub trait NativeStatement: Send + Sync {
    /// Execute a query and return its rows.
    async fn execute_query(&self, sql: &str) -> Result<Vec<JsonValue>, BridgeError>;

    /// Execute an update and return the affected row count.
    async fn execute_update(&self, sql: &str) -> Result<u64, BridgeError>;
}
