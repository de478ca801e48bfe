//! JDBC Bridge Core
//!
//! Driver registration and lazy connection management over a host-supplied
//! JDBC driver bridge. The bridge (class loading, driver-manager calls, SQL
//! execution) is provided through the [`bridge`] traits; this crate composes
//! those calls into memoized, future-based connection handling:
//!
//! - [`DriverRegistry`] registers each driver class with the driver manager
//!   at most once per process.
//! - [`ConnectionManager`] lazily opens and caches one connection per
//!   [`DriverConfig`], sharing a single in-flight acquisition between
//!   concurrent callers and replacing closed connections only on request.

pub mod bridge;
pub mod config;
pub mod connection;
pub mod error;
pub mod manager;
pub mod registry;
pub mod statement;

pub use bridge::{BridgeError, DriverBridge, DriverHandle, NativeConnection, NativeStatement};
pub use config::DriverConfig;
pub use connection::{ConnectionState, ManagedConnection};
pub use error::{BridgeResult, Error};
pub use manager::ConnectionManager;
pub use registry::DriverRegistry;
pub use statement::Statement;
