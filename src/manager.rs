//! Lazy, memoized connection acquisition.
//!
//! Each [`ConnectionManager`] owns at most one connection for one
//! [`DriverConfig`]. What it caches is the acquisition future itself, not
//! just its result: the first caller starts the attempt and every concurrent
//! caller awaits the same shared future, so one config never produces two
//! racing connections.
//!
//! # Concurrency Safety
//!
//! - The cached future lives behind a `std::sync::Mutex` held only for brief
//!   synchronous sections, never across an await
//! - Failed attempts are evicted by the caller that observed them, compared
//!   by future identity so a racer's fresh attempt is never thrown away
//! - Acquisition runs in a spawned task, so it completes even when every
//!   caller stops waiting; there is no cancellation path

use std::fmt;
use std::sync::{Arc, Mutex};

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tracing::{debug, info};

use crate::bridge::{BridgeError, DriverBridge};
use crate::config::DriverConfig;
use crate::connection::{ConnectionState, ManagedConnection};
use crate::error::{BridgeResult, Error};
use crate::registry::DriverRegistry;
use crate::statement::Statement;

/// The memoized in-flight acquisition. Shared so every concurrent caller
/// attaches to the same attempt and sees the same outcome.
type PendingConnection = Shared<BoxFuture<'static, BridgeResult<ManagedConnection>>>;

/// Manages the single lazy connection for one driver configuration.
pub struct ConnectionManager {
    config: DriverConfig,
    bridge: Arc<dyn DriverBridge>,
    registry: Arc<DriverRegistry>,
    /// Cached acquisition future, present from the first request onward.
    pending: Mutex<Option<PendingConnection>>,
}

impl ConnectionManager {
    /// Create a manager for one driver configuration.
    ///
    /// Fails fast with [`Error::Config`] when the configuration is invalid.
    /// No bridge call happens here; drivers register and connections open on
    /// first use.
    pub fn new(
        config: DriverConfig,
        bridge: Arc<dyn DriverBridge>,
        registry: Arc<DriverRegistry>,
    ) -> BridgeResult<Self> {
        config.validate()?;
        debug!(
            class_name = %config.class_name,
            url = %config.masked_url(),
            "Created connection manager"
        );
        Ok(Self {
            config,
            bridge,
            registry,
            pending: Mutex::new(None),
        })
    }

    /// The configuration this manager connects with.
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Register the configured driver class without opening a connection.
    ///
    /// Optional: `get_connection` registers on demand. Calling this early
    /// surfaces driver problems before the first connection is needed.
    pub async fn init(&self) -> BridgeResult<()> {
        self.registry
            .ensure_registered(self.bridge.as_ref(), &self.config.class_name)
            .await
    }

    /// Current lifecycle state of the cached connection.
    pub fn state(&self) -> ConnectionState {
        let pending = self.pending.lock().unwrap();
        match pending.as_ref() {
            None => ConnectionState::Uninitialized,
            Some(fut) => match fut.peek() {
                None => ConnectionState::Acquiring,
                Some(Ok(conn)) if conn.is_closed() => ConnectionState::Closed,
                Some(Ok(_)) => ConnectionState::Open,
                // A failed attempt is evicted by the caller that observed
                // it; until then it counts as having no connection.
                Some(Err(_)) => ConnectionState::Uninitialized,
            },
        }
    }

    /// Get the managed connection, acquiring it on first use.
    ///
    /// With `connect_if_closed` set, a cached connection that reports closed
    /// is discarded and replaced by exactly one new acquisition; concurrent
    /// callers share it. Without it, a closed connection is returned as-is
    /// and recovery stays opt-in.
    pub async fn get_connection(&self, connect_if_closed: bool) -> BridgeResult<ManagedConnection> {
        let pending = self.current_or_acquire();

        match pending.clone().await {
            Err(err) => {
                // Failures are not cached; the next call starts fresh.
                self.evict_if_current(&pending);
                Err(err)
            }
            Ok(connection) => {
                if connection.is_closed() && connect_if_closed {
                    debug!(
                        url = %self.config.masked_url(),
                        "Cached connection is closed, reconnecting"
                    );
                    let replacement = self.replace_if_current(&pending);
                    let result = replacement.clone().await;
                    if result.is_err() {
                        self.evict_if_current(&replacement);
                    }
                    result
                } else {
                    Ok(connection)
                }
            }
        }
    }

    /// Create a statement, acquiring or replacing the connection exactly as
    /// [`get_connection`](Self::get_connection) would.
    pub async fn create_statement(&self, connect_if_closed: bool) -> BridgeResult<Statement> {
        let connection = self.get_connection(connect_if_closed).await?;
        connection.create_statement().await
    }

    /// Return the cached future, starting a new acquisition when none exists.
    fn current_or_acquire(&self) -> PendingConnection {
        let mut pending = self.pending.lock().unwrap();
        if let Some(fut) = pending.as_ref() {
            return fut.clone();
        }
        let fut = self.acquire();
        *pending = Some(fut.clone());
        fut
    }

    /// Drop the cached future if `stale` is still the one in the slot.
    fn evict_if_current(&self, stale: &PendingConnection) {
        let mut pending = self.pending.lock().unwrap();
        if pending.as_ref().is_some_and(|current| current.ptr_eq(stale)) {
            *pending = None;
        }
    }

    /// Replace the cached future if `stale` is still the one in the slot.
    ///
    /// When another caller already replaced it, attach to that acquisition
    /// instead of starting a second one.
    fn replace_if_current(&self, stale: &PendingConnection) -> PendingConnection {
        let mut pending = self.pending.lock().unwrap();
        if let Some(current) = pending.as_ref() {
            if !current.ptr_eq(stale) {
                return current.clone();
            }
        }
        let fut = self.acquire();
        *pending = Some(fut.clone());
        fut
    }

    /// Start one connection acquisition.
    ///
    /// The work runs in a spawned task so it completes even if every caller
    /// stops polling; the shared handle fans the outcome out to all of them.
    fn acquire(&self) -> PendingConnection {
        let bridge = Arc::clone(&self.bridge);
        let registry = Arc::clone(&self.registry);
        let config = self.config.clone();

        let task = tokio::spawn(async move {
            registry
                .ensure_registered(bridge.as_ref(), &config.class_name)
                .await?;

            debug!(url = %config.masked_url(), "Requesting connection from driver manager");
            let native = bridge
                .connect(
                    &config.url,
                    config.username.as_deref(),
                    config.password.as_deref(),
                )
                .await
                .map_err(|e| {
                    Error::connection(format!("Failed to connect: {}", e), connect_suggestion(&e))
                })?;

            info!(url = %config.masked_url(), "Connection established");
            Ok(ManagedConnection::new(Arc::from(native)))
        });

        async move {
            match task.await {
                Ok(result) => result,
                Err(err) => Err(Error::connection(
                    format!("Connection task failed: {}", err),
                    "Retry the connection attempt",
                )),
            }
        }
        .boxed()
        .shared()
    }
}

impl fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("class_name", &self.config.class_name)
            .field("url", &self.config.masked_url())
            .field("state", &self.state())
            .finish()
    }
}

/// Suggestion for connect failures, keyed on what the bridge reported.
fn connect_suggestion(err: &BridgeError) -> String {
    let text = err.message().to_lowercase();
    if text.contains("refused") || text.contains("timed out") {
        return "Check that the database server is running and accessible".to_string();
    }
    if text.contains("authentication") || text.contains("password") || text.contains("denied") {
        return "Verify the username and password".to_string();
    }
    if text.contains("no suitable driver") {
        return "Check that the driver class matches the connection URL scheme".to_string();
    }
    "Check the connection URL and driver configuration".to_string()
}
