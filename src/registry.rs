//! Driver registration tracking.
//!
//! The driver manager behind the bridge holds process-global state:
//! registering a driver class twice would register it twice. This module
//! keeps instantiate-and-register single-flight per class name.
//!
//! # Concurrency Safety
//!
//! - `OnceCell` per class name: concurrent calls for the same class wait for
//!   the first attempt instead of issuing their own bridge calls
//! - A failed attempt leaves the cell empty, so the class stays unregistered
//!   and a later call retries from scratch
//! - All locks are released before async operations (await points)

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{OnceCell, RwLock};
use tracing::{debug, info};

use crate::bridge::DriverBridge;
use crate::error::{BridgeResult, Error};

/// Tracks which driver classes have been registered with the driver manager.
///
/// Share one registry (behind an `Arc`) across every connection manager in
/// the process. Tests get isolation by constructing a fresh registry per
/// bridge instance.
pub struct DriverRegistry {
    /// Per-class registration markers. OnceCell ensures single-flight
    /// registration.
    classes: RwLock<HashMap<String, Arc<OnceCell<()>>>>,
}

impl DriverRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            classes: RwLock::new(HashMap::new()),
        }
    }

    /// Ensure `class_name` is registered with the driver manager, performing
    /// the instantiate-and-register sequence through `bridge` on first need.
    ///
    /// Returns immediately without bridge calls when the class is already
    /// registered. Concurrent calls for the same class share one attempt.
    pub async fn ensure_registered(
        &self,
        bridge: &dyn DriverBridge,
        class_name: &str,
    ) -> BridgeResult<()> {
        // Get or create the OnceCell for this class
        let cell = {
            let classes = self.classes.read().await;
            if let Some(cell) = classes.get(class_name) {
                Arc::clone(cell)
            } else {
                drop(classes);
                let mut classes = self.classes.write().await;
                // Double-check after acquiring write lock
                if let Some(cell) = classes.get(class_name) {
                    Arc::clone(cell)
                } else {
                    let cell = Arc::new(OnceCell::new());
                    classes.insert(class_name.to_string(), Arc::clone(&cell));
                    cell
                }
            }
        };

        cell.get_or_try_init(|| async {
            debug!(class_name = %class_name, "Instantiating driver class");
            let driver = bridge.instantiate(class_name).await.map_err(|e| {
                Error::driver(class_name, format!("Failed to instantiate driver: {}", e))
            })?;

            debug!(class_name = %class_name, "Registering driver with driver manager");
            bridge.register_driver(&driver).await.map_err(|e| {
                Error::driver(class_name, format!("Failed to register driver: {}", e))
            })?;

            info!(class_name = %class_name, "Driver registered");
            Ok::<_, Error>(())
        })
        .await?;

        Ok(())
    }

    /// Whether `class_name` has completed registration.
    pub async fn is_registered(&self, class_name: &str) -> bool {
        let classes = self.classes.read().await;
        classes
            .get(class_name)
            .is_some_and(|cell| cell.get().is_some())
    }

    /// Number of classes that completed registration.
    pub async fn registered_count(&self) -> usize {
        let classes = self.classes.read().await;
        classes.values().filter(|cell| cell.get().is_some()).count()
    }

    /// Class names that completed registration.
    pub async fn registered_classes(&self) -> Vec<String> {
        let classes = self.classes.read().await;
        classes
            .iter()
            .filter(|(_, cell)| cell.get().is_some())
            .map(|(name, _)| name.clone())
            .collect()
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverRegistry").finish_non_exhaustive()
    }
}
