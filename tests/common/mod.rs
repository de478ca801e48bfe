//! Shared in-memory driver bridge for integration tests.
//!
//! The mock counts every bridge call and can inject latency or failures per
//! operation, so tests can assert exactly how many times the registry and
//! manager reached for the bridge.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use jdbc_bridge::bridge::{
    BridgeError, DriverBridge, DriverHandle, NativeConnection, NativeStatement,
};
use serde_json::{Value as JsonValue, json};

/// Install a test tracing subscriber once per test binary.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Instrumented mock bridge.
#[derive(Default)]
pub struct MockBridge {
    instantiate_calls: AtomicUsize,
    register_calls: AtomicUsize,
    connect_calls: AtomicUsize,
    fail_instantiate: AtomicBool,
    fail_register: AtomicBool,
    fail_connect: AtomicBool,
    connect_delay_ms: AtomicU64,
    instantiate_delay_ms: AtomicU64,
    last_credentials: Mutex<Option<(Option<String>, Option<String>)>>,
}

impl MockBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn instantiate_calls(&self) -> usize {
        self.instantiate_calls.load(Ordering::Acquire)
    }

    pub fn register_calls(&self) -> usize {
        self.register_calls.load(Ordering::Acquire)
    }

    pub fn connect_calls(&self) -> usize {
        self.connect_calls.load(Ordering::Acquire)
    }

    pub fn fail_instantiate(&self, fail: bool) {
        self.fail_instantiate.store(fail, Ordering::Release);
    }

    pub fn fail_register(&self, fail: bool) {
        self.fail_register.store(fail, Ordering::Release);
    }

    pub fn fail_connect(&self, fail: bool) {
        self.fail_connect.store(fail, Ordering::Release);
    }

    pub fn set_connect_delay(&self, ms: u64) {
        self.connect_delay_ms.store(ms, Ordering::Release);
    }

    pub fn set_instantiate_delay(&self, ms: u64) {
        self.instantiate_delay_ms.store(ms, Ordering::Release);
    }

    /// Credentials passed to the most recent connect call.
    pub fn last_credentials(&self) -> Option<(Option<String>, Option<String>)> {
        self.last_credentials.lock().unwrap().clone()
    }
}

#[async_trait]
impl DriverBridge for MockBridge {
    async fn instantiate(&self, class_name: &str) -> Result<DriverHandle, BridgeError> {
        self.instantiate_calls.fetch_add(1, Ordering::AcqRel);
        let delay = self.instantiate_delay_ms.load(Ordering::Acquire);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.fail_instantiate.load(Ordering::Acquire) {
            return Err(BridgeError::new(format!("class not found: {}", class_name)));
        }
        Ok(DriverHandle::new(class_name, Arc::new(class_name.to_string())))
    }

    async fn register_driver(&self, driver: &DriverHandle) -> Result<(), BridgeError> {
        self.register_calls.fetch_add(1, Ordering::AcqRel);
        if self.fail_register.load(Ordering::Acquire) {
            return Err(BridgeError::new(format!(
                "driver manager rejected {}",
                driver.class_name()
            )));
        }
        Ok(())
    }

    async fn connect(
        &self,
        url: &str,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<Box<dyn NativeConnection>, BridgeError> {
        let serial = self.connect_calls.fetch_add(1, Ordering::AcqRel) + 1;
        *self.last_credentials.lock().unwrap() = Some((
            username.map(str::to_string),
            password.map(str::to_string),
        ));

        let delay = self.connect_delay_ms.load(Ordering::Acquire);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.fail_connect.load(Ordering::Acquire) {
            return Err(BridgeError::new(format!("Connection refused: {}", url)));
        }
        Ok(Box::new(MockConnection {
            serial,
            closed: AtomicBool::new(false),
        }))
    }
}

/// Mock connection with an externally observable closed flag.
pub struct MockConnection {
    serial: usize,
    closed: AtomicBool,
}

#[async_trait]
impl NativeConnection for MockConnection {
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    async fn create_statement(&self) -> Result<Box<dyn NativeStatement>, BridgeError> {
        if self.is_closed() {
            return Err(BridgeError::new("connection is closed"));
        }
        Ok(Box::new(MockStatement {
            connection_serial: self.serial,
        }))
    }

    async fn close(&self) -> Result<(), BridgeError> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}

/// Mock statement that echoes the SQL and its connection's serial.
pub struct MockStatement {
    connection_serial: usize,
}

#[async_trait]
impl NativeStatement for MockStatement {
    async fn execute_query(&self, sql: &str) -> Result<Vec<JsonValue>, BridgeError> {
        Ok(vec![json!({
            "sql": sql,
            "connection": self.connection_serial,
        })])
    }

    async fn execute_update(&self, _sql: &str) -> Result<u64, BridgeError> {
        Ok(1)
    }
}
