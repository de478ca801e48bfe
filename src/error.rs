//! Error types for the JDBC bridge core.
//!
//! This module defines all error types using `thiserror`. The variants map
//! onto the failure surfaces of the crate: configuration validation, driver
//! registration, connection acquisition, and statement use. Every variant is
//! `Clone` so a shared in-flight acquisition can hand the same failure to all
//! of its waiting callers.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Invalid configuration, raised synchronously at construction.
    #[error("Invalid configuration: {message}")]
    Config { message: String },

    /// Failure instantiating or registering a driver class.
    #[error("Driver error: {message} (class: {class_name})")]
    Driver { class_name: String, message: String },

    /// Failure obtaining a connection from the driver manager.
    #[error("Connection failed: {message}")]
    Connection { message: String, suggestion: String },

    /// Failure creating or using a statement on an otherwise-valid connection.
    #[error("Statement error: {message}")]
    Statement { message: String },
}

impl Error {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a driver error for a class.
    pub fn driver(class_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Driver {
            class_name: class_name.into(),
            message: message.into(),
        }
    }

    /// Create a connection error with a helpful suggestion.
    pub fn connection(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Create a statement error.
    pub fn statement(message: impl Into<String>) -> Self {
        Self::Statement {
            message: message.into(),
        }
    }

    /// Get the suggestion for this error, if available.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Connection { suggestion, .. } => Some(suggestion),
            _ => None,
        }
    }

    /// Check if this error is retryable.
    ///
    /// Connection failures are transient; a later acquisition may succeed.
    /// Configuration, driver, and statement failures need caller intervention
    /// first.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }
}

/// Result type alias for bridge operations.
pub type BridgeResult<T> = Result<T, Error>;
