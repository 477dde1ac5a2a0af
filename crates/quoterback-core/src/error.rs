//! Core error types for quoterback-core.
//!
//! Every fallible engine operation reports one of these as a value; none of
//! them is ever allowed to unwind past the engine boundary.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for quoterback-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Persistent storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The user declined notification permission
    #[error("Notification permission denied")]
    PermissionDenied,

    /// The catalog has no quotes to offer
    #[error("No quote available")]
    NoQuoteAvailable,

    /// The external notification dispatcher rejected a call
    #[error("Dispatcher error: {message}")]
    Dispatcher { message: String },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by a [`KeyValueStore`](crate::storage::KeyValueStore).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Reading or decoding a record failed
    #[error("Failed to read '{key}': {message}")]
    ReadFailed { key: String, message: String },

    /// Writing a record failed
    #[error("Failed to write '{key}': {message}")]
    WriteFailed { key: String, message: String },

    /// The in-memory value could not be encoded as JSON
    #[error("Failed to serialize '{key}': {message}")]
    Serialize { key: String, message: String },
}

impl StorageError {
    /// Key of the record the failure relates to.
    pub fn key(&self) -> &str {
        match self {
            StorageError::ReadFailed { key, .. }
            | StorageError::WriteFailed { key, .. }
            | StorageError::Serialize { key, .. } => key,
        }
    }
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown or malformed configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Data directory could not be resolved or created
    #[error("Failed to access data directory: {0}")]
    DataDir(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
