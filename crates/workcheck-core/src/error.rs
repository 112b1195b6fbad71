//! Core error types for workcheck-core.
//!
//! The check-in engine itself never fails: degenerate windows, redundant
//! acknowledgements and an exhausted popup cap all degrade to logged no-ops.
//! Errors only surface at the edges, where configuration is parsed and
//! notifications are handed to the desktop.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for workcheck-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Notification backend errors
    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
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

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Key does not exist in the configuration tree
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Data directory could not be determined or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Validation errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// Time-of-day string not in 24-hour `HH:MM` form
    #[error("Invalid time of day '{0}': expected HH:MM (24-hour)")]
    InvalidTimeOfDay(String),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Notifier errors. The engine never propagates these; they exist so
/// backends can report what went wrong to diagnostics.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// No notification backend on this platform
    #[error("No notification backend available")]
    Unavailable,

    /// Permission was not granted
    #[error("Notification permission not granted")]
    NotPermitted,

    /// Backend command could not be spawned or exited unsuccessfully
    #[error("Notification command '{command}' failed: {message}")]
    CommandFailed { command: String, message: String },
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
