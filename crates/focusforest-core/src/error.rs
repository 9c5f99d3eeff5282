//! Core error types for focusforest-core.
//!
//! The session engine itself never surfaces these: illegal transitions are
//! no-ops and collaborator failures degrade to fallbacks. They exist for the
//! collaborators (storage, content, notification) and for the CLI.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for focusforest-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Content service errors
    #[error("Content error: {0}")]
    Content(#[from] ContentError),

    /// Garden economy errors
    #[error("Garden error: {0}")]
    Garden(#[from] GardenError),

    /// Task list errors
    #[error("Task error: {0}")]
    Task(#[from] TaskError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Storage-specific errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// Record could not be encoded
    #[error("Failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(#[from] std::io::Error),

    /// Settings could not be written
    #[error("Settings error: {0}")]
    Settings(#[from] ConfigError),
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

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Content service errors. Always replaced by a fallback inside the engine.
#[derive(Error, Debug)]
pub enum ContentError {
    /// No API key in the environment or keyring
    #[error("No API key configured for the content service")]
    MissingApiKey,

    /// Content lookups are switched off
    #[error("Content service disabled")]
    Disabled,

    /// Transport failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status
    #[error("Content service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The answer had no usable text
    #[error("Content service returned an empty response")]
    EmptyResponse,

    /// The answer could not be parsed
    #[error("Malformed content response: {0}")]
    Malformed(String),

    /// Invalid endpoint URL
    #[error("Invalid endpoint: {0}")]
    Endpoint(#[from] url::ParseError),

    /// Lookup did not finish in time
    #[error("Content lookup timed out after {0:?}")]
    Timeout(std::time::Duration),
}

/// Notification delivery errors.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// The platform refused permission
    #[error("Notification permission denied")]
    PermissionDenied,

    /// No notification backend available
    #[error("Notifications unavailable: {0}")]
    Unavailable(String),
}

/// Garden economy errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum GardenError {
    /// No reward with that id
    #[error("No fruit with id '{0}' in the garden")]
    UnknownFruit(String),

    /// No tree variant with that name
    #[error("Unknown tree variant: {0}")]
    UnknownTree(String),

    /// Tree variant already owned
    #[error("Tree variant {0} is already unlocked")]
    AlreadyUnlocked(String),

    /// Not enough seeds for the purchase
    #[error("Not enough seeds: need {needed}, have {available}")]
    InsufficientSeeds { needed: u64, available: u64 },
}

/// Task list errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TaskError {
    /// Title was blank
    #[error("Task title must not be empty")]
    EmptyTitle,

    /// No task with that id
    #[error("No task with id '{0}'")]
    UnknownTask(String),
}

/// The session runner task is no longer receiving commands.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Session runner has stopped")]
pub struct SessionClosed;

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => {
                if e.code == rusqlite::ErrorCode::DatabaseLocked {
                    StorageError::Locked
                } else {
                    StorageError::QueryFailed(err.to_string())
                }
            }
            _ => StorageError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
