//! Error types for sync-daemon.

use std::path::PathBuf;

/// Main error type for sync-daemon startup and shutdown.
///
/// Nothing inside a cycle produces one of these; only setup and state
/// persistence can fail the daemon.
#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Engine construction error.
    #[error("engine error: {0}")]
    Engine(#[from] sync_client::EngineError),

    /// Storage error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// REST client setup error.
    #[error("api client error: {0}")]
    Api(String),

    /// State file error.
    #[error("state file {path}: {reason}")]
    State {
        /// Path to the state file.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Storage layer errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// Database path error.
    #[error("invalid database path: {path}")]
    InvalidPath {
        /// The invalid path.
        path: PathBuf,
    },
}

/// Result type alias for daemon operations.
pub type Result<T> = std::result::Result<T, DaemonError>;

/// Result type alias for storage operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;
