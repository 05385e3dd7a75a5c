//! Core error types for focos-core.
//!
//! Every fallible operation in the library returns one of the enums below.
//! Best-effort side effects (DNS flush, notifications) have their own error
//! types so callers can see them but are free to ignore them.

use std::path::PathBuf;
use thiserror::Error;

use crate::session::{Mode, Phase};

/// Core error type for focos-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Hosts-file block errors
    #[error("Block error: {0}")]
    Block(#[from] BlockError),

    /// Session state machine errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while reading, rewriting or committing the hosts file.
#[derive(Error, Debug)]
pub enum BlockError {
    /// No usable domain survived normalization.
    #[error("no domains to block after normalization")]
    EmptyInput,

    /// The existing managed block is malformed; nothing was written.
    #[error("corrupt managed block at line {line}: {reason}")]
    CorruptMarkerBlock { line: usize, reason: String },

    /// The elevated copy was refused or failed.
    #[error("elevation failed: {0}")]
    ElevationDenied(String),

    /// Every elevation helper was tried and none succeeded.
    #[error("no supported elevation method found: {0}")]
    NoElevationMethodAvailable(String),

    /// Writing the staged copy failed before any elevation was attempted.
    #[error("failed to stage hosts content at {path}: {source}")]
    Staging {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading the hosts file failed.
    #[error("hosts file I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the session state machine and its controller.
#[derive(Error, Debug)]
pub enum SessionError {
    /// A session cannot start without at least one site.
    #[error("add at least one site to block")]
    EmptyBlockList,

    /// A session is already live.
    #[error("a {0} session is already running")]
    AlreadyRunning(Mode),

    /// There is no live session to act on.
    #[error("no session is running")]
    NotRunning,

    /// Strict sessions cannot be stopped and lock the block list.
    #[error("strict mode is active: blocking cannot be stopped or changed until the session ends")]
    StrictLocked,

    /// The block list cannot be edited while a session is live.
    #[error("blocked sites cannot be changed while a session is running")]
    SessionActive,

    /// The requested action makes no sense in the current phase.
    #[error("cannot {action} a {mode} session while {phase}")]
    InvalidTransition {
        mode: Mode,
        phase: Phase,
        action: &'static str,
    },

    /// Rejected session configuration.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The hosts block manager refused the request.
    #[error(transparent)]
    Block(#[from] BlockError),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The user's configuration directory could not be determined or created.
    #[error("cannot resolve configuration directory: {0}")]
    NoConfigDir(String),

    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Key does not exist in the configuration tree
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Value outside the accepted range
    #[error("{field} must be between {min} and {max} (got {value})")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// Input normalized to nothing
    #[error("'{0}' is not a usable domain")]
    EmptyDomain(String),

    /// Out of bounds
    #[error("Index {index} out of bounds for block list (length: {len})")]
    IndexOutOfBounds { index: usize, len: usize },
}

/// Failure of the best-effort DNS cache flush. Never propagated by the
/// hosts block manager.
#[derive(Error, Debug)]
#[error("DNS cache flush failed: {}", failures.join("; "))]
pub struct FlushError {
    pub failures: Vec<String>,
}

/// Failure to deliver a notification. Never propagated by sessions.
#[derive(Error, Debug)]
#[error("notification delivery failed: {0}")]
pub struct NotifyError(pub String);

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
