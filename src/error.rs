use std::io;
use thiserror::Error;

use crate::config::settings::ConfigError;
use crate::git::version::GitVersion;

/// Errors that can occur during git operations
#[derive(Debug, Error)]
pub enum GitError {
    #[error("Not a git repository")]
    NotARepository,

    #[error("Failed to execute {program}: {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Git crashed{}", .signal.map(|s| format!(" (signal {s})")).unwrap_or_default())]
    Crashed { signal: Option<i32> },

    #[error("Git terminated with error code {code}: {stderr}")]
    CommandFailed { code: i32, stderr: String },

    #[error("Incomplete output: {0}")]
    IncompleteResult(String),

    #[error("Corrupted output: {0}")]
    InvalidResult(String),

    #[error("Operation was cancelled")]
    Cancelled,

    #[error("Git is not recent enough: requested version {required} but {found} present")]
    VersionTooOld {
        required: GitVersion,
        found: GitVersion,
    },

    #[error("Failed to detect git version from: {0}")]
    VersionUndetermined(String),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

/// Coarse classification of a [`GitError`], for callers that only branch on
/// the category (e.g. to hide cancellations from the user).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    SpawnFailed,
    Crashed,
    CommandFailed,
    IncompleteResult,
    InvalidResult,
    Cancelled,
    VersionMismatch,
    Environment,
}

impl GitError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GitError::SpawnFailed { .. } => ErrorKind::SpawnFailed,
            GitError::Crashed { .. } => ErrorKind::Crashed,
            GitError::CommandFailed { .. } => ErrorKind::CommandFailed,
            GitError::IncompleteResult(_) => ErrorKind::IncompleteResult,
            GitError::InvalidResult(_) => ErrorKind::InvalidResult,
            GitError::Cancelled => ErrorKind::Cancelled,
            GitError::VersionTooOld { .. } | GitError::VersionUndetermined(_) => {
                ErrorKind::VersionMismatch
            }
            GitError::NotARepository | GitError::IoError(_) => ErrorKind::Environment,
        }
    }

    /// Cancellation is a caller decision, not a failure worth reporting
    pub fn is_cancelled(&self) -> bool {
        matches!(self, GitError::Cancelled)
    }
}

/// Top-level application error that wraps all module-specific errors
///
/// All module errors automatically convert to AppError via the `From` trait.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Git error: {0}")]
    Git(#[from] GitError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for git operations
pub type GitResult<T> = std::result::Result<T, GitError>;

/// Result type for application-level operations
pub type AppResult<T> = std::result::Result<T, AppError>;
