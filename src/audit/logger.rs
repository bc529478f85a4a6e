use chrono::Utc;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::GitResult;
use crate::git::executor::ProcessOutput;

const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024; // 10MB

/// How a journaled invocation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Exited(i32),
    Crashed,
    Cancelled,
    /// Waiting on the child failed with an I/O error
    Error,
}

impl Outcome {
    pub fn of(result: &GitResult<ProcessOutput>) -> Self {
        match result {
            Ok(output) => output.exit_code.map_or(Outcome::Crashed, Outcome::Exited),
            Err(e) if e.is_cancelled() => Outcome::Cancelled,
            Err(_) => Outcome::Error,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Exited(code) => write!(f, "exit:{}", code),
            Outcome::Crashed => f.write_str("exit:crashed"),
            Outcome::Cancelled => f.write_str("exit:cancelled"),
            Outcome::Error => f.write_str("exit:error"),
        }
    }
}

/// Append-only journal of executed git commands
#[derive(Debug)]
pub struct AuditLogger {
    log_path: PathBuf,
    max_size: u64,
    // serializes rotation against concurrent writers
    lock: Mutex<()>,
}

impl AuditLogger {
    /// Create a new AuditLogger with the default log path
    pub fn new() -> std::io::Result<Self> {
        Self::with_path(Self::default_log_path()?)
    }

    /// Create an AuditLogger with a custom log path
    pub fn with_path<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let log_path = path.as_ref().to_path_buf();

        // Ensure directory exists
        if let Some(parent) = log_path.parent() {
            fs::create_dir_all(parent)?;
        }

        Ok(Self {
            log_path,
            max_size: MAX_LOG_SIZE,
            lock: Mutex::new(()),
        })
    }

    /// Rotate once the journal grows past `bytes`
    pub fn max_size(mut self, bytes: u64) -> Self {
        self.max_size = bytes;
        self
    }

    /// Get the default log path: ~/.config/gitpipe/history.log
    fn default_log_path() -> std::io::Result<PathBuf> {
        let home = std::env::var("HOME").map_err(|_| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "HOME environment variable not set",
            )
        })?;

        Ok(PathBuf::from(home)
            .join(".config")
            .join("gitpipe")
            .join("history.log"))
    }

    /// Log a finished command
    pub fn log_command(&self, command: &str, dir: &Path, outcome: Outcome) -> std::io::Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        self.rotate_if_needed()?;

        let timestamp = Utc::now().to_rfc3339();
        let user = std::env::var("USER").unwrap_or_else(|_| "unknown".to_string());

        let log_entry = format!(
            "[{}] [{}] [{}] [{}] {}\n",
            timestamp,
            user,
            dir.display(),
            outcome,
            command
        );

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;

        file.write_all(log_entry.as_bytes())?;
        file.flush()?;

        Ok(())
    }

    /// Rotate log file if it exceeds the size limit: history.log -> history.log.1
    fn rotate_if_needed(&self) -> std::io::Result<()> {
        if !self.log_path.exists() {
            return Ok(());
        }

        let metadata = fs::metadata(&self.log_path)?;
        if metadata.len() > self.max_size {
            let backup_path = self.log_path.with_extension("log.1");
            fs::rename(&self.log_path, backup_path)?;
        }

        Ok(())
    }

    /// Get the path to the log file
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }
}
