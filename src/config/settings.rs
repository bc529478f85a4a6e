use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::audit::logger::AuditLogger;
use crate::git::executor::{DEFAULT_GIT, GitExecutor};
use crate::git::version::GitVersion;

/// Oldest git whose output formats the parsers understand
pub const DEFAULT_MIN_VERSION: &str = "1.7.5.0";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Config directory not found")]
    DirectoryNotFound,

    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub git: GitConfig,
    #[serde(default)]
    pub behavior: BehaviorConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct GitConfig {
    /// Executable run as argv[0]; a bare name is looked up in `PATH`
    pub executable: String,
    pub min_version: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            executable: DEFAULT_GIT.to_string(),
            min_version: DEFAULT_MIN_VERSION.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Append every finished command to the history journal
    pub log_commands: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        let home = std::env::var("HOME").map_err(|_| ConfigError::DirectoryNotFound)?;
        Ok(PathBuf::from(home).join(".config").join("gitpipe"))
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from the default location
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Self::config_path()?)
    }

    /// Load the default location, falling back to defaults when it is absent
    pub fn load_or_default() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Self::default_config());
        }
        Self::load_from(path)
    }

    /// Load configuration from `path`
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;

        config.validate()?;

        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(Self::config_path()?)
    }

    /// Save configuration to `path`, readable by the owner only
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        self.validate()?;

        let path = path.as_ref();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(path)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(path, perms)?;
        }

        Ok(())
    }

    /// Create default configuration
    pub fn default_config() -> Self {
        Config {
            git: GitConfig::default(),
            behavior: BehaviorConfig::default(),
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.git.executable.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "git.executable must not be empty".to_string(),
            ));
        }

        if GitVersion::parse(&self.git.min_version).is_none() {
            return Err(ConfigError::InvalidValue(format!(
                "git.min_version is not a version: {}",
                self.git.min_version
            )));
        }

        Ok(())
    }

    /// Minimum accepted git version
    pub fn min_version(&self) -> GitVersion {
        GitVersion::parse(&self.git.min_version).unwrap_or_default()
    }

    /// Executor for the configured git, journaling commands if enabled
    pub fn executor(&self) -> Result<GitExecutor, ConfigError> {
        let executor = GitExecutor::new().git_path(&self.git.executable);
        if !self.behavior.log_commands {
            return Ok(executor);
        }
        Ok(executor.journal(AuditLogger::new()?))
    }
}
