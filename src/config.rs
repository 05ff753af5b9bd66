//! Application configuration management.
//!
//! Settings are layered with figment, later layers winning:
//!
//! 1. Built-in defaults
//! 2. `config.toml` in the platform config directory, or the `--config` file
//! 3. Environment variables prefixed `DEDUPE_` (e.g. `DEDUPE_IO_THREADS=8`)
//! 4. Command-line flags
//!
//! A missing default config file is not an error; a malformed one is.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::actions::DeleteMode;
use crate::cli::Cli;
use crate::duplicates::DEFAULT_IO_THREADS;
use crate::resolution::SessionOptions;
use crate::scanner::HashMode;
use crate::signal::DEFAULT_HOOK_TIMEOUT;

/// Prefix of environment variables read as configuration.
pub const ENV_PREFIX: &str = "DEDUPE_";

/// Errors loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// A layer could not be parsed or had the wrong shape.
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] Box<figment::Error>),
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Checksum algorithm.
    pub algorithm: HashMode,
    /// Descend into subdirectories.
    pub recursive: bool,
    /// Ask which file to keep for each group.
    pub keep_one: bool,
    /// Describe destructive actions without performing them.
    pub dry_run: bool,
    /// Move deleted files to the system trash.
    pub trash: bool,
    /// Hashing threads.
    pub io_threads: usize,
    /// Seconds shutdown hooks may run after Ctrl+C.
    pub hook_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            algorithm: HashMode::default(),
            recursive: false,
            keep_one: false,
            dry_run: false,
            trash: false,
            io_threads: DEFAULT_IO_THREADS,
            hook_timeout_secs: DEFAULT_HOOK_TIMEOUT.as_secs(),
        }
    }
}

impl Config {
    /// Load defaults, the config file and the environment.
    ///
    /// `explicit` replaces the default config file location and must exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the explicit file is missing or any layer
    /// is malformed.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match explicit {
            Some(path) if !path.is_file() => {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_path(),
        };

        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(file) = &file {
            log::debug!("Reading configuration from {}", file.display());
            figment = figment.merge(Toml::file(file));
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX));

        Self::extract(figment)
    }

    /// Extract a config from an assembled figment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if any layer is malformed.
    pub fn extract(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(Box::new)?;
        Ok(config.normalized())
    }

    /// Apply command-line flags on top of the loaded layers.
    ///
    /// Boolean flags can only switch a setting on.
    #[must_use]
    pub fn with_cli(mut self, cli: &Cli) -> Self {
        if let Some(algorithm) = cli.algorithm {
            self.algorithm = algorithm;
        }
        if let Some(threads) = cli.io_threads {
            self.io_threads = threads;
        }
        self.recursive |= cli.recursive;
        self.keep_one |= cli.keep_one;
        self.dry_run |= cli.dry_run;
        self.trash |= cli.trash;
        self.normalized()
    }

    /// Options for a resolution session.
    #[must_use]
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            keep_one: self.keep_one,
            dry_run: self.dry_run,
            delete_mode: if self.trash {
                DeleteMode::Trash
            } else {
                DeleteMode::Permanent
            },
        }
    }

    /// Time budget for shutdown hooks.
    #[must_use]
    pub fn hook_timeout(&self) -> Duration {
        Duration::from_secs(self.hook_timeout_secs)
    }

    /// Default platform-specific configuration path.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "dedupe").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    fn normalized(mut self) -> Self {
        self.io_threads = self.io_threads.max(1);
        self
    }
}
