//! Application configuration management.
//!
//! Settings are layered with figment, later layers winning:
//!
//! 1. Built-in defaults
//! 2. TOML config file (`--config FILE`, or `config.toml` in the platform
//!    config directory)
//! 3. `TARSORT_*` environment variables
//!
//! Command-line flags select the output mode and are validated into a
//! [`RunOptions`] before any scanning starts.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cli::Cli;
use crate::scanner::DEFAULT_CHUNK_SIZE;

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "TARSORT_";

/// Errors raised while building the run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `-0` asks for a listing but `-c` asks for an archive.
    #[error("can't use -0 with -c")]
    NulWithArchive,

    /// `-l` only makes sense when writing an archive.
    #[error("can't use -l without -c")]
    LinksWithoutArchive,

    /// An explicitly requested config file does not exist.
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    /// A buffer size of zero was configured.
    #[error("{0} must be greater than zero")]
    InvalidBufferSize(&'static str),

    /// The layered configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Figment(#[from] Box<figment::Error>),
}

impl ConfigError {
    /// Whether this is a flag combination error rather than a settings error.
    #[must_use]
    pub fn is_usage(&self) -> bool {
        matches!(self, Self::NulWithArchive | Self::LinksWithoutArchive)
    }
}

/// Persistent settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Chunk size used when hashing files.
    pub read_buffer_size: usize,
    /// Capacity of the buffer in front of the output.
    pub write_buffer_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            read_buffer_size: DEFAULT_CHUNK_SIZE,
            write_buffer_size: 1024 * 1024,
        }
    }
}

impl Config {
    /// Load the layered configuration.
    ///
    /// An explicit `path` must exist; the default config file is optional.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a layer cannot be parsed or a value is
    /// out of range.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(p) if !p.exists() => return Err(ConfigError::FileNotFound(p.to_path_buf())),
            Some(p) => Some(p.to_path_buf()),
            None => Self::default_path(),
        };

        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(file) = &file {
            log::debug!("Loading config from {}", file.display());
            figment = figment.merge(Toml::file(file));
        }
        let config: Self = figment
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()
            .map_err(Box::new)?;

        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBufferSize`] for zero sizes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.read_buffer_size == 0 {
            return Err(ConfigError::InvalidBufferSize("read_buffer_size"));
        }
        if self.write_buffer_size == 0 {
            return Err(ConfigError::InvalidBufferSize("write_buffer_size"));
        }
        Ok(())
    }

    /// Render the configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Platform-specific default config file location.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "tarsort").map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

/// What a run writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Newline-terminated path list
    List,
    /// NUL-terminated path list
    ListNul,
    /// Tar archive, every file stored in full
    Archive,
    /// Tar archive, identical files stored as hardlinks
    ArchiveLinks,
}

impl Mode {
    /// Select the mode from the `-c`, `-0` and `-l` flags.
    ///
    /// # Errors
    ///
    /// Rejects `-0` with `-c` and `-l` without `-c`.
    ///
    /// ```
    /// use tarsort::config::{Mode, ConfigError};
    ///
    /// assert_eq!(Mode::from_flags(true, false, true).unwrap(), Mode::ArchiveLinks);
    /// assert!(matches!(Mode::from_flags(false, false, true), Err(ConfigError::LinksWithoutArchive)));
    /// ```
    pub fn from_flags(create: bool, null: bool, links: bool) -> Result<Self, ConfigError> {
        match (create, null, links) {
            (true, true, _) => Err(ConfigError::NulWithArchive),
            (false, _, true) => Err(ConfigError::LinksWithoutArchive),
            (true, false, true) => Ok(Self::ArchiveLinks),
            (true, false, false) => Ok(Self::Archive),
            (false, true, false) => Ok(Self::ListNul),
            (false, false, false) => Ok(Self::List),
        }
    }

    /// Whether the run writes an archive.
    #[must_use]
    pub fn is_archive(self) -> bool {
        matches!(self, Self::Archive | Self::ArchiveLinks)
    }
}

/// Validated options for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Output mode
    pub mode: Mode,
    /// Roots to scan, in order
    pub paths: Vec<PathBuf>,
    /// Output file; standard output when `None`
    pub output: Option<PathBuf>,
    /// Report every archived entry on standard error
    pub verbose: bool,
    /// Hash read chunk size
    pub read_buffer_size: usize,
    /// Output buffer capacity
    pub write_buffer_size: usize,
}

impl RunOptions {
    /// Combine parsed flags with loaded settings.
    ///
    /// # Errors
    ///
    /// Returns a usage [`ConfigError`] for invalid flag combinations.
    pub fn from_cli(cli: &Cli, config: &Config) -> Result<Self, ConfigError> {
        let mode = Mode::from_flags(cli.create, cli.null, cli.links)?;
        if cli.verbose && !mode.is_archive() {
            log::debug!("--verbose has no effect without -c");
        }
        Ok(Self {
            mode,
            paths: cli.paths.clone(),
            output: cli.output.clone(),
            verbose: cli.verbose && mode.is_archive(),
            read_buffer_size: config.read_buffer_size,
            write_buffer_size: config.write_buffer_size,
        })
    }
}
