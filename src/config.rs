//! Layered application configuration.
//!
//! Settings are resolved from, lowest priority first:
//!
//! 1. Built-in defaults ([`Config::default`])
//! 2. A TOML file: `--config <FILE>`, else `config.toml` in the platform
//!    config directory (e.g. `~/.config/dupscan/config.toml`)
//! 3. Environment variables prefixed `DUPSCAN_` (e.g. `DUPSCAN_IO_THREADS=4`)
//! 4. Command-line flags ([`Config::merge_cli`])
//!
//! ```toml
//! algorithm = "sha256"
//! chunk_size = 65536
//! io_threads = 4
//! skip_hidden = true
//! ignore_patterns = ["target/", "*.tmp"]
//! report_name = "dupes.csv"
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::cli::Cli;
use crate::duplicates::FinderConfig;
use crate::scanner::{HashAlgorithm, WalkerConfig, DEFAULT_CHUNK_SIZE};

/// Prefix of the environment variables read into [`Config`].
pub const ENV_PREFIX: &str = "DUPSCAN_";

/// Report file name used when no output path is given.
pub const DEFAULT_REPORT_NAME: &str = "duplicates_report.csv";

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// A source could not be parsed or holds a value of the wrong type.
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Invalid(Box::new(err))
    }
}

/// Resolved scan settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Content digest algorithm.
    pub algorithm: HashAlgorithm,
    /// Read chunk size in bytes.
    pub chunk_size: usize,
    /// Hashing threads; `1` is sequential.
    pub io_threads: usize,
    /// Byte-by-byte verification of digest matches.
    pub verify: bool,
    /// Skip dot files and directories.
    pub skip_hidden: bool,
    /// Honour the scan root's `.gitignore`.
    pub respect_gitignore: bool,
    /// Gitignore-style ignore patterns.
    pub ignore_patterns: Vec<String>,
    /// File name of the report written into the scan root.
    pub report_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithm::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            io_threads: 1,
            verify: false,
            skip_hidden: false,
            respect_gitignore: false,
            ignore_patterns: Vec::new(),
            report_name: DEFAULT_REPORT_NAME.to_string(),
        }
    }
}

impl Config {
    /// Load defaults, the config file and the environment.
    ///
    /// With `explicit` set, that file must exist. Otherwise the platform
    /// default file is used when present.
    ///
    /// # Errors
    ///
    /// [`ConfigError::NotFound`] for a missing explicit file and
    /// [`ConfigError::Invalid`] for malformed TOML or bad values.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match explicit {
            Some(path) if !path.is_file() => {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_path().filter(|p| p.is_file()),
        };

        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(ref path) = file {
            log::debug!("Loading config from {}", path.display());
            figment = figment.merge(Toml::file(path));
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX));

        Ok(figment.extract()?)
    }

    /// Load defaults plus one TOML file, ignoring the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the file cannot be parsed.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .extract()?;
        Ok(config)
    }

    /// Platform-specific location of `config.toml`.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "dupscan", "dupscan")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Apply the flags given on the command line.
    ///
    /// Unset options leave the loaded value alone. Each boolean setting has
    /// a `--flag` / `--no-flag` pair. Ignore patterns are appended.
    pub fn merge_cli(&mut self, cli: &Cli) {
        if let Some(algorithm) = cli.algorithm {
            self.algorithm = algorithm;
        }
        if let Some(chunk_size) = cli.chunk_size {
            self.chunk_size = chunk_size;
        }
        if let Some(threads) = cli.io_threads {
            self.io_threads = usize::from(threads);
        }
        apply_switch(&mut self.verify, cli.verify, cli.no_verify);
        apply_switch(&mut self.skip_hidden, cli.skip_hidden, cli.no_skip_hidden);
        apply_switch(&mut self.respect_gitignore, cli.gitignore, cli.no_gitignore);
        self.ignore_patterns
            .extend(cli.ignore_patterns.iter().cloned());
    }

    /// Walker settings derived from this config.
    #[must_use]
    pub fn walker_config(&self) -> WalkerConfig {
        WalkerConfig {
            skip_hidden: self.skip_hidden,
            respect_gitignore: self.respect_gitignore,
            ignore_patterns: self.ignore_patterns.clone(),
            ..WalkerConfig::default()
        }
    }

    /// Finder settings derived from this config.
    ///
    /// Shutdown flag and progress callback are left for the caller.
    #[must_use]
    pub fn finder_config(&self) -> FinderConfig {
        FinderConfig::default()
            .with_algorithm(self.algorithm)
            .with_chunk_size(self.chunk_size)
            .with_io_threads(self.io_threads)
            .with_verify(self.verify)
            .with_walker_config(self.walker_config())
    }
}

/// Apply a `--flag` / `--no-flag` pair. clap keeps only the last of the two.
fn apply_switch(setting: &mut bool, on: bool, off: bool) {
    if on {
        *setting = true;
    } else if off {
        *setting = false;
    }
}
