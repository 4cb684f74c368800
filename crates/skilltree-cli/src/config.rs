// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Settings remembered between `skilltree` invocations.
//!
//! One JSON file, `skilltree.json`, in the platform config directory
//! (`~/.config/skilltree` on Linux) or in `$SKILLTREE_CONFIG_DIR`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Overrides the config directory (used by tests and portable installs).
pub const CONFIG_DIR_ENV: &str = "SKILLTREE_CONFIG_DIR";

const CONFIG_FILE: &str = "skilltree.json";

/// Why the settings file could not be read or written.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Neither the platform nor the environment names a config directory.
    #[error("no config directory for this user; set {CONFIG_DIR_ENV}")]
    NoConfigDir,
    /// The settings file or its directory could not be read or written.
    #[error("config file {}: {source}", .path.display())]
    Io {
        /// Settings file.
        path: PathBuf,
        /// Underlying failure.
        source: io::Error,
    },
    /// The settings file holds something other than settings JSON.
    #[error("config file {} is not valid JSON: {source}", .path.display())]
    Json {
        /// Settings file.
        path: PathBuf,
        /// Decode failure.
        source: serde_json::Error,
    },
}

/// Settings remembered between invocations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Catalog used when `--catalog` is not given.
    pub catalog: Option<PathBuf>,
    /// Log filter used when neither `--log` nor `RUST_LOG` is set.
    pub log_filter: String,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            catalog: None,
            log_filter: "warn".into(),
        }
    }
}

impl CliConfig {
    /// Where the settings file lives.
    pub fn path() -> Result<PathBuf, ConfigError> {
        let dir = match std::env::var_os(CONFIG_DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => ProjectDirs::from("dev", "flyingrobots", "skilltree")
                .ok_or(ConfigError::NoConfigDir)?
                .config_dir()
                .to_path_buf(),
        };
        Ok(dir.join(CONFIG_FILE))
    }

    /// Settings from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Saves to the default location and returns the file written.
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = Self::path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Settings stored at `path`; defaults when the file is missing or empty.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_owned(),
                    source,
                })
            }
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(&bytes).map_err(|source| ConfigError::Json {
            path: path.to_owned(),
            source,
        })
    }

    /// Writes pretty JSON to `path`, creating its directory.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let io_error = |source| ConfigError::Io {
            path: path.to_owned(),
            source,
        };
        let mut text = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Json {
            path: path.to_owned(),
            source,
        })?;
        text.push('\n');
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(io_error)?;
        }
        fs::write(path, text).map_err(io_error)
    }
}
