//! Configuration management for photolib.
//!
//! Settings come from three layers, later ones winning: built-in defaults,
//! an optional TOML file, and the process environment. The storage endpoint
//! and container are required and normally supplied through the environment.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable holding the storage endpoint URL.
pub const ENV_URL: &str = "PHOTO_LIB_URL";

/// Environment variable holding the container / filesystem name.
pub const ENV_CONTAINER: &str = "PHOTO_LIB_CONTAINER";

/// Environment variable toggling overwrite mode.
pub const ENV_OVERWRITE: &str = "OVERWRITE_ON";

/// The only `OVERWRITE_ON` value that enables overwriting.
pub const OVERWRITE_ENABLED: &str = "true";

/// Root configuration structure for photolib.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote store settings
    pub storage: StorageConfig,

    /// Worker pool and crawler settings
    pub upload: UploadConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the process environment and, if present, a
    /// config file (`path`, or the platform default location).
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    /// Load configuration using a custom environment lookup.
    ///
    /// An explicit `path` must exist; the default location is optional.
    pub fn load_with<F>(path: Option<&Path>, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default = Self::default_path();
                if default.exists() {
                    Self::from_file(&default)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env(env);
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file without applying the environment or validating.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Overlay environment-provided values.
    pub fn apply_env<F>(&mut self, env: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = env(ENV_URL) {
            self.storage.endpoint = url;
        }
        if let Some(container) = env(ENV_CONTAINER) {
            self.storage.container = container;
        }
        self.upload.overwrite = env(ENV_OVERWRITE).as_deref() == Some(OVERWRITE_ENABLED);
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.photolib.photolib/config.toml
    /// - Linux: ~/.config/photolib/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\photolib\config\config.toml
    ///
    /// Falls back to ~/.photolib/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "photolib", "photolib")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = shellexpand::tilde("~").into_owned();
                PathBuf::from(home).join(".photolib").join("config.toml")
            })
    }
}
