//! Configuration validation with presence and range checks.

use crate::error::ConfigError;

use super::{Config, ENV_CONTAINER, ENV_URL};

impl Config {
    /// Validate that required values are present and others are in range.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.endpoint.trim().is_empty() {
            return Err(ConfigError::MissingEnv(ENV_URL));
        }
        if self.storage.container.trim().is_empty() {
            return Err(ConfigError::MissingEnv(ENV_CONTAINER));
        }
        let url = reqwest::Url::parse(&self.storage.endpoint).map_err(|e| {
            ConfigError::ValidationError(format!("storage.endpoint is not a valid URL: {e}"))
        })?;
        if !matches!(url.scheme(), "http" | "https" | "file") {
            return Err(ConfigError::ValidationError(format!(
                "storage.endpoint scheme must be http, https or file (got {})",
                url.scheme()
            )));
        }
        if self.storage.request_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "storage.request_timeout_ms must be > 0".into(),
            ));
        }
        if self.upload.workers == 0 {
            return Err(ConfigError::ValidationError(
                "upload.workers must be > 0".into(),
            ));
        }
        if self.upload.extensions.is_empty() {
            return Err(ConfigError::ValidationError(
                "upload.extensions must not be empty".into(),
            ));
        }
        Ok(())
    }
}
