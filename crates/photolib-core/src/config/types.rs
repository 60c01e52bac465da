//! Sub-configuration structs with their defaults.

use serde::Deserialize;

/// Media types the crawler queues when no list is configured.
pub const DEFAULT_EXTENSIONS: [&str; 7] = ["jpeg", "jpg", "mov", "heic", "png", "mp4", "mpeg"];

/// Remote object store settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Storage endpoint URL (`https://<account>.dfs.core.windows.net` or `file:///path`)
    pub endpoint: String,

    /// Container / filesystem name inside the store
    pub container: String,

    /// Per-request timeout in milliseconds
    pub request_timeout_ms: u64,

    /// Max retry attempts for transient transport failures
    pub retry_attempts: u32,

    /// Base delay between retries in milliseconds
    pub retry_delay_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            container: String::new(),
            request_timeout_ms: 300_000,
            retry_attempts: 3,
            retry_delay_ms: 1000,
        }
    }
}

/// Upload pipeline settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Number of concurrent upload workers
    pub workers: usize,

    /// Replace objects that already exist at the destination key.
    /// Only ever set from the `OVERWRITE_ON` environment variable.
    #[serde(skip)]
    pub overwrite: bool,

    /// Eligible file extensions (lowercase, no leading dot)
    pub extensions: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            workers: 5,
            overwrite: false,
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
