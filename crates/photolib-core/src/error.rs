//! Error types for the photolib upload pipeline.
//!
//! Errors are split by boundary: configuration and crawl errors are fatal to
//! a run, pipeline errors are confined to the single item that raised them,
//! and storage errors come from the gateway and are wrapped per item.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for photolib operations.
#[derive(Error, Debug)]
pub enum PhotoLibError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Directory crawl errors
    #[error("Crawl error: {0}")]
    Crawl(#[from] CrawlError),

    /// Storage gateway construction errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required environment variable is not set
    #[error("{0} env variable not set")]
    MissingEnv(&'static str),

    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Errors that abort a crawl.
#[derive(Error, Debug)]
pub enum CrawlError {
    /// The crawl root does not exist or is not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// A directory could not be listed
    #[error("Failed to read directory {path} after queueing {queued} files: {message}")]
    Traversal {
        path: PathBuf,
        message: String,
        queued: usize,
    },

    /// The crawl task itself failed to complete
    #[error("Crawl task failed: {0}")]
    Task(String),
}

impl CrawlError {
    /// Files already queued when the crawl stopped.
    pub fn queued(&self) -> usize {
        match self {
            Self::Traversal { queued, .. } => *queued,
            Self::NotADirectory(_) | Self::Task(_) => 0,
        }
    }
}

/// Per-item pipeline errors, organized by stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The file could not be opened or inspected
    #[error("Read error for {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Hashing the file contents failed
    #[error("Hash error for {path}: {source}")]
    Hash {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A storage gateway call failed
    #[error("Storage {operation} failed for {path}: {source}")]
    Storage {
        path: PathBuf,
        operation: &'static str,
        #[source]
        source: StorageError,
    },
}

/// Storage gateway errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The request never produced a response (DNS, connect, timeout)
    #[error("Request to {url} failed: {message}")]
    Request { url: String, message: String },

    /// The service answered with a non-success status
    #[error("HTTP {status} from {url}: {message}")]
    Status {
        url: String,
        status: u16,
        message: String,
    },

    /// Key cannot be mapped onto the store
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    /// Gateway could not be constructed from configuration
    #[error("Storage configuration error: {0}")]
    Config(String),

    /// Local I/O failure (file-backed gateway, upload body)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Metadata sidecar could not be encoded or decoded
    #[error("Metadata encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience type alias for photolib results.
pub type Result<T> = std::result::Result<T, PhotoLibError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

/// Convenience type alias for storage gateway results.
pub type StorageResult<T> = std::result::Result<T, StorageError>;
