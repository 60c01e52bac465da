//! Photolib Core - content-addressed media library uploader.
//!
//! Photolib crawls a local directory tree, deduplicates media files by
//! content, and uploads each unique file once to a hierarchical object store
//! under a key derived from its capture date and content digest.
//!
//! # Architecture
//!
//! A single crawler feeds an unbounded queue drained by a fixed pool of
//! upload workers:
//!
//! ```text
//! Directory → Crawler → Queue → N workers → Metadata → Hash → Key → Storage
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use photolib_core::{Config, PhotoLib};
//!
//! #[tokio::main]
//! async fn main() -> photolib_core::Result<()> {
//!     let config = Config::load(None)?;
//!     let photolib = PhotoLib::from_config(config)?;
//!
//!     let summary = photolib.run("./Pictures".as_ref()).await?;
//!     println!("Uploaded {} files", summary.uploaded);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod pipeline;
pub mod storage;
pub mod types;

// Re-exports for convenient access
pub use config::Config;
pub use error::{
    ConfigError, CrawlError, PhotoLibError, PipelineError, PipelineResult, Result, StorageError,
};
pub use pipeline::{Crawler, DestinationKey, Hasher, MetadataExtractor, UploadPipeline};
pub use storage::{gateway_from_config, StorageGateway};
pub use types::{CaptureMetadata, ContentDigest, MediaFile, Orientation, RunSummary};

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use pipeline::{work_queue, ProcessOptions, UploadProcessor};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Photolib orchestrator - wires the crawler to the upload workers.
pub struct PhotoLib {
    config: Config,
    gateway: Arc<dyn StorageGateway>,
}

impl PhotoLib {
    /// Create an orchestrator with an explicit storage gateway.
    pub fn new(config: Config, gateway: Arc<dyn StorageGateway>) -> Self {
        tracing::debug!("Initializing photolib v{}", VERSION);
        Self { config, gateway }
    }

    /// Create an orchestrator with the gateway selected by the config.
    pub fn from_config(config: Config) -> Result<Self> {
        let gateway = gateway_from_config(&config.storage)?;
        Ok(Self::new(config, gateway))
    }

    /// Get a reference to the current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Crawl `root` and upload every eligible file.
    ///
    /// Workers start before the crawl and drain the queue concurrently. The
    /// queue is closed once the crawl returns; this call returns after every
    /// worker has exited. Per-file failures are logged and counted, never
    /// returned. A crawl failure is returned once in-flight work has drained.
    pub async fn run(&self, root: &Path) -> Result<RunSummary> {
        let start = Instant::now();
        if !root.is_dir() {
            return Err(CrawlError::NotADirectory(root.to_path_buf()).into());
        }

        let (writer, reader) = work_queue();
        let processor = UploadProcessor::new(
            Arc::clone(&self.gateway),
            ProcessOptions::from(&self.config.upload),
        );
        let workers = UploadPipeline::new(processor, self.config.upload.workers).spawn(reader);

        tracing::info!("Starting directory crawl of {:?}", root);
        let crawler = Crawler::new(&self.config.upload);
        let crawl_root = root.to_path_buf();
        let crawl = tokio::task::spawn_blocking(move || {
            let result = crawler.crawl(&crawl_root, &writer);
            writer.close();
            result
        })
        .await
        .unwrap_or_else(|e| Err(CrawlError::Task(e.to_string())));

        let discovered = match &crawl {
            Ok(count) => {
                tracing::info!("Crawl done, found {count} files");
                *count as u64
            }
            Err(e) => {
                tracing::error!("Crawl failed: {e}, waiting for queued uploads to finish");
                e.queued() as u64
            }
        };

        let tally = workers.drain().await;
        let summary = RunSummary {
            discovered,
            uploaded: tally.uploaded,
            skipped: tally.skipped,
            failed: tally.failed,
            bytes_uploaded: tally.bytes,
            elapsed: start.elapsed(),
        };

        tracing::info!(
            "Done: {} of {} files uploaded, {} skipped, {} failed ({} bytes) in {:.1?}",
            summary.uploaded,
            summary.discovered,
            summary.skipped,
            summary.failed,
            summary.bytes_uploaded,
            summary.elapsed
        );
        crawl?;
        Ok(summary)
    }
}
