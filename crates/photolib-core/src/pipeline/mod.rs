//! Upload pipeline components.
//!
//! This module contains all the stages of the crawl-and-upload pipeline:
//! - **crawler**: Find eligible media files in a directory tree
//! - **queue**: Closable multi-consumer queue between crawler and workers
//! - **metadata**: Extract capture time and orientation from EXIF
//! - **hash**: Content digest for deduplication and addressing
//! - **key**: Derive the destination key in the object store
//! - **processor**: Per-file steps ending in a conditional upload
//! - **worker**: Fixed pool of workers draining the queue

pub mod crawler;
pub mod hash;
pub mod key;
pub mod metadata;
pub mod processor;
pub mod queue;
pub mod worker;

// Re-exports for convenient access
pub use crawler::Crawler;
pub use hash::Hasher;
pub use key::DestinationKey;
pub use metadata::MetadataExtractor;
pub use processor::{ProcessOptions, UploadProcessor};
pub use queue::{work_queue, QueueReader, QueueWriter};
pub use worker::{PipelineHandle, UploadPipeline, WorkerTally, DEFAULT_WORKERS};
