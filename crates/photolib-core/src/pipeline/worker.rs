//! Fixed-size pool of upload workers draining the work queue.
//!
//! Every worker pulls files until the queue is closed and empty. Failures,
//! including panics, are contained to the item that caused them.

use futures_util::future::join_all;
use futures_util::FutureExt;
use rand::Rng;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::types::{ItemOutcome, MediaFile};

use super::processor::UploadProcessor;
use super::queue::QueueReader;

/// Default number of concurrent workers.
pub const DEFAULT_WORKERS: usize = 5;

/// Counters shared by all workers of one pipeline run.
#[derive(Debug, Default)]
struct Tally {
    uploaded: AtomicU64,
    skipped: AtomicU64,
    failed: AtomicU64,
    bytes: AtomicU64,
}

/// Final counts once every worker has exited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerTally {
    pub uploaded: u64,
    pub skipped: u64,
    pub failed: u64,
    pub bytes: u64,
}

/// The upload worker pool.
pub struct UploadPipeline {
    processor: Arc<UploadProcessor>,
    workers: usize,
}

impl UploadPipeline {
    pub fn new(processor: UploadProcessor, workers: usize) -> Self {
        Self {
            processor: Arc::new(processor),
            workers: workers.max(1),
        }
    }

    /// Start all workers on `queue`. Items may arrive later; workers wait.
    pub fn spawn(&self, queue: QueueReader<MediaFile>) -> PipelineHandle {
        let tally = Arc::new(Tally::default());
        let mut rng = rand::thread_rng();
        let handles = (0..self.workers)
            .map(|_| {
                // Labels only tag log lines; collisions are harmless.
                let label = rng.gen_range(b'A'..=b'Z') as char;
                tokio::spawn(run_worker(
                    label,
                    queue.clone(),
                    Arc::clone(&self.processor),
                    Arc::clone(&tally),
                ))
            })
            .collect();

        tracing::debug!(
            "Started {} upload workers ({} storage)",
            self.workers,
            self.processor.gateway_name()
        );
        PipelineHandle { handles, tally }
    }
}

/// Running workers; await [`PipelineHandle::drain`] for completion.
pub struct PipelineHandle {
    handles: Vec<JoinHandle<()>>,
    tally: Arc<Tally>,
}

impl PipelineHandle {
    /// Wait until every worker has observed the closed, empty queue.
    pub async fn drain(self) -> WorkerTally {
        for result in join_all(self.handles).await {
            if let Err(e) = result {
                tracing::error!("Upload worker terminated abnormally: {e}");
            }
        }

        WorkerTally {
            uploaded: self.tally.uploaded.load(Ordering::Relaxed),
            skipped: self.tally.skipped.load(Ordering::Relaxed),
            failed: self.tally.failed.load(Ordering::Relaxed),
            bytes: self.tally.bytes.load(Ordering::Relaxed),
        }
    }
}

async fn run_worker(
    label: char,
    queue: QueueReader<MediaFile>,
    processor: Arc<UploadProcessor>,
    tally: Arc<Tally>,
) {
    while let Some(file) = queue.next().await {
        let result = AssertUnwindSafe(processor.process(&file))
            .catch_unwind()
            .await;

        match result {
            Ok(Ok(ItemOutcome::Uploaded { key, bytes })) => {
                tally.uploaded.fetch_add(1, Ordering::Relaxed);
                tally.bytes.fetch_add(bytes, Ordering::Relaxed);
                tracing::info!("worker {label} uploaded {key} | {bytes} bytes");
            }
            Ok(Ok(ItemOutcome::Skipped { key })) => {
                tally.skipped.fetch_add(1, Ordering::Relaxed);
                tracing::info!("File {key} exists already. Skipping.");
            }
            Ok(Err(e)) => {
                tally.failed.fetch_add(1, Ordering::Relaxed);
                tracing::error!("Error when processing {:?} - {e}", file.path);
            }
            Err(_) => {
                tally.failed.fetch_add(1, Ordering::Relaxed);
                tracing::error!("Error when processing {:?} - worker panicked", file.path);
            }
        }
    }
    tracing::debug!("worker {label} finished, queue drained");
}
