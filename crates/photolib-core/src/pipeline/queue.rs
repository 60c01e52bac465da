//! Closable multi-consumer work queue between the crawler and the workers.
//!
//! Built on an unbounded tokio channel. The receiving half is shared behind
//! an async mutex so any number of workers can pull from it; once the writer
//! is closed and the buffer is empty every reader observes `None`.

use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

/// Create a queue pair. The writer is the single producer.
pub fn work_queue<T>() -> (QueueWriter<T>, QueueReader<T>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        QueueWriter { tx },
        QueueReader {
            rx: Arc::new(Mutex::new(rx)),
        },
    )
}

/// Producing half of the queue.
pub struct QueueWriter<T> {
    tx: mpsc::UnboundedSender<T>,
}

impl<T> QueueWriter<T> {
    /// Append an item. Never blocks.
    ///
    /// Returns `false` if every reader has been dropped.
    pub fn push(&self, item: T) -> bool {
        self.tx.send(item).is_ok()
    }

    /// Mark the queue closed for writing. Buffered items remain readable.
    pub fn close(self) {
        drop(self.tx);
    }
}

/// Consuming half of the queue, cloneable across workers.
pub struct QueueReader<T> {
    rx: Arc<Mutex<mpsc::UnboundedReceiver<T>>>,
}

impl<T> Clone for QueueReader<T> {
    fn clone(&self) -> Self {
        Self {
            rx: Arc::clone(&self.rx),
        }
    }
}

impl<T> QueueReader<T> {
    /// Wait for the next item.
    ///
    /// Suspends while the queue is empty and open; returns `None` once it is
    /// closed and drained.
    pub async fn next(&self) -> Option<T> {
        self.rx.lock().await.recv().await
    }

    /// Take an item if one is immediately available.
    pub fn try_next(&self) -> Option<T> {
        let mut rx = self.rx.try_lock().ok()?;
        rx.try_recv().ok()
    }
}
