//! Closable FIFO queue shared between pipeline stages.
//!
//! Both the task queue (one writer, many readers) and the result queue
//! (many writers, one reader) are instances of this type. Closing is an
//! explicit, one-time operation on a sender handle: dropping handles never
//! closes the queue while its owner still holds a sender.

use crate::{PoolError, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counters for a queue
#[derive(Debug, Default)]
pub struct QueueStats {
    /// Items accepted by the queue
    enqueued: AtomicU64,

    /// Items handed out to a receiver
    dequeued: AtomicU64,
}

impl QueueStats {
    pub fn enqueued(&self) -> u64 {
        self.enqueued.load(Ordering::Relaxed)
    }

    pub fn dequeued(&self) -> u64 {
        self.dequeued.load(Ordering::Relaxed)
    }

    /// Items accepted but not yet received
    pub fn in_flight(&self) -> u64 {
        self.enqueued().saturating_sub(self.dequeued())
    }
}

/// Create a queue. `None` means unbounded; a bounded queue applies
/// backpressure to senders once `capacity` items are waiting.
pub fn queue<T>(name: &'static str, capacity: Option<usize>) -> (QueueSender<T>, QueueReceiver<T>) {
    let (tx, rx) = match capacity {
        Some(capacity) => async_channel::bounded(capacity.max(1)),
        None => async_channel::unbounded(),
    };
    let stats = Arc::new(QueueStats::default());

    (
        QueueSender {
            name,
            tx,
            stats: stats.clone(),
        },
        QueueReceiver { rx, stats },
    )
}

/// Writing side of a queue
#[derive(Debug)]
pub struct QueueSender<T> {
    name: &'static str,
    tx: async_channel::Sender<T>,
    stats: Arc<QueueStats>,
}

impl<T> QueueSender<T> {
    /// Submit an item, waiting for room if the queue is bounded and full
    pub async fn send(&self, item: T) -> Result<()> {
        self.tx
            .send(item)
            .await
            .map_err(|_| PoolError::QueueClosed(self.name))?;
        self.stats.enqueued.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Close the queue. Returns `false` if it was already closed.
    ///
    /// Items already queued stay readable; further sends fail.
    pub fn close(&self) -> bool {
        self.tx.close()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    pub fn stats(&self) -> &QueueStats {
        &self.stats
    }
}

impl<T> Clone for QueueSender<T> {
    fn clone(&self) -> Self {
        QueueSender {
            name: self.name,
            tx: self.tx.clone(),
            stats: self.stats.clone(),
        }
    }
}

/// Reading side of a queue; clones compete for items
#[derive(Debug)]
pub struct QueueReceiver<T> {
    rx: async_channel::Receiver<T>,
    stats: Arc<QueueStats>,
}

impl<T> QueueReceiver<T> {
    /// Wait for the next item. Returns `None` once the queue is closed and
    /// drained.
    pub async fn recv(&self) -> Option<T> {
        let item = self.rx.recv().await.ok()?;
        self.stats.dequeued.fetch_add(1, Ordering::Relaxed);
        Some(item)
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    pub fn stats(&self) -> &QueueStats {
        &self.stats
    }
}

impl<T> Clone for QueueReceiver<T> {
    fn clone(&self) -> Self {
        QueueReceiver {
            rx: self.rx.clone(),
            stats: self.stats.clone(),
        }
    }
}
