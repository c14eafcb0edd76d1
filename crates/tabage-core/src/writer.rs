//! Fire-and-forget snapshot persistence
//!
//! Snapshots are queued to a background task that writes them in order.
//! Only the newest queued snapshot is written when several are waiting.
//! Write failures are logged and dropped.

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use tabage_tabs::{RegistrySnapshot, SnapshotStore};

enum Job {
    Write(RegistrySnapshot),
    /// Acknowledged once every earlier write has reached the store
    Flush(oneshot::Sender<()>),
}

pub struct SnapshotWriter {
    tx: mpsc::UnboundedSender<Job>,
    task: JoinHandle<()>,
}

impl SnapshotWriter {
    /// Start the writer task. Must be called inside a tokio runtime.
    pub fn spawn(store: Arc<dyn SnapshotStore>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(write_loop(store, rx));
        Self { tx, task }
    }

    /// Queue a snapshot for writing. Never blocks and never fails.
    pub fn submit(&self, snapshot: RegistrySnapshot) {
        if self.tx.send(Job::Write(snapshot)).is_err() {
            tracing::warn!("Snapshot writer stopped, dropping write");
        }
    }

    /// Wait until every snapshot submitted so far has been written (or has
    /// failed and been logged).
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.tx.send(Job::Flush(done)).is_err() {
            tracing::warn!("Snapshot writer stopped, nothing to flush");
            return;
        }
        if wait.await.is_err() {
            tracing::warn!("Snapshot writer stopped during flush");
        }
    }

    /// Stop accepting snapshots and wait until queued ones are written
    pub async fn close(self) {
        let Self { tx, task } = self;
        drop(tx);
        if let Err(e) = task.await {
            tracing::warn!(error = %e, "Snapshot writer task failed");
        }
    }
}

async fn write_loop(
    store: Arc<dyn SnapshotStore>,
    mut rx: mpsc::UnboundedReceiver<Job>,
) {
    while let Some(job) = rx.recv().await {
        let mut latest = None;
        let mut waiters = Vec::new();
        let mut next = Some(job);

        // A newer snapshot supersedes older ones, so writing only the
        // newest also satisfies any flush queued in between
        while let Some(job) = next {
            match job {
                Job::Write(snapshot) => latest = Some(snapshot),
                Job::Flush(done) => waiters.push(done),
            }
            next = rx.try_recv().ok();
        }

        if let Some(snapshot) = latest {
            write(&store, snapshot).await;
        }
        for done in waiters {
            let _ = done.send(());
        }
    }

    tracing::debug!("Snapshot writer drained");
}

async fn write(store: &Arc<dyn SnapshotStore>, snapshot: RegistrySnapshot) {
    let entries = snapshot.len();
    let store = Arc::clone(store);
    let result = tokio::task::spawn_blocking(move || store.save(&snapshot)).await;

    match result {
        Ok(Ok(())) => tracing::trace!(entries, "Persisted tab registry"),
        Ok(Err(e)) => tracing::warn!(error = %e, "Failed to persist tab registry"),
        Err(e) => tracing::warn!(error = %e, "Persist task failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabage_tabs::{MemoryStore, TabId, TabRecord};

    fn snapshot(n: i64) -> RegistrySnapshot {
        (0..n)
            .map(|i| (TabId(i), TabRecord::new(i, None, None)))
            .collect()
    }

    #[tokio::test]
    async fn test_close_drains_queue() {
        let store = Arc::new(MemoryStore::new());
        let writer = SnapshotWriter::spawn(store.clone());

        writer.submit(snapshot(1));
        writer.submit(snapshot(2));
        writer.submit(snapshot(3));
        writer.close().await;

        assert_eq!(store.current(), Some(snapshot(3)));
        assert!(store.save_count() >= 1);
    }

    #[tokio::test]
    async fn test_write_failures_are_swallowed() {
        let store = Arc::new(MemoryStore::new());
        store.set_fail_writes(true);
        let writer = SnapshotWriter::spawn(store.clone());

        writer.submit(snapshot(1));
        writer.close().await;

        assert_eq!(store.current(), None);
        assert_eq!(store.save_count(), 0);
    }

    #[tokio::test]
    async fn test_flush_waits_for_queued_writes() {
        let store = Arc::new(MemoryStore::new());
        let writer = SnapshotWriter::spawn(store.clone());

        writer.flush().await;
        assert_eq!(store.current(), None);

        writer.submit(snapshot(1));
        writer.submit(snapshot(4));
        writer.flush().await;
        assert_eq!(store.current(), Some(snapshot(4)));

        writer.submit(snapshot(2));
        writer.flush().await;
        assert_eq!(store.current(), Some(snapshot(2)));

        writer.close().await;
    }
}
