//! Periodic current-tab age polling
//!
//! Each tick issues an independent request with its own timeout. A slow or
//! failed poll is dropped; the next tick simply asks again.

use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::Config;
use crate::error::CoreError;
use crate::runtime::TrackerHandle;

pub struct AgePoller {
    handle: TrackerHandle,
    interval: Duration,
    timeout: Duration,
}

impl AgePoller {
    pub fn new(handle: TrackerHandle, interval: Duration, timeout: Duration) -> Self {
        Self {
            handle,
            interval,
            timeout,
        }
    }

    /// Poller using the configured interval and per-request timeout
    pub fn from_config(handle: TrackerHandle, config: &Config) -> Self {
        Self::new(handle, config.poll_interval(), config.poll_timeout())
    }

    /// Start polling. The receiver holds the latest age seen, `None` until
    /// the first successful poll. Polling stops when every receiver is
    /// dropped or the tracker stops.
    pub fn spawn(self) -> (watch::Receiver<Option<u64>>, JoinHandle<()>) {
        let (tx, rx) = watch::channel(None);
        let task = tokio::spawn(self.run(tx));
        (rx, task)
    }

    async fn run(self, tx: watch::Sender<Option<u64>>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = tx.closed() => break,
            }

            match tokio::time::timeout(self.timeout, self.handle.current_tab_age()).await {
                Ok(Ok(age)) => {
                    tx.send_replace(Some(age));
                }
                Ok(Err(CoreError::TrackerStopped)) => {
                    tracing::debug!("Tracker stopped, ending age poller");
                    break;
                }
                Ok(Err(e)) => tracing::debug!(error = %e, "Age poll failed"),
                Err(_) => tracing::debug!("Age poll timed out"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::Config;
    use crate::event::HostEvent;
    use crate::host::MirrorHost;
    use crate::runtime::TrackerRuntime;
    use crate::tracker::Tracker;
    use std::sync::Arc;
    use tabage_tabs::{MemoryStore, OpenTab};

    #[tokio::test(start_paused = true)]
    async fn test_poller_publishes_latest_age() {
        let host = Arc::new(MirrorHost::new());
        let clock = Arc::new(ManualClock::new(0));
        let tracker = Tracker::new(
            host.clone(),
            Arc::new(MemoryStore::new()),
            clock.clone(),
            Config::new(std::env::temp_dir()),
        );
        let (handle, runtime_task) = TrackerRuntime::spawn(tracker);

        let tab = OpenTab::new(1).activated();
        host.upsert(tab.clone());
        handle.send_event(HostEvent::TabCreated { tab }).unwrap();

        let poller = AgePoller::from_config(handle.clone(), &Config::new(std::env::temp_dir()));
        assert_eq!(poller.interval, Duration::from_secs(30));
        assert_eq!(poller.timeout, Duration::from_secs(5));
        let (mut ages, poll_task) = poller.spawn();

        // First tick fires immediately
        ages.changed().await.unwrap();
        assert_eq!(*ages.borrow(), Some(0));

        clock.set(30_000);
        ages.changed().await.unwrap();
        assert_eq!(*ages.borrow_and_update(), Some(30_000));

        drop(ages);
        poll_task.await.unwrap();

        drop(handle);
        runtime_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_poller_stops_with_tracker() {
        let tracker = Tracker::new(
            Arc::new(MirrorHost::new()),
            Arc::new(MemoryStore::new()),
            Arc::new(ManualClock::new(0)),
            Config::new(std::env::temp_dir()),
        );
        let (handle, runtime_task) = TrackerRuntime::spawn(tracker);
        runtime_task.abort();
        let _ = runtime_task.await;

        let poller = AgePoller::new(handle, Duration::from_millis(10), Duration::from_secs(1));
        let (_ages, poll_task) = poller.spawn();
        poll_task.await.unwrap();
    }
}
