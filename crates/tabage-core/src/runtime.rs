//! Single-consumer command loop around a [`Tracker`]
//!
//! Host events and requests from any number of producers are queued on one
//! channel and applied in arrival order by a single task, so the tracker is
//! never touched concurrently. Commands from one producer keep their order;
//! nothing is promised across producers.

use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use tabage_tabs::RegistrySnapshot;

use crate::error::CoreError;
use crate::event::HostEvent;
use crate::protocol::{Request, Response};
use crate::tracker::Tracker;
use crate::Result;

#[derive(Debug)]
pub enum Command {
    Event(HostEvent),
    Request {
        request: Request,
        reply: oneshot::Sender<Response>,
    },
    /// Reconcile only, without re-reading storage
    Reconcile,
}

/// Cloneable sender side of the runtime
#[derive(Clone)]
pub struct TrackerHandle {
    tx: mpsc::UnboundedSender<Command>,
}

impl TrackerHandle {
    pub fn send_event(&self, event: HostEvent) -> Result<()> {
        self.tx
            .send(Command::Event(event))
            .map_err(|_| CoreError::TrackerStopped)
    }

    /// Queue a reconcile pass against the host's current tabs
    pub fn reconcile(&self) -> Result<()> {
        self.tx
            .send(Command::Reconcile)
            .map_err(|_| CoreError::TrackerStopped)
    }

    /// Queue a request now and hand back the receiver for its answer.
    /// The request keeps its place relative to events sent afterwards even
    /// if the answer is awaited elsewhere.
    pub fn submit(&self, request: Request) -> Result<oneshot::Receiver<Response>> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Request { request, reply })
            .map_err(|_| CoreError::TrackerStopped)?;
        Ok(rx)
    }

    pub async fn request(&self, request: Request) -> Result<Response> {
        let rx = self.submit(request)?;
        rx.await.map_err(|_| CoreError::TrackerStopped)
    }

    pub async fn tab_ages(&self) -> Result<RegistrySnapshot> {
        match self.request(Request::GetTabAges).await? {
            Response::TabAges { tab_ages } => Ok(tab_ages),
            other => Err(unexpected(other)),
        }
    }

    pub async fn current_tab_age(&self) -> Result<u64> {
        match self.request(Request::GetCurrentTabAge).await? {
            Response::CurrentTabAge { age } => Ok(age),
            other => Err(unexpected(other)),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

fn unexpected(response: Response) -> CoreError {
    CoreError::UnexpectedResponse(format!("{response:?}"))
}

pub struct TrackerRuntime {
    tracker: Tracker,
    rx: mpsc::UnboundedReceiver<Command>,
    weak_tx: mpsc::WeakUnboundedSender<Command>,
    startup_delay: Duration,
}

impl TrackerRuntime {
    /// Spawn the command loop. The tracker is initialized (restore and
    /// reconcile) before the first command is processed. The loop ends once
    /// every [`TrackerHandle`] is dropped; queued snapshot writes are
    /// flushed before the returned task completes.
    pub fn spawn(tracker: Tracker) -> (TrackerHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let runtime = Self {
            startup_delay: tracker.config().startup_reconcile_delay(),
            tracker,
            rx,
            weak_tx: tx.downgrade(),
        };
        let task = tokio::spawn(runtime.run());
        (TrackerHandle { tx }, task)
    }

    async fn run(mut self) {
        self.tracker.initialize().await;

        while let Some(command) = self.rx.recv().await {
            match command {
                Command::Event(event) => {
                    let startup = matches!(event, HostEvent::Startup);
                    self.tracker.handle_event(event).await;
                    if startup {
                        self.schedule_reconcile();
                    }
                }
                Command::Request { request, reply } => {
                    let response = self.tracker.handle_request(request).await;
                    if reply.send(response).is_err() {
                        tracing::debug!("Requester went away before the response");
                    }
                }
                Command::Reconcile => {
                    self.tracker.reconcile().await;
                }
            }
        }

        tracing::info!("Tracker runtime stopping");
        self.tracker.shutdown().await;
    }

    /// Queue a second reconcile after the startup delay, for tabs the
    /// browser was still restoring during the first pass
    fn schedule_reconcile(&self) {
        let weak_tx = self.weak_tx.clone();
        let delay = self.startup_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(tx) = weak_tx.upgrade() {
                let _ = tx.send(Command::Reconcile);
            }
        });
    }
}
