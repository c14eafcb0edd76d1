//! Tab Age Tracker - native messaging host
//!
//! The browser extension forwards tab events and popup/page requests over
//! stdin using the native messaging framing; answers go back over stdout.
//! Logs go to stderr.

mod message;
mod native;
mod state;

use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;

use tabage_core::{Clock, Config, Database, DatabaseStore, SnapshotStore, SystemClock};

pub use message::{Inbound, InboundEvent, MessageError};
pub use native::{read_frame, write_frame, FrameError, MAX_MESSAGE_SIZE};
pub use state::AppState;

pub struct App {
    config: Config,
    store: Arc<dyn SnapshotStore>,
    clock: Arc<dyn Clock>,
}

impl App {
    /// Open the configured database and use the system clock
    pub fn new(config: Config) -> tabage_core::Result<Self> {
        config.validate()?;
        let db = Database::open(&config.database_path)?;
        let store = DatabaseStore::with_key(db, config.storage_key.clone());
        Ok(Self::with_parts(config, Arc::new(store), Arc::new(SystemClock)))
    }

    pub fn with_parts(
        config: Config,
        store: Arc<dyn SnapshotStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            store,
            clock,
        }
    }

    /// Serve until the reader reaches EOF. Pending snapshot writes and
    /// responses are flushed before returning.
    pub async fn serve<R, W>(self, mut reader: R, writer: W) -> anyhow::Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let writer_task = tokio::spawn(write_loop(writer, out_rx));
        let mut state = AppState::new(self.store, self.clock, self.config, out_tx);

        let result = loop {
            let frame = match native::read_frame(&mut reader).await {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    tracing::info!("Extension disconnected");
                    break Ok(());
                }
                Err(e) => {
                    tracing::error!(error = %e, "Cannot read from extension");
                    break Err(e);
                }
            };

            match Inbound::parse(&frame) {
                Ok(inbound) => state.dispatch(inbound),
                Err(e) => tracing::warn!(error = %e, "Skipping malformed message"),
            }
        };

        // Dropping the state's sender lets the writer finish once in-flight
        // responses are out
        state.shutdown().await;
        writer_task.await??;
        result?;
        Ok(())
    }
}

async fn write_loop<W>(mut writer: W, mut rx: mpsc::UnboundedReceiver<Vec<u8>>) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(frame) = rx.recv().await {
        match native::write_frame(&mut writer, &frame).await {
            Ok(()) => {}
            Err(FrameError::TooLarge(size)) => {
                tracing::error!(size, "Dropping outbound frame over the size limit");
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}
