//! Tracker configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tabage_tabs::listing::DEFAULT_OLD_TAB_THRESHOLD_MS;
use tabage_tabs::DEFAULT_STORAGE_KEY;

use crate::error::CoreError;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the database file
    pub database_path: PathBuf,
    /// Key the registry snapshot is stored under
    pub storage_key: String,
    /// Delay before the extra reconcile that follows a startup notification
    pub startup_reconcile_delay_ms: u64,
    /// Interval of the current-tab age poller
    pub poll_interval_ms: u64,
    /// How long a single poll waits for its answer
    pub poll_timeout_ms: u64,
    /// Attempts at reading the stored snapshot before starting empty
    pub storage_read_attempts: u32,
    pub storage_read_retry_delay_ms: u64,
    /// Age above which the listing flags a tab as old
    pub old_tab_threshold_ms: u64,
}

impl Config {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            database_path: data_dir.join("tabage.db"),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            startup_reconcile_delay_ms: 1_000,
            poll_interval_ms: 30_000,
            poll_timeout_ms: 5_000,
            storage_read_attempts: 3,
            storage_read_retry_delay_ms: 50,
            old_tab_threshold_ms: DEFAULT_OLD_TAB_THRESHOLD_MS,
        }
    }

    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .map(|d| d.join("tabage"))
            .unwrap_or_else(|| PathBuf::from(".tabage"))
    }

    /// Load from a JSON file. A missing file yields the defaults; fields
    /// absent from the file keep their default values.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };

        let config: Self = serde_json::from_str(&raw)
            .map_err(|e| CoreError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.storage_key.trim().is_empty() {
            return Err(CoreError::Config("storage_key cannot be empty".to_string()));
        }
        if self.storage_read_attempts == 0 {
            return Err(CoreError::Config(
                "storage_read_attempts must be at least 1".to_string(),
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(CoreError::Config("poll_interval_ms must be positive".to_string()));
        }
        Ok(())
    }

    pub fn startup_reconcile_delay(&self) -> Duration {
        Duration::from_millis(self.startup_reconcile_delay_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    pub fn storage_read_retry_delay(&self) -> Duration {
        Duration::from_millis(self.storage_read_retry_delay_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::data_dir())
    }
}
