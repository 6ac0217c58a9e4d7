//! Shared utilities for storage integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use async_trait::async_trait;
use mcp_config_store::config::StoreSettings;
use mcp_config_store::storage::{FileConfigStore, McpConfigStorage, ReloadError, ReloadTrigger};

/// Debounce window used by watching tests.
pub const DEBOUNCE: Duration = Duration::from_millis(100);

/// Name of the backing file inside a test directory.
pub const FILE_NAME: &str = "mcp.json";

/// A watching store on `<dir>/mcp.json` with a short debounce.
pub fn store_in(dir: &Path) -> Arc<FileConfigStore> {
    let settings = StoreSettings::for_path(dir.join(FILE_NAME)).with_debounce(DEBOUNCE);
    Arc::new(FileConfigStore::new(settings))
}

/// Manager stand-in that records hook calls and re-initialises the store the
/// way a real manager would.
pub struct RecordingTrigger {
    store: Arc<FileConfigStore>,
    this: Weak<RecordingTrigger>,
    calls: Mutex<Vec<&'static str>>,
}

impl RecordingTrigger {
    pub fn new(store: Arc<FileConfigStore>) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            store,
            this: this.clone(),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// `store.init(self)`.
    pub async fn init_store(&self) {
        let this = self.this.upgrade().expect("trigger alive");
        self.store.init(this).await;
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, hook: &str) -> usize {
        self.calls().iter().filter(|c| **c == hook).count()
    }
}

#[async_trait]
impl ReloadTrigger for RecordingTrigger {
    async fn cleanup(&self) -> Result<(), ReloadError> {
        self.calls.lock().unwrap().push("cleanup");
        Ok(())
    }

    async fn reinit(&self) -> Result<(), ReloadError> {
        self.calls.lock().unwrap().push("init");
        self.init_store().await;
        Ok(())
    }
}

/// Poll `condition` until it holds or `timeout` passes.
pub async fn wait_until<F>(timeout: Duration, condition: F) -> bool
where
    F: Fn() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    condition()
}

/// Long enough for any pending debounced check to have run.
pub async fn settle() {
    tokio::time::sleep(DEBOUNCE * 5).await;
}
