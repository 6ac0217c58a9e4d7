//! File-backed implementation of [`McpConfigStorage`].

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use tokio::sync::Mutex;

use super::debounce::Debouncer;
use super::error::StorageError;
use super::persistence::{parse_config_map, read_config_file, write_config_file};
use super::watcher::{ChangeCheck, ChangeWatcher, WatchHandle};
use super::{ConfigMap, McpConfigStorage, ReloadTrigger, ServerConfig};
use crate::config::StoreSettings;
use crate::observability::metrics;

/// What a persistence cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Persisted,
    /// An override source is configured; the file is left alone.
    Suppressed,
    /// The write failed and was logged.
    Failed,
}

/// Configuration store mirrored to a JSON file.
///
/// Reads are served from memory. Every mutation rewrites the whole file, and
/// external edits to the file are detected and handed to the manager as a
/// `cleanup` + `reinit` pair.
pub struct FileConfigStore {
    settings: StoreSettings,
    path: PathBuf,
    configs: Arc<ArcSwap<ConfigMap>>,
    override_active: AtomicBool,
    /// Held for the whole of `init`, which serialises re-initialisation.
    watch: Mutex<Option<WatchHandle>>,
    live_watches: Arc<AtomicUsize>,
    debouncer: Arc<Debouncer>,
    write_lock: Mutex<()>,
}

impl FileConfigStore {
    pub fn new(settings: StoreSettings) -> Self {
        let path = settings.config_path();
        Self {
            settings,
            path,
            configs: Arc::new(ArcSwap::from_pointee(ConfigMap::new())),
            override_active: AtomicBool::new(false),
            watch: Mutex::new(None),
            live_watches: Arc::new(AtomicUsize::new(0)),
            debouncer: Arc::new(Debouncer::new()),
            write_lock: Mutex::new(()),
        }
    }

    /// The backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> &StoreSettings {
        &self.settings
    }

    /// Whether the last `init` loaded from a valid override payload.
    pub fn override_active(&self) -> bool {
        self.override_active.load(Ordering::SeqCst)
    }

    /// Whether a file watch is currently armed.
    pub async fn is_watching(&self) -> bool {
        self.watch.lock().await.is_some()
    }

    /// Watch handles from this store that are still alive.
    pub fn active_watches(&self) -> usize {
        self.live_watches.load(Ordering::SeqCst)
    }

    /// Stop watching and drop any pending change check.
    pub async fn close(&self) {
        if let Some(handle) = self.watch.lock().await.take() {
            handle.close();
        }
        self.debouncer.cancel();
    }

    fn override_configured(&self) -> bool {
        self.settings
            .override_source
            .as_deref()
            .is_some_and(|raw| !raw.is_empty())
    }

    /// Checked on every write, independently of how `init` went: an override
    /// in the settings or in the live environment keeps the file untouched.
    fn persistence_suppressed(&self) -> bool {
        let env_guard = self
            .settings
            .override_var
            .as_deref()
            .and_then(std::env::var_os)
            .is_some_and(|value| !value.is_empty());
        self.override_configured() || env_guard
    }

    fn replace_all(&self, map: ConfigMap) {
        metrics::record_entries(map.len());
        self.configs.store(Arc::new(map));
    }

    async fn save_to_file(&self) -> WriteOutcome {
        if self.persistence_suppressed() {
            tracing::debug!(path = %self.path.display(), "Override source set, skipping config file write");
            metrics::record_write("suppressed");
            return WriteOutcome::Suppressed;
        }

        // Snapshot under the lock so the last write always carries the latest map.
        let _guard = self.write_lock.lock().await;
        let snapshot = self.configs.load_full();

        match write_config_file(&self.path, &snapshot).await {
            Ok(()) => {
                metrics::record_write("persisted");
                WriteOutcome::Persisted
            }
            Err(e) => {
                tracing::error!("Failed to save config to file: {}", e);
                metrics::record_write("failed");
                WriteOutcome::Failed
            }
        }
    }

    /// Returns true when the override payload was applied.
    fn load_override(&self) -> bool {
        self.override_active.store(false, Ordering::SeqCst);

        let Some(raw) = self.settings.override_source.as_deref().filter(|raw| !raw.is_empty())
        else {
            return false;
        };

        match parse_config_map(raw) {
            Ok(map) => {
                tracing::info!(entries = map.len(), "Loaded MCP configs from override source");
                self.replace_all(map);
                metrics::record_load("override");
                self.override_active.store(true, Ordering::SeqCst);
                true
            }
            Err(e) => {
                tracing::error!("Invalid override config payload, falling back to file: {}", e);
                false
            }
        }
    }

    async fn load_file(&self) {
        match read_config_file(&self.path).await {
            Ok(map) => {
                tracing::info!(path = %self.path.display(), entries = map.len(), "Loaded MCP configs from file");
                self.replace_all(map);
                metrics::record_load("file");
            }
            Err(StorageError::NotFound { .. }) => {
                tracing::info!(path = %self.path.display(), "Config file not found, creating it");
                self.save_to_file().await;
            }
            Err(e) if e.is_malformed() => {
                tracing::warn!(
                    "Config file {} has invalid JSON: {}",
                    self.path.display(),
                    e
                );
            }
            Err(e) => {
                tracing::error!("Unexpected error loading config: {}", e);
            }
        }
    }

    fn arm_watcher(&self, manager: Arc<dyn ReloadTrigger>) -> Option<WatchHandle> {
        let check = ChangeCheck::new(&self.path, self.configs.clone(), manager);
        let watcher = ChangeWatcher::new(
            &self.path,
            self.settings.debounce(),
            self.debouncer.clone(),
            check,
            self.live_watches.clone(),
        );

        match watcher.spawn() {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::error!(path = %self.path.display(), "Failed to watch config file: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl McpConfigStorage for FileConfigStore {
    async fn init(&self, manager: Arc<dyn ReloadTrigger>) {
        let mut slot = self.watch.lock().await;
        if let Some(previous) = slot.take() {
            previous.close();
        }

        if self.load_override() {
            return;
        }

        self.load_file().await;

        if self.settings.watch {
            *slot = self.arm_watcher(manager);
        }
    }

    async fn load_all(&self) -> ConfigMap {
        ConfigMap::clone(&self.configs.load_full())
    }

    async fn save(&self, name: &str, config: ServerConfig) {
        self.configs.rcu(|current| {
            let mut next = ConfigMap::clone(current);
            next.insert(name.to_string(), config.clone());
            next
        });
        metrics::record_entries(self.configs.load().len());
        self.save_to_file().await;
    }

    async fn delete(&self, name: &str) {
        self.configs.rcu(|current| {
            let mut next = ConfigMap::clone(current);
            next.remove(name);
            next
        });
        metrics::record_entries(self.configs.load().len());
        self.save_to_file().await;
    }

    async fn has(&self, name: &str) -> bool {
        self.configs.load().contains_key(name)
    }
}
