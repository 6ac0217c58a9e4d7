//! Backing file watcher for live reload.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::debounce::Debouncer;
use super::error::StorageError;
use super::persistence::read_config_file;
use super::{ConfigMap, ReloadTrigger};
use crate::observability::metrics;

/// Result of one debounced comparison between disk and memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// File content equals the in-memory map; nothing to do.
    Unchanged,
    /// The file differed and the reload hooks ran.
    Reloaded,
    /// Reading, parsing or a reload hook failed; logged and dropped.
    Failed,
}

/// The debounced handler: compare the file with memory, reload on difference.
///
/// Holds the trigger strongly for as long as the watch is armed; the next
/// `init` or `close` releases it.
#[derive(Clone)]
pub struct ChangeCheck {
    path: PathBuf,
    configs: Arc<ArcSwap<ConfigMap>>,
    trigger: Arc<dyn ReloadTrigger>,
}

impl ChangeCheck {
    pub fn new(
        path: &Path,
        configs: Arc<ArcSwap<ConfigMap>>,
        trigger: Arc<dyn ReloadTrigger>,
    ) -> Self {
        Self {
            path: path.to_path_buf(),
            configs,
            trigger,
        }
    }

    pub async fn run(self) -> CheckOutcome {
        let on_disk = match read_config_file(&self.path).await {
            Ok(map) => map,
            Err(e) => {
                tracing::error!(path = %self.path.display(), "Error detecting config file change: {}", e);
                metrics::record_change_check("error");
                return CheckOutcome::Failed;
            }
        };

        // Our own writes land here too; they match memory and are dropped.
        if on_disk == **self.configs.load() {
            tracing::debug!(path = %self.path.display(), "Config file unchanged, ignoring event");
            metrics::record_change_check("unchanged");
            return CheckOutcome::Unchanged;
        }

        tracing::info!(path = %self.path.display(), "Config file changed externally, reloading...");
        metrics::record_change_check("changed");

        if let Err(e) = self.trigger.cleanup().await {
            tracing::error!("Reload cleanup failed: {}", e);
            return CheckOutcome::Failed;
        }
        if let Err(e) = self.trigger.reinit().await {
            tracing::error!("Reload init failed: {}", e);
            return CheckOutcome::Failed;
        }
        CheckOutcome::Reloaded
    }
}

/// Watches one backing file and feeds change bursts into a debouncer.
pub struct ChangeWatcher {
    path: PathBuf,
    delay: Duration,
    debouncer: Arc<Debouncer>,
    check: ChangeCheck,
    live: Arc<AtomicUsize>,
}

impl ChangeWatcher {
    /// `live` counts the handles spawned from it that are still alive.
    pub fn new(
        path: &Path,
        delay: Duration,
        debouncer: Arc<Debouncer>,
        check: ChangeCheck,
        live: Arc<AtomicUsize>,
    ) -> Self {
        Self {
            path: path.to_path_buf(),
            delay,
            debouncer,
            check,
            live,
        }
    }

    /// Start watching. Must be called from within a Tokio runtime.
    ///
    /// The parent directory is watched so the watch survives editors that
    /// save by replacing the file; events for other entries are filtered out.
    pub fn spawn(self) -> Result<WatchHandle, StorageError> {
        let file_name = self.path.file_name().map(|n| n.to_os_string()).ok_or_else(|| {
            StorageError::Io {
                path: self.path.clone(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "config path has no file name",
                ),
            }
        })?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let (tx, mut rx) = mpsc::unbounded_channel::<()>();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    let relevant = event.kind.is_modify() || event.kind.is_create();
                    let ours = event
                        .paths
                        .iter()
                        .any(|p| p.file_name() == Some(file_name.as_os_str()));
                    if relevant && ours {
                        let _ = tx.send(());
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        let ChangeWatcher {
            path,
            delay,
            debouncer,
            check,
            live,
        } = self;

        let forwarder = tokio::spawn(async move {
            while rx.recv().await.is_some() {
                let check = check.clone();
                debouncer.schedule(delay, move || async move {
                    check.run().await;
                });
            }
        });

        live.fetch_add(1, Ordering::SeqCst);
        tracing::info!(path = %path.display(), "Config watcher started");
        Ok(WatchHandle {
            _watcher: watcher,
            forwarder,
            path,
            live,
        })
    }
}

/// A live watch. Dropping it stops the watch.
pub struct WatchHandle {
    _watcher: RecommendedWatcher,
    forwarder: JoinHandle<()>,
    path: PathBuf,
    live: Arc<AtomicUsize>,
}

impl WatchHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stop watching.
    pub fn close(self) {
        tracing::debug!(path = %self.path.display(), "Config watcher stopped");
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.forwarder.abort();
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::persistence::write_config_file;
    use crate::storage::ReloadError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::AtomicU32;

    #[derive(Default)]
    struct Counting {
        cleanups: AtomicU32,
        inits: AtomicU32,
    }

    #[async_trait]
    impl ReloadTrigger for Counting {
        async fn cleanup(&self) -> Result<(), ReloadError> {
            self.cleanups.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn reinit(&self) -> Result<(), ReloadError> {
            self.inits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Forward(Arc<Counting>);

    #[async_trait]
    impl ReloadTrigger for Forward {
        async fn cleanup(&self) -> Result<(), ReloadError> {
            self.0.cleanup().await
        }

        async fn reinit(&self) -> Result<(), ReloadError> {
            self.0.reinit().await
        }
    }

    struct FailingCleanup;

    #[async_trait]
    impl ReloadTrigger for FailingCleanup {
        async fn cleanup(&self) -> Result<(), ReloadError> {
            Err("manager busy".into())
        }

        async fn reinit(&self) -> Result<(), ReloadError> {
            panic!("reinit must not run after a failed cleanup");
        }
    }

    fn map_of(name: &str, value: serde_json::Value) -> ConfigMap {
        let mut map = ConfigMap::new();
        map.insert(name.to_string(), value);
        map
    }

    #[tokio::test]
    async fn test_check_ignores_matching_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mcp.json");
        let map = map_of("a", json!({"command": "a"}));
        write_config_file(&path, &map).await.unwrap();

        let trigger: Arc<dyn ReloadTrigger> = Arc::new(Counting::default());
        let configs = Arc::new(ArcSwap::from_pointee(map));
        let check = ChangeCheck::new(&path, configs, trigger);

        assert_eq!(check.run().await, CheckOutcome::Unchanged);
    }

    #[tokio::test]
    async fn test_check_reloads_on_difference() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mcp.json");
        write_config_file(&path, &ConfigMap::new()).await.unwrap();

        let counting = Arc::new(Counting::default());
        let trigger: Arc<dyn ReloadTrigger> = counting.clone();
        let configs = Arc::new(ArcSwap::from_pointee(map_of("a", json!({}))));
        let check = ChangeCheck::new(&path, configs, trigger);

        assert_eq!(check.run().await, CheckOutcome::Reloaded);
        assert_eq!(counting.cleanups.load(Ordering::SeqCst), 1);
        assert_eq!(counting.inits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_check_swallows_bad_content_and_failed_hooks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mcp.json");
        tokio::fs::write(&path, "{ not json").await.unwrap();

        let trigger: Arc<dyn ReloadTrigger> = Arc::new(FailingCleanup);
        let configs = Arc::new(ArcSwap::from_pointee(ConfigMap::new()));
        let check = ChangeCheck::new(&path, configs.clone(), trigger);
        assert_eq!(check.clone().run().await, CheckOutcome::Failed);

        tokio::fs::write(&path, r#"{"b": {}}"#).await.unwrap();
        assert_eq!(check.run().await, CheckOutcome::Failed);
    }

    #[tokio::test]
    async fn test_check_owns_its_trigger() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mcp.json");
        write_config_file(&path, &map_of("a", json!(1))).await.unwrap();

        let counting = Arc::new(Counting::default());
        let check = {
            // The check keeps the only strong handle once this scope ends.
            let trigger: Arc<dyn ReloadTrigger> = Arc::new(Forward(counting.clone()));
            let configs = Arc::new(ArcSwap::from_pointee(ConfigMap::new()));
            ChangeCheck::new(&path, configs, trigger)
        };

        assert_eq!(check.run().await, CheckOutcome::Reloaded);
        assert_eq!(counting.cleanups.load(Ordering::SeqCst), 1);
        assert_eq!(counting.inits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_live_count_follows_handles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mcp.json");
        write_config_file(&path, &ConfigMap::new()).await.unwrap();

        let live = Arc::new(AtomicUsize::new(0));
        let debouncer = Arc::new(Debouncer::new());
        let spawn = || {
            let trigger: Arc<dyn ReloadTrigger> = Arc::new(Counting::default());
            let configs = Arc::new(ArcSwap::from_pointee(ConfigMap::new()));
            let check = ChangeCheck::new(&path, configs, trigger);
            ChangeWatcher::new(&path, Duration::from_millis(50), debouncer.clone(), check, live.clone())
                .spawn()
                .unwrap()
        };

        let first = spawn();
        let second = spawn();
        assert_eq!(live.load(Ordering::SeqCst), 2);

        first.close();
        assert_eq!(live.load(Ordering::SeqCst), 1);
        drop(second);
        assert_eq!(live.load(Ordering::SeqCst), 0);
    }
}
