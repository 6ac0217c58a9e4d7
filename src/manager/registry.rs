//! Registry of active server configurations.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use arc_swap::ArcSwap;
use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::storage::{ConfigMap, McpConfigStorage, ReloadError, ReloadTrigger, ServerConfig};

const EVENT_CAPACITY: usize = 64;

/// Notifications about the active configuration set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    /// A full load finished.
    Loaded { generation: u64, servers: usize },
    /// Derived state was dropped ahead of a reload.
    Cleared,
    /// A single configuration was added, replaced or removed.
    Changed { name: String, removed: bool },
}

/// Rejected registry mutations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("server name must not be empty")]
    EmptyName,

    #[error("config for '{0}' must be a JSON object")]
    NotAnObject(String),
}

/// Keeps the active server set in sync with a [`McpConfigStorage`].
pub struct ConfigRegistry {
    storage: Arc<dyn McpConfigStorage>,
    active: ArcSwap<ConfigMap>,
    generation: AtomicU64,
    events: broadcast::Sender<RegistryEvent>,
    this: Weak<ConfigRegistry>,
}

impl ConfigRegistry {
    pub fn new(storage: Arc<dyn McpConfigStorage>) -> Arc<Self> {
        Arc::new_cyclic(|this| {
            let (events, _) = broadcast::channel(EVENT_CAPACITY);
            Self {
                storage,
                active: ArcSwap::from_pointee(ConfigMap::new()),
                generation: AtomicU64::new(0),
                events,
                this: this.clone(),
            }
        })
    }

    /// Initialise storage and load the active set.
    pub async fn start(&self) {
        self.load().await;
    }

    async fn load(&self) {
        let hooks = RegistryHooks {
            registry: self.this.clone(),
        };
        self.storage.init(Arc::new(hooks)).await;

        let configs = self.storage.load_all().await;
        let servers = configs.len();
        self.active.store(Arc::new(configs));

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::info!(generation, servers, "Server configurations loaded");
        let _ = self.events.send(RegistryEvent::Loaded { generation, servers });
    }

    /// Snapshot of the active configurations.
    pub fn servers(&self) -> ConfigMap {
        ConfigMap::clone(&self.active.load_full())
    }

    pub fn server(&self, name: &str) -> Option<ServerConfig> {
        self.active.load().get(name).cloned()
    }

    /// Number of completed loads.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.events.subscribe()
    }

    pub fn storage(&self) -> &Arc<dyn McpConfigStorage> {
        &self.storage
    }

    /// Validate and persist a configuration.
    pub async fn add_server(&self, name: &str, config: ServerConfig) -> Result<(), RegistryError> {
        if name.trim().is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if !config.is_object() {
            return Err(RegistryError::NotAnObject(name.to_string()));
        }

        self.storage.save(name, config.clone()).await;
        self.active.rcu(|current| {
            let mut next = ConfigMap::clone(current);
            next.insert(name.to_string(), config.clone());
            next
        });

        tracing::info!(server = name, "Server configuration saved");
        let _ = self.events.send(RegistryEvent::Changed {
            name: name.to_string(),
            removed: false,
        });
        Ok(())
    }

    /// Remove a configuration. Returns false if it was not stored.
    pub async fn remove_server(&self, name: &str) -> bool {
        if !self.storage.has(name).await {
            return false;
        }

        self.storage.delete(name).await;
        self.active.rcu(|current| {
            let mut next = ConfigMap::clone(current);
            next.remove(name);
            next
        });

        tracing::info!(server = name, "Server configuration removed");
        let _ = self.events.send(RegistryEvent::Changed {
            name: name.to_string(),
            removed: true,
        });
        true
    }
}

#[async_trait]
impl ReloadTrigger for ConfigRegistry {
    async fn cleanup(&self) -> Result<(), ReloadError> {
        let dropped = self.active.swap(Arc::new(ConfigMap::new())).len();
        tracing::info!(dropped, "Cleared active server configurations");
        let _ = self.events.send(RegistryEvent::Cleared);
        Ok(())
    }

    async fn reinit(&self) -> Result<(), ReloadError> {
        self.load().await;
        Ok(())
    }
}

/// Reload hooks handed to storage. Holds the registry weakly, since the
/// registry owns the storage that holds these hooks.
struct RegistryHooks {
    registry: Weak<ConfigRegistry>,
}

#[async_trait]
impl ReloadTrigger for RegistryHooks {
    async fn cleanup(&self) -> Result<(), ReloadError> {
        match self.registry.upgrade() {
            Some(registry) => registry.cleanup().await,
            None => {
                tracing::warn!("Config file changed but the registry is gone");
                Ok(())
            }
        }
    }

    async fn reinit(&self) -> Result<(), ReloadError> {
        match self.registry.upgrade() {
            Some(registry) => registry.reinit().await,
            None => Ok(()),
        }
    }
}
