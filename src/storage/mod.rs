//! File-backed MCP server configuration storage.
//!
//! # Data Flow
//! ```text
//! init(manager):
//!     close previous watch
//!     → override source (env JSON) if configured and valid
//!     → otherwise backing file (created empty when missing)
//!     → ConfigMap replaced wholesale
//!     → watcher.rs armed on the backing file (file mode only)
//!
//! save / delete:
//!     ConfigMap updated in memory
//!     → persistence.rs rewrites the whole file (skipped in override mode)
//!
//! external edit:
//!     notify event → debounce.rs (trailing, per store)
//!     → re-read file, compare with ConfigMap
//!     → equal: ignore (self-write) / different: manager.cleanup() + manager.reinit()
//! ```
//!
//! # Design Decisions
//! - The in-memory map is the only source for reads
//! - Storage problems are logged, never returned: callers see degraded data,
//!   not errors
//! - Self-writes are recognised by content, not by tracking our own events

pub mod debounce;
pub mod error;
pub mod file_store;
pub mod persistence;
pub mod watcher;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

pub use error::StorageError;
pub use file_store::FileConfigStore;

/// One server's configuration. Never interpreted by the store.
pub type ServerConfig = serde_json::Value;

/// Named server configurations.
pub type ConfigMap = BTreeMap<String, ServerConfig>;

/// Error type returned by reload hooks.
pub type ReloadError = Box<dyn std::error::Error + Send + Sync>;

/// Hooks the storage calls when the backing file changes underneath it.
#[async_trait]
pub trait ReloadTrigger: Send + Sync {
    /// Discard anything derived from the current configuration.
    async fn cleanup(&self) -> Result<(), ReloadError>;

    /// Re-bootstrap, which normally calls back into `McpConfigStorage::init`.
    async fn reinit(&self) -> Result<(), ReloadError>;
}

/// Storage contract consumed by the client manager.
#[async_trait]
pub trait McpConfigStorage: Send + Sync {
    /// Load configurations and (re)arm change detection. Never fails.
    async fn init(&self, manager: Arc<dyn ReloadTrigger>);

    /// Snapshot of all configurations.
    async fn load_all(&self) -> ConfigMap;

    /// Insert or replace a configuration.
    async fn save(&self, name: &str, config: ServerConfig);

    /// Remove a configuration if present.
    async fn delete(&self, name: &str);

    async fn has(&self, name: &str) -> bool;
}

/// A trigger that ignores reloads, for one-shot tools.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReload;

#[async_trait]
impl ReloadTrigger for NoReload {
    async fn cleanup(&self) -> Result<(), ReloadError> {
        Ok(())
    }

    async fn reinit(&self) -> Result<(), ReloadError> {
        Ok(())
    }
}
