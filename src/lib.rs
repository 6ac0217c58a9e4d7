//! File-backed MCP server configuration store.
//!
//! Keeps a set of named server configurations in memory, mirrors every change
//! to a JSON file, and reloads through the owning manager when that file is
//! edited by someone else.

pub mod config;
pub mod lifecycle;
pub mod manager;
pub mod observability;
pub mod storage;

pub use config::{AppConfig, StoreSettings};
pub use lifecycle::Shutdown;
pub use manager::ConfigRegistry;
pub use storage::{
    ConfigMap, FileConfigStore, McpConfigStorage, NoReload, ReloadError, ReloadTrigger,
    ServerConfig,
};
