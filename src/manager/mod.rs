//! Host side of the storage contract.
//!
//! # Data Flow
//! ```text
//! start():
//!     storage.init(self) → storage.load_all() → active snapshot → Loaded event
//!
//! backing file edited externally:
//!     storage watcher → cleanup() (drop active snapshot, Cleared event)
//!     → reinit() (same path as start, generation + 1)
//!
//! add_server / remove_server:
//!     validate → storage.save / storage.delete → active snapshot → Changed event
//! ```
//!
//! # Design Decisions
//! - Owns no connections; derived state is the active snapshot only
//! - Payload validation lives here, not in storage

pub mod registry;

pub use registry::{ConfigRegistry, RegistryError, RegistryEvent};
