//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//!
//! Shutdown (shutdown.rs):
//!     Signal received → background tasks stop → store closed → Exit
//! ```
//!
//! # Design Decisions
//! - Config reload is driven by the file watcher, not by SIGHUP
//! - Ordered shutdown: stop background tasks, then close the watch

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::wait_for_signal;
