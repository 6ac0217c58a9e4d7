//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! storage, manager, binaries produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (writes, loads, change checks, entry count)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Structured fields (path, entries) rather than formatted prose
//! - Metrics are recorded unconditionally; without an installed exporter the
//!   `metrics` facade discards them

pub mod logging;
pub mod metrics;
