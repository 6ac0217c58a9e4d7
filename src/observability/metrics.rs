//! Metrics collection and exposition.
//!
//! # Metrics
//! - `mcp_config_writes_total` (counter): backing file rewrites by outcome
//!   (persisted, suppressed, failed)
//! - `mcp_config_loads_total` (counter): bootstrap loads by source (file, override)
//! - `mcp_config_change_checks_total` (counter): debounced comparisons by result
//!   (unchanged, changed, error)
//! - `mcp_config_entries` (gauge): configurations currently held

use std::net::SocketAddr;

use ::metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on `addr`. Failure is logged, not fatal.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, "Failed to install metrics exporter: {}", e),
    }
}

pub fn record_write(outcome: &'static str) {
    counter!("mcp_config_writes_total", "outcome" => outcome).increment(1);
}

pub fn record_load(source: &'static str) {
    counter!("mcp_config_loads_total", "source" => source).increment(1);
}

pub fn record_change_check(result: &'static str) {
    counter!("mcp_config_change_checks_total", "result" => result).increment(1);
}

pub fn record_entries(count: usize) {
    gauge!("mcp_config_entries").set(count as f64);
}
