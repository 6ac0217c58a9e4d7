//! MCP config store daemon.
//!
//! Loads server configurations from the backing file (or the `MCP_CONFIG`
//! override), keeps them live while the file is edited, and logs every
//! reload until SIGINT/SIGTERM.
//!
//! ```text
//!   settings.toml ─┐
//!   environment  ──┴─▶ AppConfig ─▶ FileConfigStore ◀── .mcp-config.json
//!                                        │   ▲              (edited externally)
//!                                        ▼   │ cleanup/reinit
//!                                   ConfigRegistry ─▶ RegistryEvent log
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::broadcast::error::RecvError;

use mcp_config_store::config::{self, LogFormat};
use mcp_config_store::lifecycle::{wait_for_signal, Shutdown};
use mcp_config_store::manager::{ConfigRegistry, RegistryEvent};
use mcp_config_store::observability::{logging, metrics};
use mcp_config_store::storage::FileConfigStore;

#[derive(Parser)]
#[command(name = "mcp-config-store")]
#[command(about = "Keeps MCP server configurations in sync with their JSON file", long_about = None)]
struct Args {
    /// Settings file (TOML).
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Backing file path, overriding settings and environment.
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Emit JSON logs.
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut app = config::load_with_env(args.settings.as_deref())?;
    if let Some(file) = args.file {
        app.store.path = Some(file);
    }
    if args.json_logs {
        app.observability.log_format = LogFormat::Json;
    }

    logging::init_logging(&app.observability);
    tracing::info!("mcp-config-store v{} starting", env!("CARGO_PKG_VERSION"));

    if app.observability.metrics_enabled {
        match app.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %app.observability.metrics_address,
                "Failed to parse metrics address: {}", e
            ),
        }
    }

    let store = Arc::new(FileConfigStore::new(app.store.clone()));
    tracing::info!(
        path = %store.path().display(),
        mode = ?app.store.mode,
        watch = app.store.watch,
        override_set = app.store.override_source.is_some(),
        "Configuration loaded"
    );

    let registry = ConfigRegistry::new(store.clone());
    let shutdown = Shutdown::new();

    let mut events = registry.subscribe();
    let mut stop = shutdown.subscribe();
    let event_log = tokio::spawn(async move {
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Ok(RegistryEvent::Loaded { generation, servers }) => {
                        tracing::info!(generation, servers, "Active configuration set");
                    }
                    Ok(RegistryEvent::Cleared) => tracing::info!("Active configuration cleared for reload"),
                    Ok(RegistryEvent::Changed { name, removed }) => {
                        tracing::info!(server = %name, removed, "Configuration changed");
                    }
                    Err(RecvError::Lagged(skipped)) => tracing::warn!(skipped, "Dropped registry events"),
                    Err(RecvError::Closed) => break,
                },
                _ = stop.recv() => break,
            }
        }
    });

    registry.start().await;
    if store.override_active() {
        tracing::info!("Override source active; backing file is neither read, written nor watched");
    }

    let signal = wait_for_signal().await?;
    tracing::info!(signal, "Shutting down");

    shutdown.trigger();
    store.close().await;
    let _ = event_log.await;

    tracing::info!("Shutdown complete");
    Ok(())
}
