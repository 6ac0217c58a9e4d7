use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::Value;

use mcp_config_store::config::{self, DeploymentMode};
use mcp_config_store::observability::logging;
use mcp_config_store::storage::{FileConfigStore, McpConfigStorage, NoReload};

#[derive(Parser)]
#[command(name = "mcp-config-cli")]
#[command(about = "Inspect and edit the MCP server configuration file", long_about = None)]
struct Cli {
    /// Backing file path (defaults to the deployment mode's location).
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Deployment mode used to pick the default path.
    #[arg(short, long)]
    mode: Option<DeploymentMode>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every configuration
    List,
    /// Print one configuration
    Get { name: String },
    /// Store a configuration given as a JSON object
    Set { name: String, config: String },
    /// Remove a configuration
    Delete { name: String },
    /// Exit 0 if the configuration exists, 1 otherwise
    Has { name: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut app = config::load_with_env(None)?;
    app.observability.log_level = "warn".to_string();
    logging::init_logging(&app.observability);

    if let Some(mode) = cli.mode {
        app.store.mode = mode;
    }
    if let Some(file) = cli.file {
        app.store.path = Some(file);
    }

    let store = FileConfigStore::new(app.store.without_watch());
    store.init(Arc::new(NoReload)).await;

    match cli.command {
        Commands::List => {
            println!("{}", serde_json::to_string_pretty(&store.load_all().await)?);
        }
        Commands::Get { name } => match store.load_all().await.get(&name) {
            Some(config) => println!("{}", serde_json::to_string_pretty(config)?),
            None => {
                eprintln!("No configuration named '{}'", name);
                std::process::exit(1);
            }
        },
        Commands::Set { name, config } => {
            let config: Value = serde_json::from_str(&config)?;
            if !config.is_object() {
                return Err(format!("config for '{}' must be a JSON object", name).into());
            }
            store.save(&name, config).await;
            report_write(&store);
        }
        Commands::Delete { name } => {
            if !store.has(&name).await {
                eprintln!("No configuration named '{}'", name);
                std::process::exit(1);
            }
            store.delete(&name).await;
            report_write(&store);
        }
        Commands::Has { name } => {
            if !store.has(&name).await {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn report_write(store: &FileConfigStore) {
    if store.settings().override_source.is_some() {
        eprintln!("Override source is set; {} was not modified", store.path().display());
    }
}
