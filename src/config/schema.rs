//! Configuration schema definitions.
//!
//! Settings for the store itself (where the backing file lives, how changes
//! are detected) and for the host process. All types derive Serde traits for
//! deserialization from an optional TOML file.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Environment variable holding an override JSON payload.
pub const OVERRIDE_ENV: &str = "MCP_CONFIG";

/// Environment variable holding an explicit backing file path.
pub const PATH_ENV: &str = "MCP_CONFIG_PATH";

/// Environment variable selecting the deployment mode.
pub const MODE_ENV: &str = "MCP_DEPLOYMENT_MODE";

/// File name of the backing file when no explicit path is given.
pub const CONFIG_FILE_NAME: &str = ".mcp-config.json";

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Backing file and change detection.
    pub store: StoreSettings,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,
}

/// Where the process runs, which decides the default backing file location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentMode {
    /// Backing file in the working directory.
    #[default]
    Development,
    /// Backing file in the system scratch directory (read-only app roots).
    Production,
}

impl DeploymentMode {
    pub fn default_config_path(self) -> PathBuf {
        match self {
            DeploymentMode::Development => PathBuf::from(CONFIG_FILE_NAME),
            DeploymentMode::Production => std::env::temp_dir().join(CONFIG_FILE_NAME),
        }
    }
}

impl FromStr for DeploymentMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(DeploymentMode::Production),
            "development" | "dev" => Ok(DeploymentMode::Development),
            other => Err(format!("unknown deployment mode '{}'", other)),
        }
    }
}

/// Store settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Explicit backing file path. Falls back to the mode's default.
    pub path: Option<PathBuf>,

    /// Deployment mode.
    pub mode: DeploymentMode,

    /// Watch the backing file for external edits.
    pub watch: bool,

    /// Quiet period after the last change event before comparing (ms).
    pub debounce_ms: u64,

    /// Environment variable whose presence suppresses file writes and that
    /// supplies the override payload. `None` disables both.
    pub override_var: Option<String>,

    /// Override payload (JSON object). Filled from the environment only.
    #[serde(skip)]
    pub override_source: Option<String>,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            path: None,
            mode: DeploymentMode::default(),
            watch: true,
            debounce_ms: 1000,
            override_var: Some(OVERRIDE_ENV.to_string()),
            override_source: None,
        }
    }
}

impl StoreSettings {
    /// Settings bound to `path` and detached from the process environment.
    pub fn for_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            override_var: None,
            ..Self::default()
        }
    }

    pub fn with_override(mut self, payload: impl Into<String>) -> Self {
        self.override_source = Some(payload.into());
        self
    }

    pub fn with_debounce(mut self, delay: Duration) -> Self {
        self.debounce_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn without_watch(mut self) -> Self {
        self.watch = false;
        self
    }

    /// The backing file path in effect.
    pub fn config_path(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| self.mode.default_config_path())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Pretty for terminals, JSON for log shippers.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::default(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
