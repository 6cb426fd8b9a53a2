use crate::error::{DashboardError, DashboardResult};
use config::builder::{ConfigBuilder, DefaultState};
use serde::Deserialize;

/// Root application configuration. Loaded from an optional `dashboard.toml`
/// in the working directory, then environment variables with the prefix
/// `MARKETING_DASHBOARD__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_path")]
    pub path: String,
    /// Explicit `chrono` format for the date column. When unset the store
    /// tries its built-in list of formats.
    #[serde(default)]
    pub date_format: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Csv,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_format")]
    pub format: OutputFormat,
    #[serde(default = "default_pretty")]
    pub pretty: bool,
}

// Default functions
fn default_data_path() -> String {
    "marketing_data.csv".to_string()
}
fn default_output_format() -> OutputFormat {
    OutputFormat::Json
}
fn default_pretty() -> bool {
    true
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: default_data_path(),
            date_format: None,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_output_format(),
            pretty: default_pretty(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data: DataConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `dashboard.toml` (if present) and environment variables.
    pub fn load() -> DashboardResult<Self> {
        Self::from_builder(
            config::Config::builder()
                .add_source(config::File::with_name("dashboard").required(false))
                .add_source(
                    config::Environment::with_prefix("MARKETING_DASHBOARD")
                        .separator("__")
                        .try_parsing(true),
                ),
        )
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> DashboardResult<Self> {
        builder
            .build()
            .and_then(|built| built.try_deserialize())
            .map_err(|e| DashboardError::Config(e.to_string()))
    }
}
