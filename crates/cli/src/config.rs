use config::{Config, ConfigError, Environment, File};
use engine::DiagnosticConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub doctor: DiagnosticConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level for this workspace's crates; `RUST_LOG` takes precedence.
    pub level: String,
    pub format: LogFormat,
    pub show_time: bool,
    pub show_location: bool,
    pub redaction: RedactionConfig,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".into(),
            format: LogFormat::Compact,
            show_time: false,
            show_location: false,
            redaction: RedactionConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RedactionConfig {
    #[serde(default = "true_default")]
    pub enabled: bool,
    /// Mask URL credentials and `key=value` secrets without extra config.
    #[serde(default = "true_default")]
    pub use_default_patterns: bool,
    #[serde(default)]
    pub patterns: Vec<RedactionPattern>,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            use_default_patterns: true,
            patterns: Vec::new(),
        }
    }
}

fn true_default() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RedactionPattern {
    pub name: String,
    pub regex: String,
    pub placeholder: String,
}

/// Layer configuration sources, lowest precedence first:
/// built-in defaults, `trackerctl.yaml`, `.trackerctl.yaml` (local
/// override), the explicit `--config` file, then `TRACKER__*` variables
/// (e.g. `TRACKER__DOCTOR__SERVER__TIMEOUT_MS=20000`).
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder()
        .add_source(File::with_name("trackerctl.yaml").required(false))
        .add_source(File::with_name(".trackerctl.yaml").required(false));

    if let Some(path) = explicit {
        builder = builder.add_source(File::from(path).required(true));
    }

    builder
        .add_source(Environment::with_prefix("TRACKER").separator("__"))
        .build()?
        .try_deserialize()
}
