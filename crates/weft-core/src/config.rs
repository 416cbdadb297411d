//! Runtime configuration for the orchestration engine.
//!
//! Mirrors `fluent_core::config::load_engine_config`'s pattern of parsing a
//! structured document and layering environment-variable overrides on top,
//! adapted to TOML (the format the rest of this workspace's plugin-config
//! surfaces use).

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::error::{ValidationError, WeftError, WeftResult};

/// Top-level configuration for a running engine instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub database: DatabaseConfig,
    pub scheduler: SchedulerConfig,
    pub monitor: MonitorConfig,
    pub handlers: HandlersConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            scheduler: SchedulerConfig::default(),
            monitor: MonitorConfig::default(),
            handlers: HandlersConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file, or `:memory:`.
    pub path: String,
    pub max_connections: usize,
    pub min_idle_connections: usize,
    pub max_connection_lifetime_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "weft.db".to_string(),
            max_connections: 10,
            min_idle_connections: 5,
            max_connection_lifetime_secs: 3600,
        }
    }
}

impl DatabaseConfig {
    pub fn max_connection_lifetime(&self) -> Duration {
        Duration::from_secs(self.max_connection_lifetime_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub tick_interval_secs: u64,
    pub stop_drain_timeout_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: 30,
            stop_drain_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub max_history: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self { max_history: 1000 }
    }
}

impl MonitorConfig {
    /// Values `<= 0` (represented here as `0` since the field is unsigned)
    /// are clamped to the default of 1000, per the design's retention rule.
    pub fn effective_max_history(&self) -> usize {
        if self.max_history == 0 {
            1000
        } else {
            self.max_history
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HandlersConfig {
    /// Default tag used to resolve an alert pipeline when no
    /// `trigger_pipeline_id` is supplied in the anomaly payload.
    pub default_alert_tag: String,
}

impl Default for HandlersConfig {
    fn default() -> Self {
        Self {
            default_alert_tag: "alert".to_string(),
        }
    }
}

/// Load configuration from a TOML document, then apply `WEFT_`-prefixed
/// environment variable overrides for the handful of settings operators
/// commonly need to flip without editing the file.
pub fn load_config(toml_content: &str) -> WeftResult<RuntimeConfig> {
    let mut config: RuntimeConfig = toml::from_str(toml_content).map_err(|e| {
        WeftError::Validation(ValidationError::InvalidValue {
            field: "config".to_string(),
            reason: e.to_string(),
        })
    })?;

    apply_env_overrides(&mut config);
    Ok(config)
}

fn apply_env_overrides(config: &mut RuntimeConfig) {
    if let Ok(path) = env::var("WEFT_DATABASE_PATH") {
        config.database.path = path;
    }
    if let Ok(max_history) = env::var("WEFT_MONITOR_MAX_HISTORY") {
        if let Ok(value) = max_history.parse() {
            config.monitor.max_history = value;
        }
    }
    if let Ok(tag) = env::var("WEFT_DEFAULT_ALERT_TAG") {
        config.handlers.default_alert_tag = tag;
    }
}
