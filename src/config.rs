//! Configuration loading and validation
//!
//! YAML configuration describing the shared output settings and the list of
//! JMX targets to poll. Every per-target knob has a default matching the
//! long-standing agent behavior, so a minimal config only needs target ids
//! and URLs.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Validation(String),
}

/// Top-level application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Prefix prepended ahead of every collector's own prefix
    #[serde(default)]
    pub global_metric_prefix: Option<String>,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub targets: Vec<TargetConfig>,
}

/// Output-file settings shared by all collectors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Write each collector's records to a per-collector file
    #[serde(default)]
    pub write_output_files: bool,

    /// Directory the per-collector output files are written into
    #[serde(default = "default_output_directory")]
    pub output_directory: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            write_output_files: false,
            output_directory: default_output_directory(),
        }
    }
}

/// One JMX target to poll
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Unique identifier, used as the metric prefix segment and in logs
    pub id: String,

    /// Jolokia endpoint base URL, e.g. `http://app-host:8778/jolokia`
    pub url: String,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    /// Per-target metric prefix segment
    #[serde(default = "default_metric_prefix")]
    pub metric_prefix: String,

    #[serde(default = "default_collection_interval_secs")]
    pub collection_interval_secs: u64,

    #[serde(default = "default_num_connection_retries")]
    pub num_connection_retries: u32,

    /// Settle time after a successful connect, letting the remote JVM's
    /// rate counters accumulate before the first fetch
    #[serde(default = "default_sleep_after_connect_secs")]
    pub sleep_after_connect_secs: u64,

    /// Object-tree refresh interval: negative refreshes every iteration,
    /// zero discovers once per connection, positive refreshes when stale
    #[serde(default = "default_query_metric_tree_secs")]
    pub query_metric_tree_secs: i64,

    #[serde(default)]
    pub collect_string_attributes: bool,

    #[serde(default = "default_derived_metrics_enabled")]
    pub derived_metrics_enabled: bool,

    /// Flush the path/decision caches this often; absent = never
    #[serde(default)]
    pub cache_flush_interval_secs: Option<u64>,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Object instance names matching any of these never enter the tree
    #[serde(default)]
    pub blacklist_object_name_regexs: Vec<String>,

    /// Canonical metric paths matching any of these are never published
    #[serde(default)]
    pub blacklist_regexs: Vec<String>,

    /// When non-empty, only matching canonical metric paths are published
    #[serde(default)]
    pub whitelist_regexs: Vec<String>,
}

fn default_output_directory() -> PathBuf {
    PathBuf::from("./output")
}

fn default_enabled() -> bool {
    true
}

fn default_metric_prefix() -> String {
    "JMX".to_string()
}

fn default_collection_interval_secs() -> u64 {
    30
}

fn default_num_connection_retries() -> u32 {
    3
}

fn default_sleep_after_connect_secs() -> u64 {
    30
}

fn default_query_metric_tree_secs() -> i64 {
    300
}

fn default_derived_metrics_enabled() -> bool {
    true
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

impl Config {
    /// Loads and validates a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;

        info!(
            path = %path.display(),
            targets = config.targets.len(),
            "Configuration loaded"
        );

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.targets.is_empty() {
            return Err(ConfigError::Validation(
                "at least one target must be configured".to_string(),
            ));
        }

        let mut seen_ids = std::collections::HashSet::new();
        for target in &self.targets {
            if target.id.is_empty() {
                return Err(ConfigError::Validation(
                    "target id must not be empty".to_string(),
                ));
            }
            if !seen_ids.insert(target.id.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate target id '{}'",
                    target.id
                )));
            }
            if !target.url.starts_with("http://") && !target.url.starts_with("https://") {
                return Err(ConfigError::Validation(format!(
                    "target '{}' url must start with http:// or https://",
                    target.id
                )));
            }
            if target.collection_interval_secs == 0 {
                return Err(ConfigError::Validation(format!(
                    "target '{}' collection_interval_secs must be positive",
                    target.id
                )));
            }
        }

        Ok(())
    }

    /// Full prefix for one target: global prefix, then the target's own
    /// prefix, then the target id.
    pub fn full_metric_prefix(&self, target: &TargetConfig) -> String {
        let mut segments: Vec<&str> = Vec::new();
        if let Some(global) = self.global_metric_prefix.as_deref() {
            if !global.is_empty() {
                segments.push(global);
            }
        }
        if !target.metric_prefix.is_empty() {
            segments.push(&target.metric_prefix);
        }
        segments.push(&target.id);
        segments.join(".")
    }
}
