//! CLI argument parsing for jmxpoller
//!
//! This module provides the command-line interface using clap derive macros.
//!
//! # Options
//!
//! - `--config` / `-c`: Configuration file path (default: config.yaml, env: JMXPOLLER_CONFIG)
//! - `--validate`: Validate configuration without starting the agent
//! - `--log-level` / `-l`: Log level (trace/debug/info/warn/error, env: JMXPOLLER_LOG_LEVEL)
//!
//! # Precedence
//!
//! Configuration values are resolved in the following order (highest to
//! lowest priority): CLI arguments, environment variables, configuration
//! file, default values.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// jmxpoller - Host-resident JVM telemetry agent
///
/// Polls JMX metrics from remote Java applications via Jolokia and
/// republishes them as normalized time-series metrics.
#[derive(Parser, Debug)]
#[command(name = "jmxpoller")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "config.yaml",
        env = "JMXPOLLER_CONFIG"
    )]
    pub config: PathBuf,

    /// Validate configuration without starting the agent
    #[arg(long)]
    pub validate: bool,

    /// Log level
    #[arg(
        short,
        long,
        value_enum,
        default_value = "info",
        env = "JMXPOLLER_LOG_LEVEL"
    )]
    pub log_level: LogLevel,
}

/// Log level options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// Trace level - most verbose
    Trace,
    /// Debug level
    Debug,
    /// Info level - default
    Info,
    /// Warn level
    Warn,
    /// Error level - least verbose
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_display() {
        assert_eq!(LogLevel::Trace.to_string(), "trace");
        assert_eq!(LogLevel::Info.to_string(), "info");
        assert_eq!(LogLevel::Error.to_string(), "error");
    }

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["jmxpoller"]);
        assert_eq!(cli.config, PathBuf::from("config.yaml"));
        assert!(!cli.validate);
        assert_eq!(cli.log_level, LogLevel::Info);
    }

    #[test]
    fn test_cli_with_options() {
        let cli = Cli::parse_from([
            "jmxpoller",
            "-c",
            "custom.yaml",
            "--log-level",
            "debug",
            "--validate",
        ]);
        assert_eq!(cli.config, PathBuf::from("custom.yaml"));
        assert_eq!(cli.log_level, LogLevel::Debug);
        assert!(cli.validate);
    }
}
