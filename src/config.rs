use config::{self, FileFormat};
use log::{debug, warn};
use serde::Deserialize;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ExporterError;

/// Prefix for configuration taken from the environment
pub const ENV_PREFIX: &str = "SCRAPEKIT";

/// Exporter configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ExporterConfig {
    /// Leading component of every metric name
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Logging level
    #[serde(default)]
    pub log_level: LogLevel,
    /// Budget for one whole scrape round in seconds
    #[serde(default = "default_scrape_timeout")]
    pub scrape_timeout_secs: u64,
    /// Collector selection
    #[serde(default)]
    pub collectors: CollectorsConfig,
    /// Settings for the `tcp_ports` collector
    #[serde(default)]
    pub tcp_ports: TcpPortsConfig,
    /// Settings for the structured query source
    #[serde(default)]
    pub query: QueryConfig,
}

fn default_namespace() -> String {
    "windows".to_string()
}

fn default_scrape_timeout() -> u64 {
    10
}

impl ExporterConfig {
    pub fn scrape_timeout(&self) -> Duration {
        Duration::from_secs(self.scrape_timeout_secs)
    }
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            log_level: LogLevel::default(),
            scrape_timeout_secs: default_scrape_timeout(),
            collectors: CollectorsConfig::default(),
            tcp_ports: TcpPortsConfig::default(),
            query: QueryConfig::default(),
        }
    }
}

/// Which collectors run
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct CollectorsConfig {
    /// Names to enable; empty means every registered collector
    #[serde(default)]
    pub enabled: Vec<String>,
}

/// Listening-socket collector settings
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct TcpPortsConfig {
    #[serde(default = "default_netstat")]
    pub program: String,
    #[serde(default = "default_netstat_args")]
    pub args: Vec<String>,
    /// Hard bound on one netstat run
    #[serde(default = "default_netstat_timeout")]
    pub timeout_secs: u64,
}

fn default_netstat() -> String {
    "netstat".to_string()
}

fn default_netstat_args() -> Vec<String> {
    ["-ano", "-p", "TCP"].iter().map(|s| s.to_string()).collect()
}

fn default_netstat_timeout() -> u64 {
    3
}

impl Default for TcpPortsConfig {
    fn default() -> Self {
        Self {
            program: default_netstat(),
            args: default_netstat_args(),
            timeout_secs: default_netstat_timeout(),
        }
    }
}

/// Structured query source settings
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct QueryConfig {
    /// PowerShell executable used for CIM queries
    #[serde(default = "default_powershell")]
    pub program: String,
    #[serde(default = "default_query_timeout")]
    pub timeout_secs: u64,
}

fn default_powershell() -> String {
    "powershell".to_string()
}

fn default_query_timeout() -> u64 {
    5
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            program: default_powershell(),
            timeout_secs: default_query_timeout(),
        }
    }
}

/// Logging level
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Error level
    Error,
    /// Warning level
    Warn,
    /// Info level
    #[default]
    Info,
    /// Debug level
    Debug,
    /// Trace level
    Trace,
}

/// Source of configuration
#[derive(Debug, Clone)]
pub enum ConfigSource {
    /// File path (TOML format)
    File(PathBuf),
    /// Environment variables with a prefix
    Environment(String),
    /// TOML string
    Toml(String),
}

/// Load configuration from the given sources; later sources override
/// earlier ones
pub fn load_config<T>(sources: Vec<ConfigSource>) -> Result<T, ExporterError>
where
    T: for<'de> Deserialize<'de> + Debug,
{
    let mut builder = config::Config::builder();

    for source in sources {
        match source {
            ConfigSource::File(path) => {
                if !path.exists() {
                    warn!("Configuration file not found: {}", path.display());
                    continue;
                }

                debug!("Loading TOML configuration from file: {}", path.display());
                builder = builder.add_source(
                    config::File::from(path.as_path()).format(FileFormat::Toml),
                );
            }
            ConfigSource::Environment(prefix) => {
                debug!("Loading configuration from environment with prefix: {}", prefix);
                builder = builder.add_source(
                    config::Environment::with_prefix(&prefix)
                        .separator("__")
                        .list_separator(",")
                        .with_list_parse_key("collectors.enabled")
                        .with_list_parse_key("tcp_ports.args")
                        .try_parsing(true),
                );
            }
            ConfigSource::Toml(toml_str) => {
                debug!("Loading configuration from TOML string");
                builder = builder.add_source(config::File::from_str(&toml_str, FileFormat::Toml));
            }
        }
    }

    let config = builder
        .build()
        .map_err(|e| ExporterError::Config(format!("Failed to build configuration: {}", e)))?;

    let result = config
        .try_deserialize()
        .map_err(|e| ExporterError::Config(format!("Failed to deserialize configuration: {}", e)))?;

    debug!("Configuration loaded successfully: {:?}", result);

    Ok(result)
}

/// Configuration builder
pub struct ConfigBuilder {
    sources: Vec<ConfigSource>,
}

impl ConfigBuilder {
    /// Create a new config builder
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// Add a TOML file source
    pub fn add_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.sources.push(ConfigSource::File(path.as_ref().to_path_buf()));
        self
    }

    /// Add environment variables
    pub fn add_env(mut self, prefix: impl Into<String>) -> Self {
        self.sources.push(ConfigSource::Environment(prefix.into()));
        self
    }

    /// Add TOML string
    pub fn add_toml(mut self, toml: impl Into<String>) -> Self {
        self.sources.push(ConfigSource::Toml(toml.into()));
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<ExporterConfig, ExporterError> {
        load_config(self.sources)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
