//! Configuration for the price exporter.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] json5::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Complete exporter configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExporterConfig {
    /// Upstream price API settings.
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Prometheus exporter settings.
    #[serde(default)]
    pub prometheus: PrometheusConfig,

    /// Price cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Upstream ticker API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Ticker price endpoint (default: Binance `/api/v3/ticker/price`).
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds. Unset keeps the client default.
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Environment variable holding the comma-separated symbol override.
    #[serde(default = "default_symbols_env")]
    pub symbols_env: String,
}

fn default_base_url() -> String {
    "https://api.binance.com/api/v3/ticker/price".to_string()
}

fn default_symbols_env() -> String {
    "SYMBOLS".to_string()
}

impl UpstreamConfig {
    /// Request timeout, if one is configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: None,
            symbols_env: default_symbols_env(),
        }
    }
}

/// Prometheus HTTP endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrometheusConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Path for metrics endpoint (default: "/metrics").
    #[serde(default = "default_path")]
    pub path: String,

    /// Name of the price gauge (default: "binance_crypto_price").
    #[serde(default = "default_metric_name")]
    pub metric_name: String,

    /// Expose process metrics alongside the prices (default: true).
    #[serde(default = "default_process_metrics")]
    pub process_metrics: bool,
}

fn default_listen() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_path() -> String {
    "/metrics".to_string()
}

fn default_metric_name() -> String {
    "binance_crypto_price".to_string()
}

fn default_process_metrics() -> bool {
    true
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            path: default_path(),
            metric_name: default_metric_name(),
            process_metrics: default_process_metrics(),
        }
    }
}

/// Price cache configuration.
///
/// Every scrape fetches fresh prices unless `ttl_secs` is set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheConfig {
    /// How long a successful fetch may be reused (seconds, 0 = disabled).
    #[serde(default)]
    pub ttl_secs: u64,
}

impl CacheConfig {
    /// Cache lifetime, or `None` when caching is disabled.
    pub fn ttl(&self) -> Option<Duration> {
        (self.ttl_secs > 0).then(|| Duration::from_secs(self.ttl_secs))
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format: "text" or "json".
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl ExporterConfig {
    /// Load configuration from a JSON5 file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from a JSON5 string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: ExporterConfig = json5::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self
            .prometheus
            .listen
            .parse::<std::net::SocketAddr>()
            .is_err()
        {
            return Err(ConfigError::Validation(format!(
                "Invalid listen address: {}",
                self.prometheus.listen
            )));
        }

        if !self.prometheus.path.starts_with('/') {
            return Err(ConfigError::Validation(
                "Metrics path must start with /".to_string(),
            ));
        }

        if self.prometheus.path == "/health" {
            return Err(ConfigError::Validation(
                "Metrics path conflicts with /health".to_string(),
            ));
        }

        // The router treats these as path parameters and wildcards.
        if self.prometheus.path.contains([':', '*']) {
            return Err(ConfigError::Validation(format!(
                "Metrics path must not contain ':' or '*': {}",
                self.prometheus.path
            )));
        }

        if !is_valid_metric_name(&self.prometheus.metric_name) {
            return Err(ConfigError::Validation(format!(
                "Invalid metric name: {:?}",
                self.prometheus.metric_name
            )));
        }

        if reqwest::Url::parse(&self.upstream.base_url).is_err() {
            return Err(ConfigError::Validation(format!(
                "Invalid upstream base_url: {}",
                self.upstream.base_url
            )));
        }

        if self.upstream.timeout_secs == Some(0) {
            return Err(ConfigError::Validation(
                "timeout_secs must be > 0 when set".to_string(),
            ));
        }

        if self.upstream.symbols_env.is_empty() {
            return Err(ConfigError::Validation(
                "symbols_env must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// Prometheus metric names must match `[a-zA-Z_:][a-zA-Z0-9_:]*`.
fn is_valid_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}
