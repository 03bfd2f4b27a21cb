//! Configuration schema (cdcwatch.toml)

use crate::report::FailOn;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Environment variable overriding `cdc.connect_url`
pub const ENV_CONNECT_URL: &str = "CDCWATCH_CONNECT_URL";

/// Environment variable overriding `source.dsn`
pub const ENV_SOURCE_DSN: &str = "CDCWATCH_SOURCE_DSN";

/// Report output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Grouped, colored text
    #[default]
    Human,

    /// Machine-readable JSON
    Json,
}

impl OutputFormat {
    /// Parse a format name; anything other than "json" is human
    pub fn parse_lenient(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Human
        }
    }
}

/// Where the source schema snapshot comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Source type: "snapshot", "mysql" or "postgres"
    #[serde(rename = "type")]
    pub source_type: String,

    /// Snapshot JSON file (snapshot sources)
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Connection string (database sources)
    #[serde(default)]
    pub dsn: Option<String>,

    /// Schema to inspect (database sources)
    #[serde(default)]
    pub schema: Option<String>,

    /// Use TLS for the database connection
    #[serde(default)]
    pub tls: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            source_type: "snapshot".to_string(),
            path: None,
            dsn: None,
            schema: None,
            tls: false,
        }
    }
}

/// Which schema miner reads the history log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MinerKind {
    /// CREATE TABLE pattern matching over the raw payload
    #[default]
    Pattern,

    /// Grammar-based parsing of the payload's `ddl` field
    Sqlparser,
}

/// Bounds on the schema history read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Stop after this many messages
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,

    /// Stop after this much wall-clock time
    #[serde(default = "default_history_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_max_messages() -> usize {
    500
}

fn default_history_timeout_ms() -> u64 {
    3000
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_messages: default_max_messages(),
            timeout_ms: default_history_timeout_ms(),
        }
    }
}

/// CDC platform connection configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CdcConfig {
    /// CDC type; only "debezium" is supported
    #[serde(rename = "type")]
    pub cdc_type: String,

    /// Kafka Connect REST base URL
    #[serde(default)]
    pub connect_url: String,

    /// Fallback brokers for schema history reads
    #[serde(default)]
    pub brokers: Vec<String>,

    /// Timeout for each management API call
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Schema miner
    #[serde(default)]
    pub miner: MinerKind,

    /// Schema history read bounds
    #[serde(default)]
    pub history: HistoryConfig,
}

fn default_request_timeout_secs() -> u64 {
    5
}

impl Default for CdcConfig {
    fn default() -> Self {
        Self {
            cdc_type: "debezium".to_string(),
            connect_url: String::new(),
            brokers: Vec::new(),
            request_timeout_secs: default_request_timeout_secs(),
            miner: MinerKind::default(),
            history: HistoryConfig::default(),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Severity that fails the run
    #[serde(default)]
    pub fail_on: FailOn,

    /// Output format
    #[serde(default)]
    pub format: OutputFormat,

    /// Source schema provider
    #[serde(default)]
    pub source: SourceConfig,

    /// CDC platform
    #[serde(default)]
    pub cdc: CdcConfig,

    /// Directory of the config file (for resolving relative paths)
    #[serde(skip)]
    pub project_root: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fail_on: FailOn::default(),
            format: OutputFormat::default(),
            source: SourceConfig::default(),
            cdc: CdcConfig::default(),
            project_root: std::env::current_dir().unwrap_or_default(),
        }
    }
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;

        let mut config = Self::from_toml(&contents)?;

        // Relative paths resolve against the config file's directory
        if let Some(parent) = path.parent() {
            config.project_root = parent.to_path_buf();
        }

        Ok(config)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Load, apply environment overrides and validate
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Override connection settings from the environment
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(ENV_CONNECT_URL) {
            self.cdc.connect_url = url;
        }
        if let Ok(dsn) = std::env::var(ENV_SOURCE_DSN) {
            self.source.dsn = Some(dsn);
        }
    }

    /// Resolve a possibly-relative path against the project root
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }

    /// Check the configuration, collecting every problem found
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errs = Vec::new();

        match self.source.source_type.trim() {
            "" => errs.push("source.type is required (snapshot, mysql or postgres)".to_string()),
            "snapshot" => {
                if self.source.path.is_none() {
                    errs.push("source.path is required for snapshot sources".to_string());
                }
            }
            kind @ ("mysql" | "postgres") => {
                if self.source.dsn.as_deref().map_or(true, |d| d.trim().is_empty()) {
                    errs.push(format!("source.dsn is required for {} sources", kind));
                }
                if self.source.schema.as_deref().map_or(true, |s| s.trim().is_empty()) {
                    errs.push(format!("source.schema is required for {} sources", kind));
                }
            }
            other => errs.push(format!(
                "unsupported source.type '{}': expected snapshot, mysql or postgres",
                other
            )),
        }

        match self.cdc.cdc_type.trim() {
            "" => errs.push("cdc.type is required (e.g. 'debezium')".to_string()),
            "debezium" => {
                if self.cdc.connect_url.trim().is_empty() {
                    errs.push("cdc.connect_url is required for debezium connectors".to_string());
                } else if !is_http_url(&self.cdc.connect_url) {
                    errs.push(format!(
                        "cdc.connect_url must be a valid http(s) URL: {}",
                        self.cdc.connect_url
                    ));
                }
                for broker in &self.cdc.brokers {
                    if broker.trim().is_empty() || !broker.contains(':') {
                        errs.push(format!("cdc.brokers contains invalid broker address: {:?}", broker));
                    }
                }
            }
            _ => errs.push("unsupported cdc.type: only 'debezium' is supported".to_string()),
        }

        if self.cdc.request_timeout_secs == 0 {
            errs.push("cdc.request_timeout_secs must be greater than 0".to_string());
        }
        if self.cdc.history.max_messages == 0 {
            errs.push("cdc.history.max_messages must be greater than 0".to_string());
        }
        if self.cdc.history.timeout_ms == 0 {
            errs.push("cdc.history.timeout_ms must be greater than 0".to_string());
        }

        if errs.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(errs))
        }
    }
}

fn is_http_url(value: &str) -> bool {
    match Url::parse(value.trim()) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https")
                && url.host_str().is_some_and(|host| !host.is_empty())
        }
        Err(_) => false,
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("config validation failed:\n  - {}", .0.join("\n  - "))]
    Invalid(Vec<String>),
}
