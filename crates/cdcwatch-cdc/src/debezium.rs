//! Debezium inspector over the Kafka Connect REST API
//!
//! For each connector the inspector reads its configuration, flags unsafe
//! snapshot modes, polls runtime status, and mines the connector's schema
//! history topic. Calls are sequential so warnings keep a stable order.
//!
//! ## Endpoints
//!
//! - `GET /connectors` - connector names
//! - `GET /connectors/{name}` - `{"config": {...}}`
//! - `GET /connectors/{name}/status` - connector and task states
//!
//! ## Configuration keys read
//!
//! | key | use |
//! |-----|-----|
//! | `table.include.list` (`table.whitelist`) | captured tables |
//! | `snapshot.mode` | snapshot warning |
//! | `schema.history.internal.kafka.topic` (`database.history.kafka.topic`) | history topic |
//! | `schema.history.internal.kafka.bootstrap.servers` (`database.history.kafka.bootstrap.servers`) | history brokers |

use crate::error::InspectError;
use crate::history::{ChangeLogSource, HistoryMiner};
use crate::inspector::CdcInspector;
use crate::kafka::KafkaLogSource;
use crate::miner::miner_for;
use cdcwatch_core::{
    CdcConfig, ConnectorResult, ConnectorSettings, ConnectorStatus, HistoryLocation, Probe, TaskStatus,
};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

const TABLE_LIST_KEYS: [&str; 2] = ["table.include.list", "table.whitelist"];
const HISTORY_TOPIC_KEYS: [&str; 2] = ["schema.history.internal.kafka.topic", "database.history.kafka.topic"];
const HISTORY_BROKER_KEYS: [&str; 2] = [
    "schema.history.internal.kafka.bootstrap.servers",
    "database.history.kafka.bootstrap.servers",
];

/// Snapshot modes that skip or limit the initial data copy
const RISKY_SNAPSHOT_MODES: [&str; 7] = [
    "never",
    "none",
    "schema_only",
    "schema_only_recovery",
    "off",
    "no_data",
    "recovery",
];

/// Default timeout for each management API call
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct ConfigResponse {
    #[serde(default)]
    config: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    connector: ConnectorState,
    #[serde(default)]
    tasks: Vec<TaskStatus>,
}

#[derive(Debug, Deserialize)]
struct ConnectorState {
    state: String,
}

/// Debezium inspector
pub struct DebeziumInspector {
    client: Client,
    connect_url: String,
    base_url: Url,
    fallback_brokers: Vec<String>,
    history: Option<HistoryMiner>,
    log_source: Arc<dyn ChangeLogSource>,
}

impl DebeziumInspector {
    /// Create an inspector for a Kafka Connect base URL
    ///
    /// History is mined with the default pattern miner through Kafka.
    pub fn new(connect_url: impl Into<String>, request_timeout: Duration) -> Result<Self, InspectError> {
        let connect_url = connect_url.into().trim_end_matches('/').to_string();
        let base_url = Url::parse(&connect_url)
            .map_err(|e| InspectError::InvalidUrl(format!("{}: {}", connect_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(InspectError::InvalidUrl(format!("{}: cannot be a base URL", connect_url)));
        }

        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| InspectError::Client(e.to_string()))?;

        Ok(Self {
            client,
            connect_url,
            base_url,
            fallback_brokers: Vec::new(),
            history: Some(HistoryMiner::default()),
            log_source: Arc::new(KafkaLogSource::new()),
        })
    }

    /// Create an inspector from the `[cdc]` config section
    pub fn from_config(config: &CdcConfig) -> Result<Self, InspectError> {
        let inspector = Self::new(&config.connect_url, Duration::from_secs(config.request_timeout_secs))?
            .with_fallback_brokers(config.brokers.clone())
            .with_history_miner(HistoryMiner::from_config(miner_for(config.miner), &config.history));
        Ok(inspector)
    }

    /// Brokers to use when a connector does not declare its own
    pub fn with_fallback_brokers(mut self, brokers: Vec<String>) -> Self {
        self.fallback_brokers = brokers;
        self
    }

    /// Replace the history miner
    pub fn with_history_miner(mut self, miner: HistoryMiner) -> Self {
        self.history = Some(miner);
        self
    }

    /// Do not read schema history topics
    pub fn without_history(mut self) -> Self {
        self.history = None;
        self
    }

    /// Replace the change log source (Kafka by default)
    pub fn with_log_source(mut self, source: Arc<dyn ChangeLogSource>) -> Self {
        self.log_source = source;
        self
    }

    /// Base URL of the Kafka Connect REST API
    pub fn connect_url(&self) -> &str {
        &self.connect_url
    }

    /// Management API URL with each segment percent-encoded
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, InspectError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| InspectError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(InspectError::UnexpectedStatus {
                status: response.status().as_u16(),
            });
        }

        response
            .json()
            .await
            .map_err(|e| InspectError::InvalidResponse(e.to_string()))
    }

    async fn inspect_connector(&self, name: &str) -> ConnectorResult {
        let mut result = ConnectorResult::new(name);

        // Config
        let config_url = self.endpoint(&["connectors", name]);
        let config = self.get_json::<ConfigResponse>(config_url).await;
        if let Err(e) = &config {
            tracing::warn!("Connector {}: config unavailable: {}", name, e);
        }
        let config = config.map(|response| parse_settings(&response.config, &self.fallback_brokers));

        if let Ok(settings) = &config {
            if let Some(warning) = settings.snapshot_mode.as_deref().and_then(|mode| snapshot_warning(name, mode)) {
                result.warnings.push(warning);
            }
        }
        result.config = Probe::from(config);

        // Status
        let status_url = self.endpoint(&["connectors", name, "status"]);
        let status = self
            .get_json::<StatusResponse>(status_url)
            .await
            .map(|response| ConnectorStatus {
                state: response.connector.state,
                tasks: response.tasks,
            });
        match &status {
            Ok(status) => result.warnings.extend(status_warnings(name, status)),
            Err(e) => tracing::warn!("Connector {}: status unavailable: {}", name, e),
        }
        result.status = Probe::from(status);

        // Schema history
        let location = result.config.available().and_then(|settings| settings.history.clone());
        if let (Some(miner), Some(location)) = (&self.history, location) {
            tracing::debug!(
                "Connector {}: mining {} with {} miner",
                name,
                location.topic,
                miner.miner_name()
            );
            let history = miner.mine(self.log_source.as_ref(), &location).await;
            if let Err(e) = &history {
                tracing::info!("Connector {}: no schema history: {}", name, e);
            }
            result.history = Probe::from(history);
        }

        result
    }
}

#[async_trait::async_trait]
impl CdcInspector for DebeziumInspector {
    fn name(&self) -> &'static str {
        "debezium"
    }

    async fn inspect_connectors(&self) -> Result<Vec<ConnectorResult>, InspectError> {
        let url = self.endpoint(&["connectors"]);
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Kafka Connect unreachable at {}: {}", self.connect_url, e);
                return Ok(vec![ConnectorResult::unreachable(e.to_string())]);
            }
        };

        if !response.status().is_success() {
            return Err(InspectError::UnexpectedStatus {
                status: response.status().as_u16(),
            });
        }

        let names: Vec<String> = response
            .json()
            .await
            .map_err(|e| InspectError::InvalidResponse(format!("connector listing: {}", e)))?;

        tracing::info!("Found {} connector(s) at {}", names.len(), self.connect_url);

        let mut results = Vec::with_capacity(names.len());
        for name in &names {
            results.push(self.inspect_connector(name).await);
        }
        Ok(results)
    }
}

/// Extract the settings we care about from a connector config map
pub fn parse_settings(config: &Map<String, Value>, fallback_brokers: &[String]) -> ConnectorSettings {
    let captured_tables = lookup(config, &TABLE_LIST_KEYS)
        .map(parse_table_list)
        .unwrap_or_default();

    let snapshot_mode = config
        .get("snapshot.mode")
        .and_then(Value::as_str)
        .map(str::to_string);

    let topic = lookup(config, &HISTORY_TOPIC_KEYS)
        .map(str::trim)
        .filter(|topic| !topic.is_empty());
    let mut brokers = lookup(config, &HISTORY_BROKER_KEYS).map(split_list).unwrap_or_default();
    if brokers.is_empty() {
        brokers = fallback_brokers.to_vec();
    }
    let history = match topic {
        Some(topic) if !brokers.is_empty() => Some(HistoryLocation {
            topic: topic.to_string(),
            brokers,
        }),
        _ => None,
    };

    ConnectorSettings {
        captured_tables,
        snapshot_mode,
        history,
    }
}

/// First string value among `keys`
fn lookup<'a>(config: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|key| config.get(*key).and_then(Value::as_str))
}

/// Bare table names from a comma-separated include list
///
/// Qualified entries keep only the segment after the last dot. Empty
/// entries are dropped and duplicates removed, keeping first occurrence.
pub fn parse_table_list(list: &str) -> Vec<String> {
    let mut tables: Vec<String> = Vec::new();
    for entry in split_list(list) {
        let table = entry.rsplit('.').next().unwrap_or(entry.as_str()).to_string();
        if !table.is_empty() && !tables.contains(&table) {
            tables.push(table);
        }
    }
    tables
}

fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Warning for a snapshot mode that skips or limits the initial copy
pub fn snapshot_warning(connector: &str, snapshot_mode: &str) -> Option<String> {
    let mode = snapshot_mode.trim().to_lowercase();
    if !RISKY_SNAPSHOT_MODES.contains(&mode.as_str()) {
        return None;
    }
    Some(format!(
        "Connector {} has snapshot.mode={}; snapshots disabled or schema-only (CDC may miss initial data). This check will not attempt to trigger snapshots.",
        connector, mode
    ))
}

/// Health warnings for a connector status, in reporting order
pub fn status_warnings(connector: &str, status: &ConnectorStatus) -> Vec<String> {
    let tasks = status
        .tasks
        .iter()
        .map(|task| format!("{}:{}", task.id, task.state))
        .collect::<Vec<_>>()
        .join(",");

    let mut warnings = vec![format!(
        "Connector {} health: connector={} tasks=[{}]",
        connector, status.state, tasks
    )];

    if !status.is_running() {
        warnings.push(format!("Connector {} state={}", connector, status.state));
    }

    let failed = status.failed_tasks();
    if !failed.is_empty() {
        warnings.push(format!("Connector {} has failed task(s): {:?}", connector, failed));
        if status.is_running() {
            warnings.push(format!(
                "Connector {} may be in restart loop: connector RUNNING but tasks failing",
                connector
            ));
        }
    }

    warnings
}
