//! What the CDC layer believes it is capturing
//!
//! A `ConnectorResult` describes one connector. Each piece of it is fetched
//! independently and may fail on its own, so each piece is a `Probe`.
//! `CdcResult` is the union over connectors that the drift engine consumes.

use crate::schema::TableSchema;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Outcome of one independently-fetched piece of connector data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum Probe<T> {
    /// Fetched successfully
    Available(T),

    /// Attempted and failed; the reason is kept for diagnostics
    Unavailable(String),

    /// Not attempted (nothing configured to fetch)
    Skipped,
}

impl<T> Probe<T> {
    /// The value, if available
    pub fn available(&self) -> Option<&T> {
        match self {
            Self::Available(value) => Some(value),
            _ => None,
        }
    }

    /// Whether the value was fetched
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    /// Failure reason, if the fetch failed
    pub fn unavailable_reason(&self) -> Option<&str> {
        match self {
            Self::Unavailable(reason) => Some(reason),
            _ => None,
        }
    }
}

impl<T> Default for Probe<T> {
    fn default() -> Self {
        Self::Skipped
    }
}

impl<T, E: std::fmt::Display> From<Result<T, E>> for Probe<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::Available(value),
            Err(e) => Self::Unavailable(e.to_string()),
        }
    }
}

/// Where a connector records the DDL it has applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryLocation {
    /// Schema history topic
    pub topic: String,

    /// Broker addresses (host:port)
    pub brokers: Vec<String>,
}

/// The parts of a connector's declared configuration we care about
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConnectorSettings {
    /// Bare table names from the include list
    pub captured_tables: Vec<String>,

    /// Raw snapshot mode, if declared
    pub snapshot_mode: Option<String>,

    /// Schema history location, if fully declared
    pub history: Option<HistoryLocation>,
}

/// Runtime state of a single task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStatus {
    /// Task id
    pub id: u32,

    /// Task state (RUNNING, FAILED, PAUSED, UNASSIGNED, ...)
    pub state: String,
}

/// Runtime state of a connector and its tasks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorStatus {
    /// Connector state
    pub state: String,

    /// Task states
    pub tasks: Vec<TaskStatus>,
}

impl ConnectorStatus {
    /// Whether the connector itself reports RUNNING
    pub fn is_running(&self) -> bool {
        is_running_state(&self.state)
    }

    /// Ids of tasks that are not RUNNING
    pub fn failed_tasks(&self) -> Vec<u32> {
        self.tasks
            .iter()
            .filter(|t| !is_running_state(&t.state))
            .map(|t| t.id)
            .collect()
    }
}

fn is_running_state(state: &str) -> bool {
    state.eq_ignore_ascii_case("RUNNING")
}

/// Schema recovered from a connector's schema history log
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MinedHistory {
    /// Column schema per table
    pub schemas: BTreeMap<String, TableSchema>,

    /// Latest schema-change message timestamp per table
    pub timestamps: BTreeMap<String, DateTime<Utc>>,

    /// Number of log messages read
    pub messages_read: usize,
}

/// Inspection result for a single connector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectorResult {
    /// Connector name; empty for an unnamed/legacy single connector
    pub name: String,

    /// Whether the CDC platform answered at all
    pub reachable: bool,

    /// Declared configuration
    pub config: Probe<ConnectorSettings>,

    /// Runtime status
    pub status: Probe<ConnectorStatus>,

    /// Mined schema history
    pub history: Probe<MinedHistory>,

    /// Health and configuration warnings, in the order they were raised
    pub warnings: Vec<String>,
}

impl ConnectorResult {
    /// A reachable connector with nothing fetched yet
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reachable: true,
            config: Probe::Skipped,
            status: Probe::Skipped,
            history: Probe::Skipped,
            warnings: Vec::new(),
        }
    }

    /// An unnamed, unreachable result carrying the underlying error text
    pub fn unreachable(error: impl Into<String>) -> Self {
        Self {
            reachable: false,
            warnings: vec![error.into()],
            ..Self::new("")
        }
    }

    /// Wrap an already-combined result as one unnamed connector
    pub fn from_combined(result: CdcResult) -> Self {
        let settings = ConnectorSettings {
            captured_tables: result.captured_tables.into_iter().collect(),
            ..ConnectorSettings::default()
        };
        let history = if result.table_schemas.is_empty() && result.schema_timestamps.is_empty() {
            Probe::Skipped
        } else {
            Probe::Available(MinedHistory {
                schemas: result.table_schemas,
                timestamps: result.schema_timestamps,
                messages_read: 0,
            })
        };

        Self {
            name: String::new(),
            reachable: result.reachable,
            config: Probe::Available(settings),
            status: Probe::Skipped,
            history,
            warnings: result.warnings,
        }
    }

    /// Configured tables followed by mined tables not already listed
    pub fn captured_tables(&self) -> Vec<String> {
        let mut tables: Vec<String> = Vec::new();
        let configured = self
            .config
            .available()
            .map(|c| c.captured_tables.iter())
            .into_iter()
            .flatten();
        let mined = self
            .history
            .available()
            .map(|h| h.schemas.keys())
            .into_iter()
            .flatten();

        for table in configured.chain(mined) {
            if !tables.contains(table) {
                tables.push(table.clone());
            }
        }
        tables
    }

    /// Mined table schemas, if mining succeeded
    pub fn table_schemas(&self) -> Option<&BTreeMap<String, TableSchema>> {
        self.history.available().map(|h| &h.schemas)
    }

    /// Mined schema-change timestamps, if mining succeeded
    pub fn schema_timestamps(&self) -> Option<&BTreeMap<String, DateTime<Utc>>> {
        self.history.available().map(|h| &h.timestamps)
    }
}

/// Combined CDC view across one or more connectors
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CdcResult {
    /// True if any connector was reachable
    pub reachable: bool,

    /// Union of captured table names
    pub captured_tables: BTreeSet<String>,

    /// Column schema per table, when known
    pub table_schemas: BTreeMap<String, TableSchema>,

    /// Last observed schema-change timestamp per table, when known
    pub schema_timestamps: BTreeMap<String, DateTime<Utc>>,

    /// Connector warnings, concatenated in connector order
    pub warnings: Vec<String>,
}

impl CdcResult {
    /// Union several connector results
    ///
    /// On schema or timestamp conflicts the connector merged last wins.
    pub fn from_connectors<'a, I>(connectors: I) -> Self
    where
        I: IntoIterator<Item = &'a ConnectorResult>,
    {
        let mut combined = Self::default();
        for connector in connectors {
            combined.merge(connector);
        }
        combined
    }

    /// Merge one connector into this result
    pub fn merge(&mut self, connector: &ConnectorResult) {
        self.reachable |= connector.reachable;
        self.captured_tables.extend(connector.captured_tables());
        if let Some(schemas) = connector.table_schemas() {
            for (table, schema) in schemas {
                self.table_schemas.insert(table.clone(), schema.clone());
            }
        }
        if let Some(timestamps) = connector.schema_timestamps() {
            for (table, ts) in timestamps {
                self.schema_timestamps.insert(table.clone(), *ts);
            }
        }
        self.warnings.extend(connector.warnings.iter().cloned());
    }

    /// Builder-style: add a captured table
    pub fn with_captured_table(mut self, table: impl Into<String>) -> Self {
        self.captured_tables.insert(table.into());
        self
    }

    /// Builder-style: set a table schema (also marks the table captured)
    pub fn with_table_schema(mut self, table: impl Into<String>, schema: TableSchema) -> Self {
        let table = table.into();
        self.captured_tables.insert(table.clone());
        self.table_schemas.insert(table, schema);
        self
    }

    /// Builder-style: set a schema-change timestamp
    pub fn with_schema_timestamp(mut self, table: impl Into<String>, ts: DateTime<Utc>) -> Self {
        self.schema_timestamps.insert(table.into(), ts);
        self
    }

    /// Builder-style: add a warning
    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }
}

impl From<&ConnectorResult> for CdcResult {
    fn from(connector: &ConnectorResult) -> Self {
        Self::from_connectors(std::iter::once(connector))
    }
}
