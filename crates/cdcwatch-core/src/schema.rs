//! Schema snapshot types for the source and the CDC side

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A column in a source table
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Column {
    /// Column name (unique within its table, compared exactly)
    pub name: String,

    /// Declared type in the source vocabulary (compared case-insensitively)
    #[serde(rename = "type")]
    pub data_type: String,

    /// Whether the column accepts NULL
    #[serde(default)]
    pub nullable: bool,
}

impl Column {
    /// Create a NOT NULL column
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable: false,
        }
    }

    /// Set nullability
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }
}

/// A source table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    /// Table name (unique within a snapshot)
    pub name: String,

    /// Columns, in source ordinal order
    #[serde(default)]
    pub columns: Vec<Column>,

    /// Primary key column names; empty means no primary key
    #[serde(default, alias = "primary_key")]
    pub primary_key: Vec<String>,

    /// Row count at inspection time
    #[serde(default, alias = "row_count")]
    pub row_count: i64,

    /// Best-effort timestamp of the last CREATE/ALTER on this table
    #[serde(default, alias = "ddl_time", skip_serializing_if = "Option::is_none")]
    pub ddl_time: Option<DateTime<Utc>>,
}

impl Table {
    /// Create an empty table
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            primary_key: Vec::new(),
            row_count: 0,
            ddl_time: None,
        }
    }

    /// Set columns
    pub fn with_columns(mut self, columns: Vec<Column>) -> Self {
        self.columns = columns;
        self
    }

    /// Set primary key columns
    pub fn with_primary_key<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_key = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Set row count
    pub fn with_row_count(mut self, row_count: i64) -> Self {
        self.row_count = row_count;
        self
    }

    /// Set the last DDL timestamp
    pub fn with_ddl_time(mut self, ddl_time: DateTime<Utc>) -> Self {
        self.ddl_time = Some(ddl_time);
        self
    }

    /// Find a column by exact name
    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Get column names
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

/// The authoritative source schema view
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SourceSnapshot {
    /// Tables in the inspected schema
    #[serde(default)]
    pub tables: Vec<Table>,
}

impl SourceSnapshot {
    /// Create a snapshot from tables
    pub fn from_tables(tables: Vec<Table>) -> Self {
        Self { tables }
    }

    /// Find a table by exact name
    pub fn find_table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Get table names
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }

    /// Parse a snapshot from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// A column as recorded by the CDC layer
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CapturedColumn {
    /// Declared type as the CDC layer saw it
    #[serde(rename = "type")]
    pub data_type: String,

    /// Whether the CDC layer recorded the column as nullable
    pub nullable: bool,
}

impl CapturedColumn {
    /// Create a captured column record
    pub fn new(data_type: impl Into<String>, nullable: bool) -> Self {
        Self {
            data_type: data_type.into(),
            nullable,
        }
    }
}

/// Column schema of one table as the CDC layer believes it to be
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TableSchema {
    /// Columns keyed by exact name
    pub columns: BTreeMap<String, CapturedColumn>,
}

impl TableSchema {
    /// Create an empty table schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column
    pub fn with_column(
        mut self,
        name: impl Into<String>,
        data_type: impl Into<String>,
        nullable: bool,
    ) -> Self {
        self.columns
            .insert(name.into(), CapturedColumn::new(data_type, nullable));
        self
    }

    /// Mirror a source table's columns (used to build identical CDC views)
    pub fn from_table(table: &Table) -> Self {
        Self {
            columns: table
                .columns
                .iter()
                .map(|c| (c.name.clone(), CapturedColumn::new(c.data_type.clone(), c.nullable)))
                .collect(),
        }
    }

    /// Whether no columns were recovered
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
