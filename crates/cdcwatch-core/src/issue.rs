//! Change kinds, severities and drift issues
//!
//! IMPORTANT: Change kind wire names are part of the JSON report.
//! NEVER rename or remove a kind - only add new ones.

use serde::{Deserialize, Serialize};

/// Issue severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Safe change, reported for visibility
    Info,

    /// Risky but often tolerable
    Warn,

    /// Irreversible or unsafe - should fail the gate
    Block,
}

impl Severity {
    /// Stable upper-case label used in reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Block => "BLOCK",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of change detected between the source and the CDC view
///
/// Every kind maps to exactly one severity and one canonical message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    // Column-level drift
    /// Column exists in the source but not in the CDC schema
    ColumnAdded,

    /// Column exists in the CDC schema but not in the source
    ColumnRemoved,

    /// Source column is nullable while CDC recorded it NOT NULL
    #[serde(rename = "nullable_to_notnull")]
    NullableToNotNull,

    /// Declared types differ (case-insensitive)
    TypeChanged,

    // Table-level drift
    /// Table captured by CDC but absent from the source
    CapturedTableMissing,

    /// Source table has no primary key
    PrimaryKeyMissing,

    /// Source table not captured by any connector
    TableNotCaptured,

    // Connector-level signals
    /// CDC recorded schema is older than the source DDL
    CdcSchemaStale,

    /// Snapshot configuration disables or limits initial capture
    CdcSnapshotIssue,

    /// Connector or task is not running
    CdcConnectorUnhealthy,
}

impl ChangeKind {
    /// All kinds, in declaration order
    pub const ALL: [ChangeKind; 10] = [
        Self::ColumnAdded,
        Self::ColumnRemoved,
        Self::NullableToNotNull,
        Self::TypeChanged,
        Self::CapturedTableMissing,
        Self::PrimaryKeyMissing,
        Self::TableNotCaptured,
        Self::CdcSchemaStale,
        Self::CdcSnapshotIssue,
        Self::CdcConnectorUnhealthy,
    ];

    /// Stable wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ColumnAdded => "column_added",
            Self::ColumnRemoved => "column_removed",
            Self::NullableToNotNull => "nullable_to_notnull",
            Self::TypeChanged => "type_changed",
            Self::CapturedTableMissing => "captured_table_missing",
            Self::PrimaryKeyMissing => "primary_key_missing",
            Self::TableNotCaptured => "table_not_captured",
            Self::CdcSchemaStale => "cdc_schema_stale",
            Self::CdcSnapshotIssue => "cdc_snapshot_issue",
            Self::CdcConnectorUnhealthy => "cdc_connector_unhealthy",
        }
    }

    /// Look up a kind by its wire name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.as_str() == name)
    }

    /// Fixed severity of this kind
    ///
    /// BLOCK for irreversible changes, WARN for risky but reversible
    /// ones, INFO for safe ones.
    pub fn severity(&self) -> Severity {
        match self {
            Self::ColumnAdded | Self::TableNotCaptured => Severity::Info,
            Self::ColumnRemoved
            | Self::NullableToNotNull
            | Self::CapturedTableMissing
            | Self::PrimaryKeyMissing => Severity::Block,
            Self::TypeChanged
            | Self::CdcSchemaStale
            | Self::CdcSnapshotIssue
            | Self::CdcConnectorUnhealthy => Severity::Warn,
        }
    }

    /// Canonical short message for this kind
    pub fn message(&self) -> &'static str {
        match self {
            Self::ColumnAdded => "added",
            Self::ColumnRemoved => "present in CDC but missing in source",
            Self::NullableToNotNull => "nullable -> NOT NULL",
            Self::TypeChanged => "type mismatch",
            Self::CapturedTableMissing => "captured by CDC but missing in source",
            Self::PrimaryKeyMissing => "no primary key (unsafe for CDC)",
            Self::TableNotCaptured => "exists in source but not captured by CDC",
            Self::CdcSchemaStale => "CDC schema appears stale",
            Self::CdcSnapshotIssue => "CDC snapshot configuration risk",
            Self::CdcConnectorUnhealthy => "CDC connector unhealthy",
        }
    }
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Severity for a kind given by wire name. Unknown kinds fail open as INFO.
pub fn severity_for_kind(name: &str) -> Severity {
    ChangeKind::from_name(name)
        .map(|kind| kind.severity())
        .unwrap_or(Severity::Info)
}

/// Canonical message for a kind given by wire name. Unknown kinds yield "".
pub fn message_for_kind(name: &str) -> &'static str {
    ChangeKind::from_name(name)
        .map(|kind| kind.message())
        .unwrap_or("")
}

/// A single drift finding
///
/// On deserialize the stored severity is ignored and recomputed from `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "IssueRecord")]
pub struct Issue {
    /// Severity (always `kind.severity()`)
    pub severity: Severity,

    /// What kind of change this is
    pub kind: ChangeKind,

    /// Affected table; absent for connector-global issues
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,

    /// Affected column
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,

    /// Human-readable message
    pub message: String,

    /// Source type, for type changes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_type: Option<String>,

    /// CDC type, for type changes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_type: Option<String>,
}

/// Wire form of an issue, without the derived severity
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssueRecord {
    kind: ChangeKind,
    #[serde(default)]
    table: Option<String>,
    #[serde(default)]
    column: Option<String>,
    message: String,
    #[serde(default)]
    from_type: Option<String>,
    #[serde(default)]
    to_type: Option<String>,
}

impl From<IssueRecord> for Issue {
    fn from(record: IssueRecord) -> Self {
        Self {
            severity: record.kind.severity(),
            kind: record.kind,
            table: record.table,
            column: record.column,
            message: record.message,
            from_type: record.from_type,
            to_type: record.to_type,
        }
    }
}

impl Issue {
    /// Create an issue for `kind` with the given message
    pub fn new(kind: ChangeKind, message: impl Into<String>) -> Self {
        Self {
            severity: kind.severity(),
            kind,
            table: None,
            column: None,
            message: message.into(),
            from_type: None,
            to_type: None,
        }
    }

    /// Set the table
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Set the column
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    /// Set from/to types
    pub fn with_types(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.from_type = Some(from.into());
        self.to_type = Some(to.into());
        self
    }
}
