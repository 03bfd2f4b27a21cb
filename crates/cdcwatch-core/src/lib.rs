//! cdcwatch Core
//!
//! Core domain model with stable, versioned types.
//! Never rename change kinds - they are part of the JSON report.

pub mod issue;
pub mod schema;
pub mod cdc;
pub mod report;
pub mod config;

pub use issue::{ChangeKind, Issue, Severity, message_for_kind, severity_for_kind};
pub use schema::{CapturedColumn, Column, SourceSnapshot, Table, TableSchema};
pub use cdc::{
    CdcResult, ConnectorResult, ConnectorSettings, ConnectorStatus, HistoryLocation, MinedHistory,
    Probe, TaskStatus,
};
pub use report::{FailOn, HighestSeverity, Report, ReportSummary, ReportVersion};
pub use config::{CdcConfig, Config, ConfigError, HistoryConfig, MinerKind, OutputFormat, SourceConfig};
