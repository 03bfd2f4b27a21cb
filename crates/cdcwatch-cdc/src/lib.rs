//! cdcwatch CDC inspection
//!
//! Inspectors that describe what a CDC platform is capturing, one
//! `ConnectorResult` per connector:
//! - Debezium on Kafka Connect (REST API)
//! - Schema history mining from the connector's history topic
//! - Mock inspector and change log for testing
//!
//! ## Feature Flags
//!
//! - `kafka` (default): read schema history topics with rskafka
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cdcwatch_cdc::{CdcInspector, DebeziumInspector};
//!
//! let inspector = DebeziumInspector::from_config(&config.cdc)?;
//! let connectors = inspector.inspect_connectors().await?;
//! ```

pub mod error;
pub mod inspector;
pub mod miner;
pub mod history;
pub mod kafka;
pub mod debezium;
pub mod mock;

pub use error::{InspectError, MiningError};
pub use inspector::{CdcInspector, LegacyInspector, SingleResultAdapter};
pub use miner::{miner_for, DdlPatternMiner, MinedTable, SchemaMiner, SqlDdlMiner};
pub use history::{ChangeLogSource, ChangeLogStream, HistoryMiner, LogMessage};
pub use kafka::KafkaLogSource;
pub use debezium::DebeziumInspector;
pub use mock::{MockInspector, MockLogSource};
