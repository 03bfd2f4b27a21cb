//! Source inspector trait for fetching the authoritative schema snapshot

use cdcwatch_core::SourceSnapshot;

/// Errors that can occur when inspecting the source
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Trait for anything that can describe the source tables
#[async_trait::async_trait]
pub trait SourceInspector: Send + Sync {
    /// Get the inspector name (e.g., "snapshot", "PostgreSQL")
    fn name(&self) -> &'static str;

    /// Read every table of the inspected schema
    ///
    /// Columns come back in ordinal order. Any failure is fatal for the run.
    async fn inspect(&self) -> Result<SourceSnapshot, SourceError>;
}
