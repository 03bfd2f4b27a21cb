//! Mock source inspector for testing
//!
//! Returns predefined tables without touching a database.
//!
//! ```rust,ignore
//! let source = MockSource::new();
//! source.add_table(Table::new("users").with_primary_key(["id"])).await;
//! let snapshot = source.inspect().await?;
//!
//! // Simulate an unreachable database
//! let source = MockSource::new().with_connection_failure();
//! ```

use crate::adapter::{SourceError, SourceInspector};
use cdcwatch_core::{SourceSnapshot, Table};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Mock source inspector
///
/// Tables are kept in insertion order, which is the order `inspect` returns.
pub struct MockSource {
    tables: Arc<RwLock<Vec<Table>>>,

    /// Simulate connection failure
    fail_connection: bool,

    /// Simulate query latency (milliseconds)
    latency_ms: u64,
}

impl MockSource {
    /// Create a mock source with no tables
    pub fn new() -> Self {
        Self::from_tables(Vec::new())
    }

    /// Create a mock source from pre-built tables
    pub fn from_tables(tables: Vec<Table>) -> Self {
        Self {
            tables: Arc::new(RwLock::new(tables)),
            fail_connection: false,
            latency_ms: 0,
        }
    }

    /// Add a table, replacing any table with the same name
    pub async fn add_table(&self, table: Table) {
        let mut tables = self.tables.write().await;
        match tables.iter_mut().find(|t| t.name == table.name) {
            Some(existing) => *existing = table,
            None => tables.push(table),
        }
    }

    /// Remove a table by name
    pub async fn remove_table(&self, name: &str) {
        self.tables.write().await.retain(|t| t.name != name);
    }

    /// Fail every inspection
    pub fn with_connection_failure(mut self) -> Self {
        self.fail_connection = true;
        self
    }

    /// Delay every inspection
    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    /// Get the number of tables
    pub async fn table_count(&self) -> usize {
        self.tables.read().await.len()
    }
}

impl Default for MockSource {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MockSource {
    fn clone(&self) -> Self {
        Self {
            tables: Arc::clone(&self.tables),
            fail_connection: self.fail_connection,
            latency_ms: self.latency_ms,
        }
    }
}

#[async_trait::async_trait]
impl SourceInspector for MockSource {
    fn name(&self) -> &'static str {
        "Mock"
    }

    async fn inspect(&self) -> Result<SourceSnapshot, SourceError> {
        if self.latency_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.latency_ms)).await;
        }

        if self.fail_connection {
            return Err(SourceError::Connection(
                "Simulated connection failure".to_string(),
            ));
        }

        Ok(SourceSnapshot::from_tables(self.tables.read().await.clone()))
    }
}
