//! JSON snapshot file source
//!
//! Reads an already-materialized source snapshot, typically exported by a
//! separate job with access to the database:
//!
//! ```json
//! {
//!   "tables": [
//!     {
//!       "name": "customers",
//!       "columns": [{"name": "id", "type": "int", "nullable": false}],
//!       "primaryKey": ["id"],
//!       "rowCount": 42,
//!       "ddlTime": "2024-03-01T12:00:00Z"
//!     }
//!   ]
//! }
//! ```

use crate::adapter::{SourceError, SourceInspector};
use cdcwatch_core::SourceSnapshot;
use std::path::{Path, PathBuf};

/// Source backed by a snapshot JSON file
#[derive(Debug, Clone)]
pub struct SnapshotFileSource {
    path: PathBuf,
}

impl SnapshotFileSource {
    /// Create a source reading from `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the snapshot file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl SourceInspector for SnapshotFileSource {
    fn name(&self) -> &'static str {
        "snapshot"
    }

    async fn inspect(&self) -> Result<SourceSnapshot, SourceError> {
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| SourceError::Io(format!("{}: {}", self.path.display(), e)))?;

        let snapshot = SourceSnapshot::from_json(&contents)
            .map_err(|e| SourceError::Parse(format!("{}: {}", self.path.display(), e)))?;

        tracing::debug!(
            "loaded {} tables from {}",
            snapshot.tables.len(),
            self.path.display()
        );

        Ok(snapshot)
    }
}
