//! Inspector traits for CDC platforms
//!
//! Every inspector reports per connector. Inspectors that can only produce
//! one combined view implement [`LegacyInspector`] and are lifted with
//! [`SingleResultAdapter`].

use crate::error::InspectError;
use cdcwatch_core::{CdcResult, ConnectorResult};

/// Trait for CDC platform inspectors
#[async_trait::async_trait]
pub trait CdcInspector: Send + Sync {
    /// Get the inspector name (e.g., "debezium")
    fn name(&self) -> &'static str;

    /// Inspect every connector on the platform
    ///
    /// Per-connector fetch failures are recorded inside the returned
    /// results. An error here means the platform itself answered
    /// unexpectedly.
    async fn inspect_connectors(&self) -> Result<Vec<ConnectorResult>, InspectError>;

    /// Inspect and union all connectors into one view
    async fn inspect(&self) -> Result<CdcResult, InspectError> {
        let connectors = self.inspect_connectors().await?;
        Ok(CdcResult::from_connectors(&connectors))
    }
}

/// Inspector that only produces a single combined result
#[async_trait::async_trait]
pub trait LegacyInspector: Send + Sync {
    fn name(&self) -> &'static str;

    async fn inspect(&self) -> Result<CdcResult, InspectError>;
}

/// Lifts a [`LegacyInspector`] into a [`CdcInspector`]
///
/// The combined result is reported as one connector with an empty name.
pub struct SingleResultAdapter<I> {
    inner: I,
}

impl<I: LegacyInspector> SingleResultAdapter<I> {
    pub fn new(inner: I) -> Self {
        Self { inner }
    }

    /// Unwrap the legacy inspector
    pub fn into_inner(self) -> I {
        self.inner
    }
}

#[async_trait::async_trait]
impl<I: LegacyInspector> CdcInspector for SingleResultAdapter<I> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn inspect_connectors(&self) -> Result<Vec<ConnectorResult>, InspectError> {
        let combined = self.inner.inspect().await?;
        Ok(vec![ConnectorResult::from_combined(combined)])
    }
}
