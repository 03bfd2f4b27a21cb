//! Mock inspector and change log for testing
//!
//! Neither connects to anything. They are useful for:
//! - Unit testing history mining without a Kafka cluster
//! - Integration testing the drift pipeline end to end
//! - Simulating unreachable platforms and slow logs
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cdcwatch_cdc::{MockInspector, MockLogSource, LogMessage};
//!
//! let inspector = MockInspector::new();
//! inspector.add_connector(ConnectorResult::new("inventory")).await;
//! let combined = inspector.inspect().await?;
//!
//! let log = MockLogSource::new().with_latency(100); // 100ms per message
//! log.add_messages("schema-changes.inventory", messages).await;
//! ```

use crate::error::{InspectError, MiningError};
use crate::history::{ChangeLogSource, ChangeLogStream, LogMessage};
use crate::inspector::CdcInspector;
use cdcwatch_core::ConnectorResult;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Mock CDC inspector returning predefined connector results
pub struct MockInspector {
    /// Connector results, in listing order
    connectors: Arc<RwLock<Vec<ConnectorResult>>>,

    /// Status to fail the listing with
    fail_status: Option<u16>,

    /// Simulated latency (milliseconds)
    latency_ms: u64,
}

impl MockInspector {
    /// Create a mock inspector with no connectors
    pub fn new() -> Self {
        Self {
            connectors: Arc::new(RwLock::new(Vec::new())),
            fail_status: None,
            latency_ms: 0,
        }
    }

    /// Create a mock inspector from connector results
    pub fn from_connectors(connectors: Vec<ConnectorResult>) -> Self {
        Self {
            connectors: Arc::new(RwLock::new(connectors)),
            ..Self::new()
        }
    }

    /// Add a connector result
    pub async fn add_connector(&self, connector: ConnectorResult) {
        self.connectors.write().await.push(connector);
    }

    /// Fail the listing with an unexpected HTTP status
    pub fn with_listing_failure(mut self, status: u16) -> Self {
        self.fail_status = Some(status);
        self
    }

    /// Configure simulated latency for the listing
    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    /// Get the number of connectors
    pub async fn connector_count(&self) -> usize {
        self.connectors.read().await.len()
    }
}

impl Default for MockInspector {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MockInspector {
    fn clone(&self) -> Self {
        Self {
            connectors: Arc::clone(&self.connectors),
            fail_status: self.fail_status,
            latency_ms: self.latency_ms,
        }
    }
}

#[async_trait::async_trait]
impl CdcInspector for MockInspector {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn inspect_connectors(&self) -> Result<Vec<ConnectorResult>, InspectError> {
        simulate_latency(self.latency_ms).await;

        if let Some(status) = self.fail_status {
            return Err(InspectError::UnexpectedStatus { status });
        }

        Ok(self.connectors.read().await.clone())
    }
}

/// Mock change log serving predefined messages per topic
pub struct MockLogSource {
    /// Messages by topic
    topics: Arc<RwLock<HashMap<String, Vec<LogMessage>>>>,

    /// Simulate connection failure
    fail_connection: bool,

    /// Simulated latency per message (milliseconds)
    latency_ms: u64,
}

impl MockLogSource {
    /// Create a mock log with no topics
    pub fn new() -> Self {
        Self {
            topics: Arc::new(RwLock::new(HashMap::new())),
            fail_connection: false,
            latency_ms: 0,
        }
    }

    /// Append messages to a topic
    pub async fn add_messages(&self, topic: &str, messages: Vec<LogMessage>) {
        self.topics
            .write()
            .await
            .entry(topic.to_string())
            .or_default()
            .extend(messages);
    }

    /// Configure to fail every open
    pub fn with_connection_failure(mut self) -> Self {
        self.fail_connection = true;
        self
    }

    /// Configure simulated latency before each message
    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }
}

impl Default for MockLogSource {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MockLogSource {
    fn clone(&self) -> Self {
        Self {
            topics: Arc::clone(&self.topics),
            fail_connection: self.fail_connection,
            latency_ms: self.latency_ms,
        }
    }
}

#[async_trait::async_trait]
impl ChangeLogSource for MockLogSource {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn open(&self, brokers: &[String], topic: &str) -> Result<Box<dyn ChangeLogStream>, MiningError> {
        if self.fail_connection {
            return Err(MiningError::Connection(format!(
                "simulated connection failure to {}",
                brokers.join(",")
            )));
        }

        let topics = self.topics.read().await;
        let messages = topics
            .get(topic)
            .ok_or_else(|| MiningError::Connection(format!("unknown topic {}", topic)))?;

        Ok(Box::new(MockLogStream {
            messages: messages.iter().cloned().collect(),
            latency_ms: self.latency_ms,
        }))
    }
}

struct MockLogStream {
    messages: VecDeque<LogMessage>,
    latency_ms: u64,
}

#[async_trait::async_trait]
impl ChangeLogStream for MockLogStream {
    async fn next_message(&mut self) -> Result<Option<LogMessage>, MiningError> {
        simulate_latency(self.latency_ms).await;
        Ok(self.messages.pop_front())
    }
}

async fn simulate_latency(latency_ms: u64) {
    if latency_ms > 0 {
        tokio::time::sleep(Duration::from_millis(latency_ms)).await;
    }
}
