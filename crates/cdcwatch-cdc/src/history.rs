//! Bounded reads of a connector's schema history log
//!
//! A [`ChangeLogSource`] opens a lazy [`ChangeLogStream`] over a topic.
//! [`HistoryMiner`] drains it under a message cap and a wall-clock deadline,
//! handing each payload to a [`SchemaMiner`].

use crate::error::MiningError;
use crate::miner::{DdlPatternMiner, SchemaMiner};
use cdcwatch_core::{HistoryConfig, HistoryLocation, MinedHistory};
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::time::{timeout_at, Instant};

/// One message from a change log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogMessage {
    /// Log-position timestamp
    pub timestamp: DateTime<Utc>,

    /// Opaque payload bytes
    pub payload: Vec<u8>,
}

impl LogMessage {
    pub fn new(timestamp: DateTime<Utc>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            timestamp,
            payload: payload.into(),
        }
    }
}

/// Ordered, lazily-read sequence of log messages
#[async_trait::async_trait]
pub trait ChangeLogStream: Send {
    /// Next message, or `None` at the end of the log
    async fn next_message(&mut self) -> Result<Option<LogMessage>, MiningError>;
}

/// Opens change log streams
#[async_trait::async_trait]
pub trait ChangeLogSource: Send + Sync {
    /// Get the source name (e.g., "kafka")
    fn name(&self) -> &'static str;

    /// Open a stream over `topic` from its earliest retained message
    async fn open(&self, brokers: &[String], topic: &str) -> Result<Box<dyn ChangeLogStream>, MiningError>;
}

/// Drives a bounded read of a history topic through a schema miner
pub struct HistoryMiner {
    miner: Box<dyn SchemaMiner>,
    max_messages: usize,
    timeout: Duration,
}

impl HistoryMiner {
    /// Create a history miner with explicit limits
    pub fn new(miner: Box<dyn SchemaMiner>, max_messages: usize, timeout: Duration) -> Self {
        Self {
            miner,
            max_messages,
            timeout,
        }
    }

    /// Create a history miner from configured limits
    pub fn from_config(miner: Box<dyn SchemaMiner>, config: &HistoryConfig) -> Self {
        Self::new(miner, config.max_messages, Duration::from_millis(config.timeout_ms))
    }

    /// Name of the underlying schema miner
    pub fn miner_name(&self) -> &'static str {
        self.miner.name()
    }

    /// Read the history topic and recover table schemas
    ///
    /// Stops after `max_messages` messages, at the end of the log, on a read
    /// error or when the deadline passes, whichever comes first. Opening the
    /// stream counts against the same deadline.
    pub async fn mine(
        &self,
        source: &dyn ChangeLogSource,
        location: &HistoryLocation,
    ) -> Result<MinedHistory, MiningError> {
        if location.brokers.is_empty() {
            return Err(MiningError::NoBrokers);
        }

        let deadline = Instant::now() + self.timeout;
        let mut stream = timeout_at(deadline, source.open(&location.brokers, &location.topic))
            .await
            .map_err(|_| {
                MiningError::Connection(format!(
                    "timed out opening topic {} after {:?}",
                    location.topic, self.timeout
                ))
            })??;

        let mut history = MinedHistory::default();
        while history.messages_read < self.max_messages {
            let message = match timeout_at(deadline, stream.next_message()).await {
                Ok(Ok(Some(message))) => message,
                Ok(Ok(None)) => break,
                Ok(Err(e)) => {
                    tracing::debug!("stopping history read on {}: {}", location.topic, e);
                    break;
                }
                Err(_) => {
                    tracing::debug!("history read deadline reached on {}", location.topic);
                    break;
                }
            };
            history.messages_read += 1;
            self.record(&mut history, &message);
        }

        tracing::debug!(
            "read {} message(s) from {}, recovered {} table(s)",
            history.messages_read,
            location.topic,
            history.schemas.len()
        );

        if history.schemas.is_empty() {
            return Err(MiningError::NoSchemasFound(location.topic.clone()));
        }
        Ok(history)
    }

    /// Fold one message into the mined history
    fn record(&self, history: &mut MinedHistory, message: &LogMessage) {
        // Non-JSON payloads are skipped
        if serde_json::from_slice::<serde_json::Value>(&message.payload).is_err() {
            return;
        }
        let payload = String::from_utf8_lossy(&message.payload);

        for table in self.miner.mine(&payload) {
            if table.schema.is_empty() {
                continue;
            }
            history.schemas.insert(table.name.clone(), table.schema);
            let seen = history.timestamps.entry(table.name).or_insert(message.timestamp);
            if message.timestamp > *seen {
                *seen = message.timestamp;
            }
        }
    }
}

impl Default for HistoryMiner {
    fn default() -> Self {
        Self::from_config(Box::new(DdlPatternMiner), &HistoryConfig::default())
    }
}
