//! Kafka reader for schema history topics
//!
//! Reads partition 0 of the history topic from the earliest retained offset
//! up to the high watermark seen when the stream was opened. Debezium keeps
//! schema history in a single-partition topic.
//!
//! ## Feature flag
//!
//! This module requires the `kafka` feature (on by default). Without it,
//! opening a stream reports the history as unsupported.

use crate::error::MiningError;
use crate::history::{ChangeLogSource, ChangeLogStream};

#[cfg(feature = "kafka")]
use crate::history::LogMessage;
#[cfg(feature = "kafka")]
use rskafka::client::partition::{OffsetAt, PartitionClient, UnknownTopicHandling};
#[cfg(feature = "kafka")]
use rskafka::client::ClientBuilder;
#[cfg(feature = "kafka")]
use std::collections::VecDeque;

/// Upper bound on bytes fetched per request
#[cfg(feature = "kafka")]
const MAX_FETCH_BYTES: i32 = 10 * 1024 * 1024;

/// How long the broker may wait for data per fetch
#[cfg(feature = "kafka")]
const FETCH_MAX_WAIT_MS: i32 = 500;

/// Change log source backed by Kafka
#[derive(Debug, Clone, Copy, Default)]
pub struct KafkaLogSource;

impl KafkaLogSource {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(feature = "kafka")]
#[async_trait::async_trait]
impl ChangeLogSource for KafkaLogSource {
    fn name(&self) -> &'static str {
        "kafka"
    }

    async fn open(&self, brokers: &[String], topic: &str) -> Result<Box<dyn ChangeLogStream>, MiningError> {
        if brokers.is_empty() {
            return Err(MiningError::NoBrokers);
        }

        let client = ClientBuilder::new(brokers.to_vec())
            .build()
            .await
            .map_err(|e| MiningError::Connection(format!("Failed to connect to {}: {}", brokers.join(","), e)))?;

        let partition = client
            .partition_client(topic, 0, UnknownTopicHandling::Error)
            .await
            .map_err(|e| MiningError::Connection(format!("Failed to open topic {}: {}", topic, e)))?;

        let earliest = partition
            .get_offset(OffsetAt::Earliest)
            .await
            .map_err(|e| MiningError::Read(format!("Failed to get earliest offset: {}", e)))?;
        let latest = partition
            .get_offset(OffsetAt::Latest)
            .await
            .map_err(|e| MiningError::Read(format!("Failed to get latest offset: {}", e)))?;

        tracing::debug!("reading {} from offset {} to {}", topic, earliest, latest);

        Ok(Box::new(KafkaLogStream {
            partition,
            next_offset: earliest,
            end_offset: latest,
            buffer: VecDeque::new(),
        }))
    }
}

#[cfg(feature = "kafka")]
struct KafkaLogStream {
    partition: PartitionClient,
    next_offset: i64,
    end_offset: i64,
    buffer: VecDeque<LogMessage>,
}

#[cfg(feature = "kafka")]
#[async_trait::async_trait]
impl ChangeLogStream for KafkaLogStream {
    async fn next_message(&mut self) -> Result<Option<LogMessage>, MiningError> {
        loop {
            if let Some(message) = self.buffer.pop_front() {
                return Ok(Some(message));
            }
            if self.next_offset >= self.end_offset {
                return Ok(None);
            }

            let (records, _high_watermark) = self
                .partition
                .fetch_records(self.next_offset, 1..MAX_FETCH_BYTES, FETCH_MAX_WAIT_MS)
                .await
                .map_err(|e| MiningError::Read(format!("Failed to fetch records: {}", e)))?;

            if records.is_empty() {
                return Ok(None);
            }

            for record_and_offset in records {
                self.next_offset = record_and_offset.offset + 1;
                let record = record_and_offset.record;
                // Tombstones carry no payload
                if let Some(value) = record.value {
                    self.buffer.push_back(LogMessage::new(record.timestamp, value));
                }
            }
        }
    }
}

#[cfg(not(feature = "kafka"))]
#[async_trait::async_trait]
impl ChangeLogSource for KafkaLogSource {
    fn name(&self) -> &'static str {
        "kafka"
    }

    async fn open(&self, _brokers: &[String], _topic: &str) -> Result<Box<dyn ChangeLogStream>, MiningError> {
        Err(MiningError::Unsupported(
            "Kafka support not compiled. Rebuild with --features kafka".to_string(),
        ))
    }
}
