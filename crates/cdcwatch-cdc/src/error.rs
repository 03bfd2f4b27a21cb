//! Error types for CDC inspection and schema history mining

/// Errors that can occur when inspecting a CDC platform
#[derive(Debug, thiserror::Error)]
pub enum InspectError {
    #[error("HTTP client error: {0}")]
    Client(String),

    #[error("Invalid Kafka Connect URL: {0}")]
    InvalidUrl(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Kafka Connect returned status: {status}")]
    UnexpectedStatus { status: u16 },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Errors that can occur when mining a schema history log
///
/// Never fatal: callers record these as an unavailable history probe.
#[derive(Debug, thiserror::Error)]
pub enum MiningError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Read failed: {0}")]
    Read(String),

    #[error("no kafka brokers provided")]
    NoBrokers,

    #[error("no schemas found in topic {0}")]
    NoSchemasFound(String),

    #[error("Unsupported: {0}")]
    Unsupported(String),
}
