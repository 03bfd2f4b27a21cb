//! cdcwatch source schema providers
//!
//! Inspectors that produce the authoritative `SourceSnapshot`:
//! - JSON snapshot files (default)
//! - MySQL `INFORMATION_SCHEMA`
//! - PostgreSQL `information_schema`
//! - Mock source for testing
//!
//! ## Features
//!
//! - `mysql` - MySQL support (with optional TLS)
//! - `postgres` - PostgreSQL support (with optional TLS)
//!
//! ## Example
//!
//! ```rust,ignore
//! use cdcwatch_source::{source_from_config, SourceInspector};
//!
//! let source = source_from_config(&config).await?;
//! let snapshot = source.inspect().await?;
//! ```

pub mod adapter;
pub mod snapshot;
pub mod mysql;
pub mod postgres;
pub mod mock;
pub mod factory;

pub use adapter::{SourceError, SourceInspector};
pub use snapshot::SnapshotFileSource;
pub use mysql::MySqlSource;
pub use postgres::PostgresSource;
pub use mock::MockSource;
pub use factory::source_from_config;
