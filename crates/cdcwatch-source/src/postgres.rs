//! PostgreSQL source inspector using information_schema
//!
//! Lists the base tables of one schema and, for each, reads its columns
//! from `information_schema.columns`, its primary key from
//! `information_schema.table_constraints`, and its current row count.
//! PostgreSQL keeps no DDL timestamp, so `ddl_time` is always unset and the
//! staleness check never fires for this source.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let source = PostgresSource::connect(
//!     "host=localhost port=5432 dbname=inventory user=postgres password=secret",
//!     "public",
//! ).await?;
//!
//! // With TLS
//! let source = PostgresSource::connect_with_tls(dsn, "public").await?;
//! ```

use crate::adapter::{SourceError, SourceInspector};
use cdcwatch_core::SourceSnapshot;

#[cfg(feature = "postgres")]
use cdcwatch_core::{Column, Table};

#[cfg(feature = "postgres")]
use tokio_postgres::{Client, Config as PgConfig, NoTls};

#[cfg(feature = "postgres")]
use postgres_native_tls::MakeTlsConnector;

#[cfg(feature = "postgres")]
use native_tls::TlsConnector;

#[cfg(feature = "postgres")]
const TABLES_QUERY: &str = r#"
    SELECT table_name::text
    FROM information_schema.tables
    WHERE table_schema = $1
      AND table_type = 'BASE TABLE'
    ORDER BY table_name
"#;

#[cfg(feature = "postgres")]
const COLUMNS_QUERY: &str = r#"
    SELECT
        column_name::text,
        data_type::text,
        is_nullable::text,
        udt_name::text,
        character_maximum_length::int4,
        numeric_precision::int4,
        numeric_scale::int4
    FROM information_schema.columns
    WHERE table_schema = $1
      AND table_name = $2
    ORDER BY ordinal_position
"#;

#[cfg(feature = "postgres")]
const PRIMARY_KEY_QUERY: &str = r#"
    SELECT kcu.column_name::text
    FROM information_schema.table_constraints tc
    JOIN information_schema.key_column_usage kcu
      ON tc.constraint_name = kcu.constraint_name
     AND tc.table_schema = kcu.table_schema
     AND tc.table_name = kcu.table_name
    WHERE tc.constraint_type = 'PRIMARY KEY'
      AND tc.table_schema = $1
      AND tc.table_name = $2
    ORDER BY kcu.ordinal_position
"#;

#[cfg(not(feature = "postgres"))]
const NOT_COMPILED: &str =
    "PostgreSQL support not compiled. Rebuild with: cargo build --features postgres";

/// PostgreSQL source inspector
pub struct PostgresSource {
    /// PostgreSQL client (only available with postgres feature)
    #[cfg(feature = "postgres")]
    client: Client,

    /// Schema being inspected
    schema: String,
}

impl PostgresSource {
    /// Connect without TLS
    #[cfg(feature = "postgres")]
    pub async fn connect(dsn: &str, schema: impl Into<String>) -> Result<Self, SourceError> {
        let target = describe_target(dsn)?;

        let (client, connection) = tokio_postgres::connect(dsn, NoTls)
            .await
            .map_err(|e| SourceError::Connection(format!("Failed to connect to {}: {}", target, e)))?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!("PostgreSQL connection error ({}): {}", target, e);
            }
        });

        Ok(Self {
            client,
            schema: schema.into(),
        })
    }

    /// Connect over TLS
    #[cfg(feature = "postgres")]
    pub async fn connect_with_tls(dsn: &str, schema: impl Into<String>) -> Result<Self, SourceError> {
        let target = describe_target(dsn)?;

        let connector = TlsConnector::builder()
            .build()
            .map_err(|e| SourceError::Config(format!("Failed to create TLS connector: {}", e)))?;
        let tls = MakeTlsConnector::new(connector);

        let (client, connection) = tokio_postgres::connect(dsn, tls)
            .await
            .map_err(|e| {
                SourceError::Connection(format!("Failed to connect to {} with TLS: {}", target, e))
            })?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!("PostgreSQL TLS connection error ({}): {}", target, e);
            }
        });

        Ok(Self {
            client,
            schema: schema.into(),
        })
    }

    /// Create source without postgres feature (returns error)
    #[cfg(not(feature = "postgres"))]
    pub async fn connect(_dsn: &str, _schema: impl Into<String>) -> Result<Self, SourceError> {
        Err(SourceError::Config(NOT_COMPILED.to_string()))
    }

    /// Create source without postgres feature (returns error)
    #[cfg(not(feature = "postgres"))]
    pub async fn connect_with_tls(_dsn: &str, _schema: impl Into<String>) -> Result<Self, SourceError> {
        Err(SourceError::Config(NOT_COMPILED.to_string()))
    }

    /// Get the inspected schema name
    pub fn schema(&self) -> &str {
        &self.schema
    }

    #[cfg(feature = "postgres")]
    async fn fetch_table(&self, name: String) -> Result<Table, SourceError> {
        let rows = self
            .client
            .query(COLUMNS_QUERY, &[&self.schema, &name])
            .await
            .map_err(|e| SourceError::Query(format!("columns of {}: {}", name, e)))?;

        let columns = rows
            .iter()
            .map(|row| {
                let column_name: String = row.get(0);
                let data_type: String = row.get(1);
                let is_nullable: String = row.get(2);
                let udt_name: String = row.get(3);
                let char_length: Option<i32> = row.get(4);
                let precision: Option<i32> = row.get(5);
                let scale: Option<i32> = row.get(6);

                Column::new(
                    column_name,
                    full_type(&data_type, &udt_name, char_length, precision, scale),
                )
                .with_nullable(is_nullable.eq_ignore_ascii_case("YES"))
            })
            .collect();

        let primary_key: Vec<String> = self
            .client
            .query(PRIMARY_KEY_QUERY, &[&self.schema, &name])
            .await
            .map_err(|e| SourceError::Query(format!("primary key of {}: {}", name, e)))?
            .iter()
            .map(|row| row.get(0))
            .collect();

        let count_query = format!(
            "SELECT COUNT(*) FROM {}.{}",
            quote_ident(&self.schema),
            quote_ident(&name)
        );
        let row_count: i64 = self
            .client
            .query_one(count_query.as_str(), &[])
            .await
            .map_err(|e| SourceError::Query(format!("row count of {}: {}", name, e)))?
            .get(0);

        Ok(Table::new(name)
            .with_columns(columns)
            .with_primary_key(primary_key)
            .with_row_count(row_count))
    }
}

#[async_trait::async_trait]
impl SourceInspector for PostgresSource {
    fn name(&self) -> &'static str {
        "PostgreSQL"
    }

    #[cfg(feature = "postgres")]
    async fn inspect(&self) -> Result<SourceSnapshot, SourceError> {
        let names: Vec<String> = self
            .client
            .query(TABLES_QUERY, &[&self.schema])
            .await
            .map_err(|e| SourceError::Query(format!("tables of {}: {}", self.schema, e)))?
            .iter()
            .map(|row| row.get(0))
            .collect();

        tracing::debug!("inspecting {} tables in schema {}", names.len(), self.schema);

        let mut tables = Vec::with_capacity(names.len());
        for name in names {
            tables.push(self.fetch_table(name).await?);
        }

        Ok(SourceSnapshot::from_tables(tables))
    }

    #[cfg(not(feature = "postgres"))]
    async fn inspect(&self) -> Result<SourceSnapshot, SourceError> {
        Err(SourceError::Config(NOT_COMPILED.to_string()))
    }
}

/// Describe the connection target for messages, without credentials
#[cfg(feature = "postgres")]
fn describe_target(dsn: &str) -> Result<String, SourceError> {
    let config: PgConfig = dsn
        .parse()
        .map_err(|e| SourceError::Config(format!("Invalid connection string: {}", e)))?;

    let host = config
        .get_hosts()
        .first()
        .map(|h| format!("{:?}", h))
        .unwrap_or_else(|| "localhost".to_string());
    let port = config.get_ports().first().copied().unwrap_or(5432);
    let database = config.get_dbname().unwrap_or("postgres");

    Ok(format!("{}:{}/{}", host, port, database))
}

/// Render a column type the way the source declares it
///
/// Keeps length, precision and scale so that `varchar(64)` and
/// `varchar(255)` compare as different types.
#[cfg(any(feature = "postgres", test))]
fn full_type(
    data_type: &str,
    udt_name: &str,
    char_length: Option<i32>,
    precision: Option<i32>,
    scale: Option<i32>,
) -> String {
    match data_type {
        "character varying" | "character" => match char_length {
            Some(len) => format!("{}({})", data_type, len),
            None => data_type.to_string(),
        },
        "numeric" => match (precision, scale) {
            (Some(p), Some(s)) => format!("numeric({},{})", p, s),
            (Some(p), None) => format!("numeric({})", p),
            _ => data_type.to_string(),
        },
        "ARRAY" => match udt_name.strip_prefix('_') {
            Some(element) => format!("{}[]", element),
            None => udt_name.to_string(),
        },
        "USER-DEFINED" => udt_name.to_string(),
        _ => data_type.to_string(),
    }
}

/// Quote an identifier for interpolation into SQL
#[cfg(any(feature = "postgres", test))]
fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_type() {
        assert_eq!(full_type("integer", "int4", None, Some(32), Some(0)), "integer");
        assert_eq!(
            full_type("character varying", "varchar", Some(255), None, None),
            "character varying(255)"
        );
        assert_eq!(full_type("text", "text", None, None, None), "text");
        assert_eq!(full_type("numeric", "numeric", None, Some(10), Some(2)), "numeric(10,2)");
        assert_eq!(full_type("numeric", "numeric", None, None, None), "numeric");
        assert_eq!(full_type("ARRAY", "_int4", None, None, None), "int4[]");
        assert_eq!(full_type("USER-DEFINED", "citext", None, None, None), "citext");
    }

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("orders"), "\"orders\"");
        assert_eq!(quote_ident("odd\"name"), "\"odd\"\"name\"");
    }

    #[cfg(not(feature = "postgres"))]
    #[tokio::test]
    async fn test_connect_without_feature() {
        let result = PostgresSource::connect("host=localhost", "public").await;
        match result {
            Err(SourceError::Config(msg)) => assert!(msg.contains("--features postgres")),
            _ => panic!("expected a configuration error"),
        }
    }

    #[cfg(feature = "postgres")]
    #[tokio::test]
    async fn test_rejects_malformed_dsn() {
        let result = PostgresSource::connect("host='unterminated", "public").await;
        assert!(matches!(result, Err(SourceError::Config(_))));
    }
}
