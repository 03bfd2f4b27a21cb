//! Build the configured source inspector

use crate::adapter::{SourceError, SourceInspector};
use crate::mysql::MySqlSource;
use crate::postgres::PostgresSource;
use crate::snapshot::SnapshotFileSource;
use cdcwatch_core::Config;

/// Create the source inspector described by `config.source`
///
/// Relative snapshot paths resolve against the config file's directory.
/// Database sources connect eagerly, so connection failures surface here.
pub async fn source_from_config(config: &Config) -> Result<Box<dyn SourceInspector>, SourceError> {
    let source = &config.source;

    match source.source_type.trim() {
        "snapshot" => {
            let path = source
                .path
                .as_ref()
                .ok_or_else(|| SourceError::Config("source.path is required for snapshot sources".to_string()))?;
            Ok(Box::new(SnapshotFileSource::new(config.resolve_path(path))))
        }
        "mysql" => {
            let (dsn, schema) = connection_settings(config, "mysql")?;

            tracing::info!("connecting to MySQL source (schema {}, tls={})", schema, source.tls);
            let inspector = if source.tls {
                MySqlSource::connect_with_tls(dsn, schema).await?
            } else {
                MySqlSource::connect(dsn, schema).await?
            };
            Ok(Box::new(inspector))
        }
        "postgres" => {
            let (dsn, schema) = connection_settings(config, "postgres")?;

            tracing::info!("connecting to PostgreSQL source (schema {}, tls={})", schema, source.tls);
            let inspector = if source.tls {
                PostgresSource::connect_with_tls(dsn, schema).await?
            } else {
                PostgresSource::connect(dsn, schema).await?
            };
            Ok(Box::new(inspector))
        }
        other => Err(SourceError::Config(format!(
            "unsupported source.type '{}': expected snapshot, mysql or postgres",
            other
        ))),
    }
}

/// `source.dsn` and `source.schema`, both required for database sources
fn connection_settings<'a>(config: &'a Config, kind: &str) -> Result<(&'a str, &'a str), SourceError> {
    let dsn = config
        .source
        .dsn
        .as_deref()
        .ok_or_else(|| SourceError::Config(format!("source.dsn is required for {} sources", kind)))?;
    let schema = config
        .source
        .schema
        .as_deref()
        .ok_or_else(|| SourceError::Config(format!("source.schema is required for {} sources", kind)))?;
    Ok((dsn, schema))
}
