//! Integration tests for the Debezium inspector
//!
//! These run the inspector against a wiremock Kafka Connect REST API and a
//! mock change log. No Kafka Connect or Kafka cluster is required.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p cdcwatch-cdc --test integration_tests
//! ```

mod fixtures;

use cdcwatch_cdc::{
    CdcInspector, DdlPatternMiner, DebeziumInspector, HistoryMiner, InspectError, MockLogSource,
    SqlDdlMiner,
};
use cdcwatch_core::{CapturedColumn, ChangeKind, Column, Probe, Severity, SourceSnapshot, Table};
use cdcwatch_engine::DriftEngine;
use fixtures::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn inspector(server: &MockServer, log: MockLogSource) -> DebeziumInspector {
    DebeziumInspector::new(server.uri(), Duration::from_secs(5))
        .unwrap()
        .with_log_source(Arc::new(log))
}

// =============================================================================
// Connector health
// =============================================================================

#[tokio::test]
async fn test_warning_sequence_for_failing_task() {
    let server = MockServer::start().await;
    mount_listing(&server, &["foo"]).await;
    mount_config(
        &server,
        "foo",
        json!({"table.include.list": "inventory.customers", "snapshot.mode": "never"}),
    )
    .await;
    mount_status(&server, "foo", "RUNNING", &[(0, "FAILED")]).await;

    let connectors = inspector(&server, MockLogSource::new())
        .inspect_connectors()
        .await
        .unwrap();

    assert_eq!(connectors.len(), 1);
    let foo = &connectors[0];
    assert_eq!(foo.name, "foo");
    assert!(foo.reachable);
    assert_eq!(foo.captured_tables(), vec!["customers"]);
    assert_eq!(
        foo.warnings,
        vec![
            "Connector foo has snapshot.mode=never; snapshots disabled or schema-only (CDC may miss initial data). This check will not attempt to trigger snapshots.",
            "Connector foo health: connector=RUNNING tasks=[0:FAILED]",
            "Connector foo has failed task(s): [0]",
            "Connector foo may be in restart loop: connector RUNNING but tasks failing",
        ]
    );
    assert_eq!(foo.status.available().map(|s| s.failed_tasks()), Some(vec![0]));
    // no history topic configured
    assert_eq!(foo.history, Probe::Skipped);

    // Folded into the report: one snapshot issue, three health issues
    let cdc = cdcwatch_core::CdcResult::from_connectors(&connectors);
    let report = DriftEngine::validate(&SourceSnapshot::default(), Some(&cdc));
    let kinds: Vec<ChangeKind> = report
        .issues
        .iter()
        .filter(|i| i.table.is_none())
        .map(|i| i.kind)
        .collect();
    assert_eq!(
        kinds,
        vec![
            ChangeKind::CdcSnapshotIssue,
            ChangeKind::CdcConnectorUnhealthy,
            ChangeKind::CdcConnectorUnhealthy,
            ChangeKind::CdcConnectorUnhealthy,
        ]
    );
}

#[tokio::test]
async fn test_unreachable_listing_degrades() {
    // Nothing listens on port 1
    let inspector = DebeziumInspector::new("http://127.0.0.1:1", Duration::from_secs(2)).unwrap();

    let connectors = inspector.inspect_connectors().await.unwrap();

    assert_eq!(connectors.len(), 1);
    assert_eq!(connectors[0].name, "");
    assert!(!connectors[0].reachable);
    assert_eq!(connectors[0].warnings.len(), 1);

    let combined = inspector.inspect().await.unwrap();
    assert!(!combined.reachable);
    assert!(combined.captured_tables.is_empty());
}

#[tokio::test]
async fn test_listing_error_status_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/connectors"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = inspector(&server, MockLogSource::new())
        .inspect_connectors()
        .await
        .unwrap_err();

    assert!(matches!(err, InspectError::UnexpectedStatus { status: 500 }));
    assert_eq!(err.to_string(), "Kafka Connect returned status: 500");
}

#[tokio::test]
async fn test_listing_invalid_body_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/connectors"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy error</html>"))
        .mount(&server)
        .await;

    let err = inspector(&server, MockLogSource::new()).inspect().await.unwrap_err();
    assert!(matches!(err, InspectError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_partial_fetch_failure_degrades_one_probe() {
    let server = MockServer::start().await;
    mount_listing(&server, &["broken", "healthy"]).await;
    // no config mounted for "broken": wiremock answers 404
    mount_status(&server, "broken", "RUNNING", &[(0, "RUNNING")]).await;
    mount_config(&server, "healthy", json!({"table.include.list": "inventory.orders"})).await;
    // no status mounted for "healthy"

    let connectors = inspector(&server, MockLogSource::new())
        .inspect_connectors()
        .await
        .unwrap();

    assert_eq!(connectors.len(), 2);

    let broken = &connectors[0];
    assert!(broken.reachable);
    assert_eq!(
        broken.config.unavailable_reason(),
        Some("Kafka Connect returned status: 404")
    );
    assert!(broken.status.is_available());
    assert_eq!(broken.warnings, vec!["Connector broken health: connector=RUNNING tasks=[0:RUNNING]"]);
    assert!(broken.captured_tables().is_empty());

    let healthy = &connectors[1];
    assert_eq!(healthy.captured_tables(), vec!["orders"]);
    assert!(healthy.status.unavailable_reason().is_some());
    assert!(healthy.warnings.is_empty());
}

#[tokio::test]
async fn test_connector_name_is_percent_encoded_in_paths() {
    let server = MockServer::start().await;
    mount_listing(&server, &["eu/orders v2"]).await;
    mount_config(&server, "eu%2Forders%20v2", json!({"table.include.list": "shop.orders"})).await;
    mount_status(&server, "eu%2Forders%20v2", "RUNNING", &[(0, "RUNNING")]).await;

    let connectors = inspector(&server, MockLogSource::new())
        .inspect_connectors()
        .await
        .unwrap();

    assert_eq!(connectors.len(), 1);
    assert_eq!(connectors[0].name, "eu/orders v2");
    assert_eq!(connectors[0].captured_tables(), vec!["orders"]);
    assert!(connectors[0].status.is_available());
}

// =============================================================================
// Schema history
// =============================================================================

#[tokio::test]
async fn test_history_is_mined_and_merged_into_captured_tables() {
    let server = MockServer::start().await;
    mount_listing(&server, &["inventory"]).await;
    mount_config(&server, "inventory", inventory_config("inventory.customers")).await;
    mount_status(&server, "inventory", "RUNNING", &[(0, "RUNNING")]).await;

    let log = MockLogSource::new();
    log.add_messages(
        HISTORY_TOPIC,
        vec![
            create_table_record(ts(1), "CREATE TABLE `customers` (\n  `id` int NOT NULL,\n  `email` varchar(255) NOT NULL,\n  PRIMARY KEY (`id`)\n)"),
            create_table_record(ts(3), "CREATE TABLE `audit_log` (`id` bigint NOT NULL, `note` text NULL)"),
            create_table_record(ts(2), "CREATE TABLE `customers` (`id` int NOT NULL, `email` varchar(255) NOT NULL, `phone` varchar(32) NULL)"),
        ],
    )
    .await;

    let connectors = inspector(&server, log).inspect_connectors().await.unwrap();
    let inventory = &connectors[0];

    let history = inventory.history.available().expect("history mined");
    assert_eq!(history.messages_read, 3);
    assert_eq!(
        history.schemas["customers"].columns["phone"],
        CapturedColumn::new("VARCHAR(32)", true)
    );
    assert_eq!(history.timestamps["customers"], ts(2));
    assert_eq!(history.timestamps["audit_log"], ts(3));
    assert_eq!(inventory.captured_tables(), vec!["customers", "audit_log"]);
}

#[tokio::test]
async fn test_history_miss_is_recorded_not_fatal() {
    let server = MockServer::start().await;
    mount_listing(&server, &["inventory"]).await;
    mount_config(&server, "inventory", inventory_config("inventory.customers")).await;
    mount_status(&server, "inventory", "RUNNING", &[(0, "RUNNING")]).await;

    let log = MockLogSource::new();
    log.add_messages(HISTORY_TOPIC, vec![create_table_record(ts(1), "DROP TABLE `old`")])
        .await;

    let connectors = inspector(&server, log).inspect_connectors().await.unwrap();
    let inventory = &connectors[0];

    assert_eq!(
        inventory.history.unavailable_reason(),
        Some("no schemas found in topic schema-changes.inventory")
    );
    assert!(inventory.table_schemas().is_none());
    assert_eq!(inventory.captured_tables(), vec!["customers"]);
}

#[tokio::test]
async fn test_history_connection_failure_is_recorded() {
    let server = MockServer::start().await;
    mount_listing(&server, &["inventory"]).await;
    mount_config(&server, "inventory", inventory_config("inventory.customers")).await;
    mount_status(&server, "inventory", "RUNNING", &[]).await;

    let log = MockLogSource::new().with_connection_failure();
    let connectors = inspector(&server, log).inspect_connectors().await.unwrap();

    assert!(connectors[0]
        .history
        .unavailable_reason()
        .is_some_and(|reason| reason.starts_with("Connection failed")));
}

#[tokio::test]
async fn test_history_disabled() {
    let server = MockServer::start().await;
    mount_listing(&server, &["inventory"]).await;
    mount_config(&server, "inventory", inventory_config("inventory.customers")).await;
    mount_status(&server, "inventory", "RUNNING", &[(0, "RUNNING")]).await;

    let connectors = inspector(&server, MockLogSource::new())
        .without_history()
        .inspect_connectors()
        .await
        .unwrap();

    assert_eq!(connectors[0].history, Probe::Skipped);
}

#[tokio::test]
async fn test_sqlparser_miner_through_inspector() {
    let server = MockServer::start().await;
    mount_listing(&server, &["inventory"]).await;
    mount_config(&server, "inventory", inventory_config("inventory.orders")).await;
    mount_status(&server, "inventory", "RUNNING", &[(0, "RUNNING")]).await;

    let log = MockLogSource::new();
    log.add_messages(
        HISTORY_TOPIC,
        vec![create_table_record(ts(1), "CREATE TABLE orders (id BIGINT NOT NULL, status VARCHAR(32))")],
    )
    .await;

    let connectors = inspector(&server, log)
        .with_history_miner(HistoryMiner::new(Box::new(SqlDdlMiner), 500, Duration::from_secs(3)))
        .inspect_connectors()
        .await
        .unwrap();

    let schemas = connectors[0].table_schemas().expect("history mined");
    assert_eq!(schemas["orders"].columns["status"], CapturedColumn::new("VARCHAR(32)", true));
}

// =============================================================================
// End to end
// =============================================================================

#[tokio::test]
async fn test_drift_against_mined_history() {
    let server = MockServer::start().await;
    mount_listing(&server, &["inventory"]).await;
    mount_config(&server, "inventory", inventory_config("inventory.customers")).await;
    mount_status(&server, "inventory", "RUNNING", &[(0, "RUNNING")]).await;

    let log = MockLogSource::new();
    log.add_messages(
        HISTORY_TOPIC,
        vec![create_table_record(
            ts(1),
            "CREATE TABLE `customers` (`id` int NOT NULL, `email` varchar(255) NOT NULL, `legacy` tinyint NOT NULL)",
        )],
    )
    .await;

    let cdc = inspector(&server, log)
        .with_history_miner(HistoryMiner::new(Box::new(DdlPatternMiner), 500, Duration::from_secs(3)))
        .inspect()
        .await
        .unwrap();

    let source = SourceSnapshot::from_tables(vec![Table::new("customers")
        .with_columns(vec![
            Column::new("id", "int"),
            Column::new("email", "varchar(255)"),
            Column::new("phone", "varchar(32)").with_nullable(true),
        ])
        .with_primary_key(["id"])
        .with_ddl_time(ts(2))]);

    let report = DriftEngine::validate(&source, Some(&cdc));

    let shape: Vec<(Severity, ChangeKind, Option<&str>)> = report
        .issues
        .iter()
        .map(|i| (i.severity, i.kind, i.column.as_deref()))
        .collect();
    assert_eq!(
        shape,
        vec![
            (Severity::Info, ChangeKind::ColumnAdded, Some("phone")),
            (Severity::Block, ChangeKind::ColumnRemoved, Some("legacy")),
            (Severity::Warn, ChangeKind::CdcSchemaStale, None),
            (Severity::Warn, ChangeKind::CdcConnectorUnhealthy, None),
        ]
    );
    assert_eq!(report.blocking_count(), 1);
}
