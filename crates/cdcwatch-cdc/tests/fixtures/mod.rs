//! Test fixtures for CDC inspector integration tests
//!
//! Helpers that stand up a fake Kafka Connect REST API with wiremock and
//! Debezium-style schema history records for the mock change log.

#![allow(dead_code)]

use cdcwatch_cdc::LogMessage;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const HISTORY_TOPIC: &str = "schema-changes.inventory";

/// Mount `GET /connectors` returning the given names
pub async fn mount_listing(server: &MockServer, names: &[&str]) {
    Mock::given(method("GET"))
        .and(path("/connectors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(names)))
        .mount(server)
        .await;
}

/// Mount `GET /connectors/{name}` returning a config map
pub async fn mount_config(server: &MockServer, name: &str, config: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/connectors/{}", name)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": name,
            "config": config,
            "type": "source"
        })))
        .mount(server)
        .await;
}

/// Mount `GET /connectors/{name}/status`
pub async fn mount_status(server: &MockServer, name: &str, state: &str, tasks: &[(u32, &str)]) {
    let tasks: Vec<Value> = tasks
        .iter()
        .map(|(id, state)| json!({"id": id, "state": state, "worker_id": "connect:8083"}))
        .collect();
    Mock::given(method("GET"))
        .and(path(format!("/connectors/{}/status", name)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": name,
            "connector": {"state": state, "worker_id": "connect:8083"},
            "tasks": tasks,
            "type": "source"
        })))
        .mount(server)
        .await;
}

/// Typical MySQL connector config with schema history on Kafka
pub fn inventory_config(tables: &str) -> Value {
    json!({
        "connector.class": "io.debezium.connector.mysql.MySqlConnector",
        "database.hostname": "mysql",
        "table.include.list": tables,
        "snapshot.mode": "initial",
        "schema.history.internal.kafka.topic": HISTORY_TOPIC,
        "schema.history.internal.kafka.bootstrap.servers": "kafka:9092"
    })
}

/// A Debezium schema history record carrying a CREATE TABLE statement
pub fn create_table_record(ts: DateTime<Utc>, ddl: &str) -> LogMessage {
    let record = json!({
        "source": {"server": "dbserver1"},
        "position": {"file": "mysql-bin.000003", "pos": 154},
        "databaseName": "inventory",
        "ddl": ddl
    });
    LogMessage::new(ts, record.to_string())
}

pub fn ts(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, day, 12, 0, 0).unwrap()
}
