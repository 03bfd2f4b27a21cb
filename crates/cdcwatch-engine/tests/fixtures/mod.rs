//! Test fixtures for drift engine integration tests
//!
//! Source tables and matching CDC schemas modelled on a small
//! e-commerce database.

#![allow(dead_code)]

use cdcwatch_core::{CdcResult, Column, SourceSnapshot, Table, TableSchema};
use chrono::{DateTime, TimeZone, Utc};

/// Create a typical users table
pub fn users_table() -> Table {
    Table::new("users")
        .with_columns(vec![
            Column::new("id", "bigint"),
            Column::new("email", "varchar(255)"),
            Column::new("name", "varchar(128)").with_nullable(true),
            Column::new("created_at", "datetime"),
        ])
        .with_primary_key(["id"])
        .with_row_count(1_000)
}

/// Create a typical orders table
pub fn orders_table() -> Table {
    Table::new("orders")
        .with_columns(vec![
            Column::new("id", "bigint"),
            Column::new("user_id", "bigint"),
            Column::new("total_amount", "decimal(10,2)"),
            Column::new("status", "varchar(32)"),
        ])
        .with_primary_key(["id"])
        .with_row_count(5_000)
}

/// An append-only log table without a primary key
pub fn events_table() -> Table {
    Table::new("events")
        .with_columns(vec![
            Column::new("ts", "datetime"),
            Column::new("payload", "json").with_nullable(true),
        ])
        .with_row_count(100_000)
}

/// Single-table source with a primary key on `a`
pub fn single_table(columns: Vec<Column>) -> SourceSnapshot {
    SourceSnapshot::from_tables(vec![Table::new("t1").with_columns(columns).with_primary_key(["a"])])
}

/// CDC result capturing only `t1` with the given schema
pub fn captured_t1(schema: TableSchema) -> CdcResult {
    CdcResult::default().with_table_schema("t1", schema)
}

/// CDC result mirroring every source table exactly
pub fn mirrored(source: &SourceSnapshot) -> CdcResult {
    source
        .tables
        .iter()
        .fold(CdcResult::default(), |cdc, table| {
            cdc.with_table_schema(&table.name, TableSchema::from_table(table))
        })
}

pub fn ts(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, day, hour, 0, 0).unwrap()
}
