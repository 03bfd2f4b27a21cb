//! Test fixtures for source inspector integration tests

#![allow(dead_code)]

use cdcwatch_core::{Column, Table};
use std::path::{Path, PathBuf};

/// Snapshot file contents for an inventory schema
///
/// `customers` has a primary key and a DDL time; `audit_log` has neither.
pub const INVENTORY_SNAPSHOT: &str = r#"{
  "tables": [
    {
      "name": "customers",
      "columns": [
        {"name": "id", "type": "int", "nullable": false},
        {"name": "email", "type": "varchar(255)", "nullable": false},
        {"name": "nickname", "type": "varchar(64)", "nullable": true}
      ],
      "primaryKey": ["id"],
      "rowCount": 1200,
      "ddlTime": "2024-03-02T00:00:00Z"
    },
    {
      "name": "audit_log",
      "columns": [
        {"name": "entry", "type": "text"}
      ],
      "row_count": 5
    }
  ]
}"#;

/// Write `contents` to `name` inside `dir`
pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

/// The customers table as it appears in `INVENTORY_SNAPSHOT`
pub fn customers_table() -> Table {
    Table::new("customers")
        .with_columns(vec![
            Column::new("id", "int"),
            Column::new("email", "varchar(255)"),
            Column::new("nickname", "varchar(64)").with_nullable(true),
        ])
        .with_primary_key(["id"])
        .with_row_count(1200)
}
