//! Drift detection engine comparing the source schema with the CDC view
//!
//! The source snapshot is authoritative. The CDC result says which tables
//! are captured and, where schema history could be mined, what columns the
//! CDC layer recorded for them. The engine is a pure function of the two.

use cdcwatch_core::{CdcResult, ChangeKind, Issue, Report, SourceSnapshot, Table, TableSchema};
use chrono::{DateTime, SecondsFormat, Utc};

/// Drift comparison entry point
#[derive(Debug, Clone, Copy, Default)]
pub struct DriftEngine;

impl DriftEngine {
    /// Compare a source snapshot against a CDC result
    ///
    /// With no CDC result nothing is known to be captured, so the report is
    /// empty.
    pub fn validate(source: &SourceSnapshot, cdc: Option<&CdcResult>) -> Report {
        let mut report = Report::new();
        let Some(cdc) = cdc else {
            return report;
        };

        for table_name in &cdc.captured_tables {
            let Some(table) = source.find_table(table_name) else {
                report.push(
                    Issue::new(
                        ChangeKind::CapturedTableMissing,
                        format!("Table {} captured by CDC but missing in source", table_name),
                    )
                    .with_table(table_name),
                );
                continue;
            };

            if table.primary_key.is_empty() {
                report.push(
                    Issue::new(
                        ChangeKind::PrimaryKeyMissing,
                        format!("Table {} has no primary key (unsafe for CDC)", table_name),
                    )
                    .with_table(table_name),
                );
            }

            if let Some(schema) = cdc.table_schemas.get(table_name) {
                let column_issues = Self::compare_columns(table, schema);
                let mismatch = !column_issues.is_empty();
                report.issues.extend(column_issues);

                if mismatch {
                    if let Some(issue) = stale_schema_issue(table, cdc.schema_timestamps.get(table_name)) {
                        report.push(issue);
                    }
                }
            }
        }

        for warning in &cdc.warnings {
            report.push(Issue::new(classify_warning(warning), warning.clone()));
        }

        for table in &source.tables {
            if !cdc.captured_tables.contains(&table.name) {
                report.push(
                    Issue::new(
                        ChangeKind::TableNotCaptured,
                        format!("{} exists in source but not captured by CDC", table.name),
                    )
                    .with_table(&table.name),
                );
            }
        }

        report
    }

    /// Column-level drift between one source table and its CDC-recorded schema
    ///
    /// Names compare exactly, types case-insensitively. A column that is
    /// identical on both sides never produces an issue.
    pub fn compare_columns(table: &Table, schema: &TableSchema) -> Vec<Issue> {
        let mut issues = Vec::new();
        let t = table.name.as_str();

        // In source, not in CDC
        for column in &table.columns {
            if !schema.columns.contains_key(&column.name) {
                issues.push(
                    Issue::new(ChangeKind::ColumnAdded, ChangeKind::ColumnAdded.message())
                        .with_table(t)
                        .with_column(&column.name),
                );
            }
        }

        for (name, captured) in &schema.columns {
            let Some(column) = table.find_column(name) else {
                issues.push(
                    Issue::new(ChangeKind::ColumnRemoved, ChangeKind::ColumnRemoved.message())
                        .with_table(t)
                        .with_column(name),
                );
                continue;
            };

            if column.nullable && !captured.nullable {
                issues.push(
                    Issue::new(
                        ChangeKind::NullableToNotNull,
                        format!("{}.{} {}", t, name, ChangeKind::NullableToNotNull.message()),
                    )
                    .with_table(t)
                    .with_column(name),
                );
            }

            if !column.data_type.eq_ignore_ascii_case(&captured.data_type) {
                issues.push(
                    Issue::new(
                        ChangeKind::TypeChanged,
                        format!(
                            "{}.{} {} ({} -> {})",
                            t,
                            name,
                            ChangeKind::TypeChanged.message(),
                            column.data_type,
                            captured.data_type
                        ),
                    )
                    .with_table(t)
                    .with_column(name)
                    .with_types(&column.data_type, &captured.data_type),
                );
            }
        }

        issues
    }
}

/// Classify a connector warning by its text
pub fn classify_warning(warning: &str) -> ChangeKind {
    if warning.contains("snapshot.mode") {
        ChangeKind::CdcSnapshotIssue
    } else {
        ChangeKind::CdcConnectorUnhealthy
    }
}

/// Staleness issue for a mismatching table, if the CDC schema predates the source DDL
fn stale_schema_issue(table: &Table, cdc_seen: Option<&DateTime<Utc>>) -> Option<Issue> {
    let ddl_time = table.ddl_time?;
    if cdc_seen.is_some_and(|seen| *seen >= ddl_time) {
        return None;
    }

    let seen = cdc_seen.map(rfc3339).unwrap_or_else(|| "none".to_string());
    Some(
        Issue::new(
            ChangeKind::CdcSchemaStale,
            format!(
                "{} (source DDL at {}, CDC last seen: {})",
                ChangeKind::CdcSchemaStale.message(),
                rfc3339(&ddl_time),
                seen
            ),
        )
        .with_table(&table.name),
    )
}

fn rfc3339(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}
