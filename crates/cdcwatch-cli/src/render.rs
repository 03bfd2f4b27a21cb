//! Human and JSON rendering of a check run

use cdcwatch_core::{CdcResult, ChangeKind, ConnectorResult, Issue, Probe, Report, Severity, SourceSnapshot};
use colored::Colorize;
use std::io::{self, Write};

/// Everything one `check` run produced
pub struct CheckRun {
    /// Source inspector name
    pub source_name: &'static str,

    /// Source tables
    pub snapshot: SourceSnapshot,

    /// CDC inspector name
    pub cdc_name: &'static str,

    /// Where the CDC platform was queried
    pub cdc_endpoint: String,

    /// Per-connector results
    pub connectors: Vec<ConnectorResult>,

    /// Union over connectors
    pub cdc: CdcResult,

    /// Drift report
    pub report: Report,
}

/// Render the run for a terminal
pub fn render_human<W: Write>(out: &mut W, run: &CheckRun) -> io::Result<()> {
    let rule = "=".repeat(60);

    writeln!(out, "{}", rule.bright_blue())?;
    writeln!(out, "{}", "CDC Schema Drift Check".bold().bright_blue())?;
    writeln!(out, "{}", rule.bright_blue())?;
    writeln!(out)?;

    render_source(out, run)?;
    render_cdc(out, run)?;
    render_drift(out, &run.report)?;

    writeln!(out, "{}", rule.bright_blue())
}

fn render_source<W: Write>(out: &mut W, run: &CheckRun) -> io::Result<()> {
    writeln!(
        out,
        "{} {} ({} table(s))",
        "Source:".bold(),
        run.source_name,
        run.snapshot.tables.len()
    )?;
    for table in &run.snapshot.tables {
        writeln!(out, "  Table: {}", table.name)?;
        writeln!(out, "    Columns: {}", table.columns.len())?;
        writeln!(out, "    Row count: {}", table.row_count)?;
    }
    writeln!(out)
}

fn render_cdc<W: Write>(out: &mut W, run: &CheckRun) -> io::Result<()> {
    writeln!(out, "{} {} ({})", "CDC:".bold(), run.cdc_name, run.cdc_endpoint)?;

    let reachable = if run.cdc.reachable {
        "yes".green()
    } else {
        "no".red().bold()
    };
    writeln!(out, "  Connector reachable: {}", reachable)?;

    for connector in run.connectors.iter().filter(|c| !c.name.is_empty()) {
        writeln!(out, "  Connector: {}", connector.name.cyan())?;

        let tables = connector.captured_tables();
        if !tables.is_empty() {
            writeln!(out, "    Captured tables: {}", tables.join(", "))?;
        }
        if let Some(reason) = connector.config.unavailable_reason() {
            writeln!(out, "    Config: {} ({})", "unavailable".yellow(), reason)?;
        }
        if let Some(status) = connector.status.available() {
            writeln!(out, "    State: {}", status.state)?;
        } else if let Some(reason) = connector.status.unavailable_reason() {
            writeln!(out, "    Status: {} ({})", "unavailable".yellow(), reason)?;
        }
        match &connector.history {
            Probe::Available(history) => writeln!(
                out,
                "    Schema history: {} table(s) from {} message(s)",
                history.schemas.len(),
                history.messages_read
            )?,
            Probe::Unavailable(reason) => {
                writeln!(out, "    Schema history: {} ({})", "unavailable".yellow(), reason)?
            }
            Probe::Skipped => {}
        }
    }

    if !run.cdc.warnings.is_empty() {
        writeln!(out, "  Warnings:")?;
        for warning in &run.cdc.warnings {
            writeln!(out, "    - {}", warning.yellow())?;
        }
    }
    writeln!(out)
}

fn render_drift<W: Write>(out: &mut W, report: &Report) -> io::Result<()> {
    writeln!(out, "{}", "Drift Check:".bold())?;

    if report.is_empty() {
        writeln!(out, "    {}", "✓ No drift detected".green().bold())?;
        return writeln!(out);
    }

    if !report.issues.iter().any(|issue| issue.kind == ChangeKind::PrimaryKeyMissing) {
        writeln!(out, "    {}", "✓ Primary keys match".green())?;
    }

    let issues = report.sorted_for_render();
    let mut current: Option<Option<&str>> = None;

    for issue in issues {
        let table = issue.table.as_deref();
        if current != Some(table) {
            match table {
                Some(t) => writeln!(out, "    Table: {}", t.bold())?,
                None => writeln!(out, "    Connectors:")?,
            }
            current = Some(table);
        }
        writeln!(out, "      - [{}] {}", severity_label(issue), issue_text(issue))?;
    }

    let summary = report.summary();
    writeln!(out)?;
    writeln!(
        out,
        "Summary: {} INFO / {} WARN / {} BLOCK",
        summary.info, summary.warn, summary.block
    )?;
    if summary.block > 0 {
        let suffix = if summary.block == 1 { "" } else { "s" };
        writeln!(
            out,
            "Result: {}",
            format!("FAILED ({} blocking issue{})", summary.block, suffix).red().bold()
        )?;
    }
    writeln!(out)
}

fn severity_label(issue: &Issue) -> colored::ColoredString {
    match issue.severity {
        Severity::Block => "BLOCK".red().bold(),
        Severity::Warn => "WARN".yellow().bold(),
        Severity::Info => "INFO".cyan(),
    }
}

/// Column issues read `table.column message`
fn issue_text(issue: &Issue) -> String {
    match (&issue.table, &issue.column) {
        (Some(table), Some(column)) => {
            let prefix = format!("{}.{}", table, column);
            if issue.message.starts_with(&prefix) {
                issue.message.clone()
            } else {
                format!("{} {}", prefix, issue.message)
            }
        }
        _ => issue.message.clone(),
    }
}

/// Render the run as one JSON document
pub fn render_json(run: &CheckRun) -> serde_json::Result<String> {
    let document = serde_json::json!({
        "source": run.snapshot,
        "cdc": run.cdc,
        "connectors": run.connectors,
        "drift": run.report,
        "summary": run.report.summary(),
    });
    serde_json::to_string_pretty(&document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdcwatch_core::{Column, Table};
    use pretty_assertions::assert_eq;

    fn human(run: &CheckRun) -> String {
        let mut out = Vec::new();
        render_human(&mut out, run).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn sample_run(issues: Vec<Issue>) -> CheckRun {
        let table = Table::new("orders")
            .with_columns(vec![Column::new("id", "int"), Column::new("total", "decimal(10,2)")])
            .with_primary_key(["id"])
            .with_row_count(10);

        let mut connector = ConnectorResult::new("inventory");
        connector.warnings.push("connector inventory snapshot.mode=never".to_string());

        CheckRun {
            source_name: "snapshot",
            snapshot: SourceSnapshot::from_tables(vec![table]),
            cdc_name: "debezium",
            cdc_endpoint: "http://localhost:8083".to_string(),
            cdc: CdcResult::from_connectors(std::slice::from_ref(&connector)),
            connectors: vec![connector],
            report: Report::from_issues(issues),
        }
    }

    #[test]
    fn test_human_output_groups_by_table() {
        colored::control::set_override(false);

        let run = sample_run(vec![
            Issue::new(ChangeKind::ColumnRemoved, ChangeKind::ColumnRemoved.message())
                .with_table("orders")
                .with_column("legacy"),
            Issue::new(ChangeKind::CdcSnapshotIssue, "connector inventory snapshot.mode=never"),
            Issue::new(ChangeKind::PrimaryKeyMissing, "Table audit has no primary key (unsafe for CDC)")
                .with_table("audit"),
            Issue::new(ChangeKind::TypeChanged, "orders.total type mismatch (decimal(10,2) -> DOUBLE)")
                .with_table("orders")
                .with_column("total")
                .with_types("decimal(10,2)", "DOUBLE"),
        ]);

        let output = human(&run);
        let drift = output
            .split("Drift Check:\n")
            .nth(1)
            .unwrap()
            .lines()
            .take(8)
            .collect::<Vec<_>>();

        assert_eq!(
            drift,
            vec![
                "    Connectors:",
                "      - [WARN] connector inventory snapshot.mode=never",
                "    Table: audit",
                "      - [BLOCK] Table audit has no primary key (unsafe for CDC)",
                "    Table: orders",
                "      - [BLOCK] orders.legacy present in CDC but missing in source",
                "      - [WARN] orders.total type mismatch (decimal(10,2) -> DOUBLE)",
                "",
            ]
        );
        assert!(output.contains("Summary: 0 INFO / 2 WARN / 2 BLOCK"));
        assert!(output.contains("Result: FAILED (2 blocking issues)"));
        assert!(output.contains("  Connector: inventory"));
        assert!(output.contains("    - connector inventory snapshot.mode=never"));
    }

    #[test]
    fn test_human_output_without_drift() {
        colored::control::set_override(false);

        let output = human(&sample_run(Vec::new()));
        assert!(output.contains("No drift detected"));
        assert!(!output.contains("Primary keys match"));
        assert!(!output.contains("Summary:"));
        assert!(output.contains("  Table: orders\n    Columns: 2\n    Row count: 10"));
    }

    #[test]
    fn test_single_blocking_issue_is_singular() {
        colored::control::set_override(false);

        let run = sample_run(vec![Issue::new(
            ChangeKind::CapturedTableMissing,
            "Table gone captured by CDC but missing in source",
        )
        .with_table("gone")]);
        let output = human(&run);
        assert!(output.contains("Result: FAILED (1 blocking issue)\n"));
        assert!(output.contains("Drift Check:\n    ✓ Primary keys match\n    Table: gone\n"));
    }

    #[test]
    fn test_json_document_shape() {
        let run = sample_run(vec![
            Issue::new(ChangeKind::ColumnAdded, ChangeKind::ColumnAdded.message())
                .with_table("orders")
                .with_column("note"),
            Issue::new(ChangeKind::CdcSnapshotIssue, "connector inventory snapshot.mode=never"),
        ]);

        let json: serde_json::Value = serde_json::from_str(&render_json(&run).unwrap()).unwrap();
        assert_eq!(json["summary"], serde_json::json!({"info": 1, "warn": 1, "block": 0}));
        assert_eq!(json["source"]["tables"][0]["name"], "orders");
        assert_eq!(json["connectors"][0]["name"], "inventory");
        assert_eq!(json["drift"]["issues"][0]["kind"], "column_added");
        assert_eq!(json["drift"]["issues"][0]["severity"], "INFO");
        assert_eq!(json["cdc"]["warnings"][0], "connector inventory snapshot.mode=never");
    }
}
