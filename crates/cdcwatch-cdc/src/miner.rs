//! Schema miners: recover table definitions from one schema history payload
//!
//! Mining is best-effort. A miner that cannot make sense of a payload
//! returns nothing for it; it never fails the inspection.

use cdcwatch_core::{MinerKind, TableSchema};
use once_cell::sync::Lazy;
use regex::Regex;
use sqlparser::ast::{ColumnOption, Statement};
use sqlparser::dialect::MySqlDialect;
use sqlparser::parser::Parser;

static CREATE_TABLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)CREATE\s+TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?(?:`?[^\s`.(]+`?\.)?`?([^\s`.(]+)`?\s*\(")
        .unwrap()
});

static COLUMN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)^`([^`]+)`\s+([A-Za-z0-9_]+(?:\s*\([^)]*\))?(?:\s+UNSIGNED)?)(.*)$").unwrap()
});

static NOT_NULL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bNOT\s+NULL\b").unwrap());

static NULL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bNULL\b").unwrap());

/// A table definition recovered from a payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinedTable {
    /// Bare table name (schema prefix dropped)
    pub name: String,

    /// Recovered columns
    pub schema: TableSchema,
}

/// Extracts table definitions from a single log payload
pub trait SchemaMiner: Send + Sync {
    /// Get the miner name
    fn name(&self) -> &'static str;

    /// Mine every table definition found in the payload
    fn mine(&self, payload: &str) -> Vec<MinedTable>;
}

/// Build the miner selected in configuration
pub fn miner_for(kind: MinerKind) -> Box<dyn SchemaMiner> {
    match kind {
        MinerKind::Pattern => Box::new(DdlPatternMiner),
        MinerKind::Sqlparser => Box::new(SqlDdlMiner),
    }
}

/// Pattern-matching miner over the raw payload text
///
/// Finds `CREATE TABLE` statements case-insensitively and reads back-quoted
/// column definitions from their bodies. Types are upper-cased. A column is
/// nullable only when it carries an explicit `NULL` marker.
#[derive(Debug, Clone, Copy, Default)]
pub struct DdlPatternMiner;

impl SchemaMiner for DdlPatternMiner {
    fn name(&self) -> &'static str {
        "pattern"
    }

    fn mine(&self, payload: &str) -> Vec<MinedTable> {
        let mut tables = Vec::new();

        for captures in CREATE_TABLE_RE.captures_iter(payload) {
            let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            let Some(definitions) = split_body(&payload[whole.end()..]) else {
                continue;
            };

            let mut schema = TableSchema::new();
            for definition in definitions {
                if let Some((column, data_type, nullable)) = parse_column(definition) {
                    schema = schema.with_column(column, data_type, nullable);
                }
            }

            tables.push(MinedTable {
                name: name.as_str().to_string(),
                schema,
            });
        }

        tables
    }
}

/// Split a parenthesized body on top-level commas
///
/// `rest` starts just after the opening parenthesis. Commas and parentheses
/// inside single-quoted strings or back-quoted identifiers do not count. Returns `None` when
/// the body is never closed.
fn split_body(rest: &str) -> Option<Vec<&str>> {
    let mut parts = Vec::new();
    let mut depth = 1usize;
    let mut start = 0;
    let mut quote: Option<char> = None;

    for (idx, ch) in rest.char_indices() {
        if let Some(open) = quote {
            if ch == open {
                quote = None;
            }
            continue;
        }

        match ch {
            '\'' | '`' => quote = Some(ch),
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    parts.push(&rest[start..idx]);
                    return Some(parts);
                }
            }
            ',' if depth == 1 => {
                parts.push(&rest[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }

    None
}

/// Parse one column definition into (name, TYPE, nullable)
fn parse_column(definition: &str) -> Option<(String, String, bool)> {
    let line = trim_definition(definition);
    let captures = COLUMN_RE.captures(line)?;

    let name = captures.get(1)?.as_str().to_string();
    let data_type = captures.get(2)?.as_str().trim().to_uppercase();
    let rest = unescape_whitespace(captures.get(3).map(|m| m.as_str()).unwrap_or_default());

    let nullable = !NOT_NULL_RE.is_match(&rest) && NULL_RE.is_match(&rest);
    Some((name, data_type, nullable))
}

/// Turn JSON-escaped line breaks and tabs into spaces
fn unescape_whitespace(text: &str) -> String {
    text.replace("\\n", " ").replace("\\r", " ").replace("\\t", " ")
}

/// Trim whitespace and JSON-escaped line breaks around a definition
fn trim_definition(definition: &str) -> &str {
    let mut line = definition.trim();
    loop {
        let stripped = ["\\n", "\\r", "\\t"]
            .iter()
            .find_map(|escape| line.strip_prefix(escape))
            .map(str::trim_start);
        match stripped {
            Some(next) => line = next,
            None => return line,
        }
    }
}

/// Grammar-based miner over the `ddl` field of a history record
///
/// Parses the statement with the MySQL dialect. Unlike the pattern miner,
/// columns without a NOT NULL or PRIMARY KEY constraint are nullable.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlDdlMiner;

impl SchemaMiner for SqlDdlMiner {
    fn name(&self) -> &'static str {
        "sqlparser"
    }

    fn mine(&self, payload: &str) -> Vec<MinedTable> {
        let Ok(record) = serde_json::from_str::<serde_json::Value>(payload) else {
            return Vec::new();
        };
        let Some(ddl) = record.get("ddl").and_then(|v| v.as_str()) else {
            return Vec::new();
        };

        let statements = match Parser::parse_sql(&MySqlDialect {}, ddl) {
            Ok(statements) => statements,
            Err(e) => {
                tracing::debug!("skipping unparseable DDL: {}", e);
                return Vec::new();
            }
        };

        statements
            .into_iter()
            .filter_map(|statement| match statement {
                Statement::CreateTable(create) => {
                    let qualified = create.name.to_string();
                    let name = qualified
                        .rsplit('.')
                        .next()
                        .unwrap_or(qualified.as_str())
                        .trim_matches('`')
                        .to_string();

                    let schema = create.columns.iter().fold(TableSchema::new(), |schema, column| {
                        let not_null = column.options.iter().any(|def| {
                            matches!(
                                def.option,
                                ColumnOption::NotNull | ColumnOption::Unique { is_primary: true, .. }
                            )
                        });
                        schema.with_column(
                            column.name.value.clone(),
                            column.data_type.to_string().to_uppercase(),
                            !not_null,
                        )
                    });

                    Some(MinedTable { name, schema })
                }
                _ => None,
            })
            .collect()
    }
}
