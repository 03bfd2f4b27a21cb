//! Drift report (stable v1) and its aggregations
//!
//! The report schema is STABLE and VERSIONED.
//! Breaking changes require a new version.

use crate::issue::{Issue, Severity};
use serde::{Deserialize, Serialize};

/// Report schema version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportVersion {
    /// Major version (breaking changes)
    pub major: u32,

    /// Minor version (backward-compatible additions)
    pub minor: u32,
}

impl ReportVersion {
    /// Current report schema version
    pub const CURRENT: ReportVersion = ReportVersion { major: 1, minor: 0 };
}

impl std::fmt::Display for ReportVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Highest severity present in a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HighestSeverity {
    /// Empty report
    None,
    Info,
    Warn,
    Block,
}

impl HighestSeverity {
    /// Rank used for the fail-on gate
    ///
    /// INFO ranks the same as NONE: informational findings never raise
    /// the rank.
    pub fn rank(&self) -> u8 {
        match self {
            Self::None | Self::Info => 0,
            Self::Warn => 1,
            Self::Block => 2,
        }
    }
}

impl From<Severity> for HighestSeverity {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Info => Self::Info,
            Severity::Warn => Self::Warn,
            Severity::Block => Self::Block,
        }
    }
}

/// Per-severity issue counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReportSummary {
    pub info: usize,
    pub warn: usize,
    pub block: usize,
}

/// Drift report
///
/// Issue order carries no meaning; renderers sort with
/// [`Report::sorted_for_render`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Schema version
    pub version: ReportVersion,

    /// All issues
    pub issues: Vec<Issue>,
}

impl Report {
    /// Create a new empty report
    pub fn new() -> Self {
        Self {
            version: ReportVersion::CURRENT,
            issues: Vec::new(),
        }
    }

    /// Create a report from issues
    pub fn from_issues(issues: Vec<Issue>) -> Self {
        Self {
            version: ReportVersion::CURRENT,
            issues,
        }
    }

    /// Add an issue
    pub fn push(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    /// Whether the report has no issues
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Highest severity across all issues
    pub fn highest_severity(&self) -> HighestSeverity {
        self.issues
            .iter()
            .map(|i| i.severity)
            .max()
            .map(HighestSeverity::from)
            .unwrap_or(HighestSeverity::None)
    }

    /// Number of BLOCK issues
    pub fn blocking_count(&self) -> usize {
        self.count(Severity::Block)
    }

    /// Number of issues with the given severity
    pub fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    /// Per-severity counts
    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            info: self.count(Severity::Info),
            warn: self.count(Severity::Warn),
            block: self.count(Severity::Block),
        }
    }

    /// Issues stably sorted by table then column; table-less issues first
    pub fn sorted_for_render(&self) -> Vec<&Issue> {
        let mut issues: Vec<&Issue> = self.issues.iter().collect();
        issues.sort_by(|a, b| {
            (a.table.as_deref(), a.column.as_deref()).cmp(&(b.table.as_deref(), b.column.as_deref()))
        });
        issues
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Save to file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let json = self.to_json().map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}

impl Default for Report {
    fn default() -> Self {
        Self::new()
    }
}

/// Severity threshold at which a run is considered failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailOn {
    Info,
    Warn,
    #[default]
    Block,
}

impl FailOn {
    /// Parse a threshold; unknown values fall back to `block`
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "info" => Self::Info,
            "warn" => Self::Warn,
            _ => Self::Block,
        }
    }

    /// Rank of this threshold
    pub fn rank(&self) -> u8 {
        match self {
            Self::Info => 0,
            Self::Warn => 1,
            Self::Block => 2,
        }
    }

    /// Whether the report fails this gate
    pub fn should_fail(&self, report: &Report) -> bool {
        let rank = report.highest_severity().rank();
        rank >= self.rank() && rank > 0
    }

    /// Process exit code for the report: the highest rank when failing, else 0
    pub fn exit_code(&self, report: &Report) -> i32 {
        if self.should_fail(report) {
            i32::from(report.highest_severity().rank())
        } else {
            0
        }
    }
}

impl std::fmt::Display for FailOn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Block => write!(f, "block"),
        }
    }
}
