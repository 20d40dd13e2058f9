//! Diagnostics collected during a run.
//!
//! None of these stop the run on their own. Errors make the command exit
//! with a failure status once everything else is done; warnings are only
//! reported.

use enum_dispatch::enum_dispatch;

use crate::core::SourceLocation;

// ============================================================
// Severity and Rule
// ============================================================

/// Severity level of an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// Identifier for each issue type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Rule {
    ParseError,
    MissingSource,
    NoLedgerRows,
    WriteFailed,
    KeyCollision,
    Config,
}

impl std::fmt::Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rule::ParseError => write!(f, "parse-error"),
            Rule::MissingSource => write!(f, "missing-source"),
            Rule::NoLedgerRows => write!(f, "no-ledger-rows"),
            Rule::WriteFailed => write!(f, "write-failed"),
            Rule::KeyCollision => write!(f, "key-collision"),
            Rule::Config => write!(f, "config"),
        }
    }
}

// ============================================================
// Issue Types
// ============================================================

/// File no grammar could parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseErrorIssue {
    pub file_path: String,
    pub error: String,
    /// The rewriter fell back to textual replacement for this file.
    pub fallback: bool,
}

impl ParseErrorIssue {
    pub fn severity() -> Severity {
        Severity::Warning
    }

    pub fn rule() -> Rule {
        Rule::ParseError
    }
}

/// Ledger row pointing at a file that no longer exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingSourceIssue {
    pub file_path: String,
    pub rows: usize,
}

impl MissingSourceIssue {
    pub fn severity() -> Severity {
        Severity::Warning
    }

    pub fn rule() -> Rule {
        Rule::MissingSource
    }
}

/// A single-file rewrite was requested for a file the ledger does not
/// mention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoLedgerRowsIssue {
    pub file_path: String,
}

impl NoLedgerRowsIssue {
    pub fn severity() -> Severity {
        Severity::Warning
    }

    pub fn rule() -> Rule {
        Rule::NoLedgerRows
    }
}

/// Read or write failure for one file; its change was abandoned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteFailedIssue {
    pub file_path: String,
    pub error: String,
}

impl WriteFailedIssue {
    pub fn severity() -> Severity {
        Severity::Error
    }

    pub fn rule() -> Rule {
        Rule::WriteFailed
    }
}

/// Two distinct texts derived the same key; the first one kept it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCollisionIssue {
    pub location: SourceLocation,
    pub key: String,
    pub kept: String,
    pub dropped: String,
}

impl KeyCollisionIssue {
    pub fn severity() -> Severity {
        Severity::Warning
    }

    pub fn rule() -> Rule {
        Rule::KeyCollision
    }
}

/// Configuration problem; defaults were used where it applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarningIssue {
    pub file_path: Option<String>,
    pub message: String,
}

impl ConfigWarningIssue {
    pub fn severity() -> Severity {
        Severity::Warning
    }

    pub fn rule() -> Rule {
        Rule::Config
    }
}

// ============================================================
// Issue Enum
// ============================================================

#[enum_dispatch(Report)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Issue {
    ParseError(ParseErrorIssue),
    MissingSource(MissingSourceIssue),
    NoLedgerRows(NoLedgerRowsIssue),
    WriteFailed(WriteFailedIssue),
    KeyCollision(KeyCollisionIssue),
    ConfigWarning(ConfigWarningIssue),
}

impl Issue {
    pub fn severity(&self) -> Severity {
        self.report_severity()
    }

    pub fn rule(&self) -> Rule {
        self.report_rule()
    }

    pub fn is_error(&self) -> bool {
        self.severity() == Severity::Error
    }
}

// ============================================================
// Report Trait (for CLI output)
// ============================================================

pub enum ReportLocation<'a> {
    Source(&'a SourceLocation),
    File { path: &'a str },
    Project,
}

#[enum_dispatch]
pub trait Report {
    fn location(&self) -> ReportLocation<'_>;

    fn message(&self) -> String;

    fn report_severity(&self) -> Severity;

    fn report_rule(&self) -> Rule;

    fn hint(&self) -> Option<&str> {
        None
    }
}

// ============================================================
// Report Implementations
// ============================================================

impl Report for ParseErrorIssue {
    fn location(&self) -> ReportLocation<'_> {
        ReportLocation::File {
            path: &self.file_path,
        }
    }

    fn message(&self) -> String {
        self.error.clone()
    }

    fn report_severity(&self) -> Severity {
        Self::severity()
    }

    fn report_rule(&self) -> Rule {
        Self::rule()
    }

    fn hint(&self) -> Option<&str> {
        if self.fallback {
            Some("rewritten by textual fallback; type positions and style factories were not excluded")
        } else {
            Some("file skipped")
        }
    }
}

impl Report for MissingSourceIssue {
    fn location(&self) -> ReportLocation<'_> {
        ReportLocation::File {
            path: &self.file_path,
        }
    }

    fn message(&self) -> String {
        format!("file not found ({} ledger row(s))", self.rows)
    }

    fn report_severity(&self) -> Severity {
        Self::severity()
    }

    fn report_rule(&self) -> Rule {
        Self::rule()
    }
}

impl Report for NoLedgerRowsIssue {
    fn location(&self) -> ReportLocation<'_> {
        ReportLocation::File {
            path: &self.file_path,
        }
    }

    fn message(&self) -> String {
        "no ledger rows reference this file".to_string()
    }

    fn report_severity(&self) -> Severity {
        Self::severity()
    }

    fn report_rule(&self) -> Rule {
        Self::rule()
    }
}

impl Report for WriteFailedIssue {
    fn location(&self) -> ReportLocation<'_> {
        ReportLocation::File {
            path: &self.file_path,
        }
    }

    fn message(&self) -> String {
        self.error.clone()
    }

    fn report_severity(&self) -> Severity {
        Self::severity()
    }

    fn report_rule(&self) -> Rule {
        Self::rule()
    }
}

impl Report for KeyCollisionIssue {
    fn location(&self) -> ReportLocation<'_> {
        ReportLocation::Source(&self.location)
    }

    fn message(&self) -> String {
        format!(
            "\"{}\" derives key {} already used by \"{}\"",
            self.dropped, self.key, self.kept
        )
    }

    fn report_severity(&self) -> Severity {
        Self::severity()
    }

    fn report_rule(&self) -> Rule {
        Self::rule()
    }

    fn hint(&self) -> Option<&str> {
        Some("increase hashScheme.length to separate them")
    }
}

impl Report for ConfigWarningIssue {
    fn location(&self) -> ReportLocation<'_> {
        match &self.file_path {
            Some(path) => ReportLocation::File { path },
            None => ReportLocation::Project,
        }
    }

    fn message(&self) -> String {
        self.message.clone()
    }

    fn report_severity(&self) -> Severity {
        Self::severity()
    }

    fn report_rule(&self) -> Rule {
        Self::rule()
    }
}

#[cfg(test)]
mod tests {
    use crate::issues::*;

    #[test]
    fn test_severity_and_rule_dispatch() {
        let issue: Issue = WriteFailedIssue {
            file_path: "src/a.js".to_string(),
            error: "permission denied".to_string(),
        }
        .into();
        assert!(issue.is_error());
        assert_eq!(issue.rule().to_string(), "write-failed");

        let issue: Issue = KeyCollisionIssue {
            location: SourceLocation::new("src/a.js", 3),
            key: "i18n_abc".to_string(),
            kept: "确定".to_string(),
            dropped: "取消".to_string(),
        }
        .into();
        assert_eq!(issue.severity(), Severity::Warning);
        assert!(issue.message().contains("i18n_abc"));
        assert!(issue.hint().is_some());
    }
}
