use crate::cli::ExitStatus;
use crate::core::merge::GenerateOutcome;
use crate::issues::{Issue, Severity};

#[derive(Debug)]
pub enum CommandSummary {
    Scan(ScanSummary),
    Replace(ReplaceSummary),
    Sync(SyncSummary),
    Gen(GenSummary),
    Init(InitSummary),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetCount {
    pub name: String,
    pub rows: usize,
}

#[derive(Debug)]
pub struct ScanSummary {
    pub ledger: String,
    pub backup: Option<String>,
    pub files_scanned: usize,
    /// Occurrences before deduplication by key.
    pub occurrences: usize,
    pub sheets: Vec<SheetCount>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    pub file: String,
    pub replacements: usize,
    pub import_added: bool,
    /// Rewritten by the textual fallback.
    pub fallback: bool,
}

#[derive(Debug)]
pub struct ReplaceSummary {
    pub changes: Vec<FileChange>,
    pub files_checked: usize,
    pub is_dry_run: bool,
    pub formatted: bool,
    /// Blank lines put back between class members after formatting.
    pub gaps_restored: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncCounts {
    pub sheet: String,
    pub matched: usize,
    pub moved: usize,
    pub new_items: usize,
    pub missing: usize,
}

#[derive(Debug)]
pub struct SyncSummary {
    pub ledger: String,
    pub backup: Option<String>,
    pub report: String,
    pub sheets: Vec<SyncCounts>,
}

#[derive(Debug)]
pub struct GenSummary {
    pub outcome: GenerateOutcome,
    pub master: Option<String>,
}

#[derive(Debug)]
pub struct InitSummary {
    pub created: bool,
}

/// Result of running a hanzi command.
pub struct CommandResult {
    pub summary: CommandSummary,
    /// Everything reported during the run, config warnings included.
    pub issues: Vec<Issue>,
    pub status: ExitStatus,
}

impl CommandResult {
    /// Fails when any issue is an error.
    pub fn new(summary: CommandSummary, issues: Vec<Issue>) -> Self {
        let status = if issues.iter().any(Issue::is_error) {
            ExitStatus::Failure
        } else {
            ExitStatus::Success
        };
        Self {
            summary,
            issues,
            status,
        }
    }

    pub fn with_status(mut self, status: ExitStatus) -> Self {
        self.status = status;
        self
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity() == severity).count()
    }
}
