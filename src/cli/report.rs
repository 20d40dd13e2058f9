//! Report formatting and printing.
//!
//! Issues are printed cargo-style, followed by a per-command summary.

use std::io::{self, Write};

use colored::Colorize;

use super::commands::{
    CommandResult, CommandSummary, GenSummary, InitSummary, ReplaceSummary, ScanSummary,
    SyncSummary,
};
use crate::config::CONFIG_FILE_NAME;
use crate::core::merge::GenerateOutcome;
use crate::issues::{Issue, Report, ReportLocation, Severity};
use crate::utils::display_path;

/// Success mark for consistent output formatting.
pub const SUCCESS_MARK: &str = "\u{2713}"; // ✓

/// Failure mark for consistent output formatting.
pub const FAILURE_MARK: &str = "\u{2718}"; // ✘

/// Print issues in cargo-style format to stdout.
pub fn report(issues: &[Issue]) {
    report_to(issues, &mut io::stdout().lock());
}

/// Print issues to a custom writer.
pub fn report_to<W: Write>(issues: &[Issue], writer: &mut W) {
    if issues.is_empty() {
        return;
    }

    let mut sorted = issues.to_vec();
    sorted.sort_by(compare_issues);

    for issue in &sorted {
        print_issue(issue, writer);
    }

    print_summary(&sorted, writer);
}

pub fn print(result: &CommandResult, verbose: bool) {
    report(&result.issues);
    let mut out = io::stdout().lock();
    print_command_output(result, verbose, &mut out);
}

fn print_command_output<W: Write>(result: &CommandResult, verbose: bool, writer: &mut W) {
    match &result.summary {
        CommandSummary::Scan(summary) => print_scan(summary, verbose, writer),
        CommandSummary::Replace(summary) => print_replace(summary, writer),
        CommandSummary::Sync(summary) => print_sync(summary, writer),
        CommandSummary::Gen(summary) => print_gen(summary, writer),
        CommandSummary::Init(summary) => print_init(summary, writer),
    }
}

// ============================================================
// Issues
// ============================================================

fn print_issue<W: Write>(issue: &Issue, writer: &mut W) {
    let severity_str = match issue.report_severity() {
        Severity::Error => "error".bold().red(),
        Severity::Warning => "warning".bold().yellow(),
    };

    let _ = writeln!(
        writer,
        "{}: {}  {}",
        severity_str,
        issue.message(),
        issue.report_rule().to_string().dimmed().cyan()
    );

    match issue.location() {
        ReportLocation::Source(loc) => {
            let _ = writeln!(writer, "  {} {}:{}", "-->".blue(), loc.file_path, loc.line);
        }
        ReportLocation::File { path } => {
            let _ = writeln!(writer, "  {} {}", "-->".blue(), path);
        }
        ReportLocation::Project => {}
    }

    if let Some(hint) = issue.hint() {
        let _ = writeln!(writer, "  {} {} {}", "=".blue(), "hint:".bold().cyan(), hint);
    }

    let _ = writeln!(writer);
}

fn print_summary<W: Write>(issues: &[Issue], writer: &mut W) {
    let total_errors = issues
        .iter()
        .filter(|i| i.report_severity() == Severity::Error)
        .count();
    let total_warnings = issues.len() - total_errors;

    let _ = writeln!(
        writer,
        "{} {} problems ({} {}, {} {})\n",
        FAILURE_MARK.red(),
        issues.len(),
        total_errors,
        if total_errors == 1 { "error" } else { "errors" }.red(),
        total_warnings,
        if total_warnings == 1 {
            "warning"
        } else {
            "warnings"
        }
        .yellow()
    );
}

fn sort_key<'a>(loc: &ReportLocation<'a>) -> (u8, &'a str, usize) {
    match *loc {
        ReportLocation::Project => (0, "", 0),
        ReportLocation::File { path } => (1, path, 0),
        ReportLocation::Source(loc) => (1, loc.file_path.as_str(), loc.line),
    }
}

fn compare_issues(a: &Issue, b: &Issue) -> std::cmp::Ordering {
    sort_key(&a.location())
        .cmp(&sort_key(&b.location()))
        .then_with(|| a.report_severity().cmp(&b.report_severity()))
}

// ============================================================
// Command summaries
// ============================================================

fn plural(count: usize, one: &str, many: &str) -> String {
    format!("{} {}", count, if count == 1 { one } else { many })
}

fn print_scan<W: Write>(summary: &ScanSummary, verbose: bool, writer: &mut W) {
    let rows: usize = summary.sheets.iter().map(|s| s.rows).sum();
    let _ = writeln!(
        writer,
        "{} {}",
        SUCCESS_MARK.green(),
        format!(
            "Scanned {}: {}, {} in {}",
            plural(summary.files_scanned, "file", "files"),
            plural(summary.occurrences, "occurrence", "occurrences"),
            plural(rows, "row", "rows"),
            plural(summary.sheets.len(), "sheet", "sheets"),
        )
        .green()
    );
    if verbose || summary.sheets.len() > 1 {
        for sheet in &summary.sheets {
            let _ = writeln!(writer, "  - {}: {}", sheet.name, plural(sheet.rows, "row", "rows"));
        }
    }
    if let Some(backup) = &summary.backup {
        let _ = writeln!(writer, "Previous ledger saved to {}", backup.cyan());
    }
    let _ = writeln!(writer, "{} {}", "Wrote".green().bold(), summary.ledger);
}

fn print_replace<W: Write>(summary: &ReplaceSummary, writer: &mut W) {
    if summary.changes.is_empty() {
        let _ = writeln!(
            writer,
            "{} {}",
            SUCCESS_MARK.green(),
            format!(
                "Checked {} - nothing to replace",
                plural(summary.files_checked, "file", "files")
            )
            .green()
        );
        return;
    }

    let total: usize = summary.changes.iter().map(|c| c.replacements).sum();
    let verb = if summary.is_dry_run {
        "Would replace".yellow().bold()
    } else {
        "Replaced".green().bold()
    };
    let _ = writeln!(
        writer,
        "{} {} in {}:",
        verb,
        plural(total, "text", "texts"),
        plural(summary.changes.len(), "file", "files")
    );
    for change in &summary.changes {
        let mut notes = Vec::new();
        if change.import_added {
            notes.push("import added");
        }
        if change.fallback {
            notes.push("textual fallback");
        }
        let notes = if notes.is_empty() {
            String::new()
        } else {
            format!(" ({})", notes.join(", ")).dimmed().to_string()
        };
        let _ = writeln!(writer, "  - {}: {}{}", change.file, change.replacements, notes);
    }
    if summary.is_dry_run {
        let _ = writeln!(writer, "Run without {} to write these changes.", "--dry-run".cyan());
    }
    if summary.formatted {
        let _ = writeln!(
            writer,
            "Formatted changed files ({} restored)",
            plural(summary.gaps_restored, "blank line", "blank lines")
        );
    }
}

fn print_sync<W: Write>(summary: &SyncSummary, writer: &mut W) {
    for sheet in &summary.sheets {
        let _ = writeln!(
            writer,
            "{} {}: {} matched, {} moved, {} new, {} missing",
            SUCCESS_MARK.green(),
            sheet.sheet.bold(),
            sheet.matched,
            sheet.moved,
            sheet.new_items,
            sheet.missing
        );
    }
    if let Some(backup) = &summary.backup {
        let _ = writeln!(writer, "Previous ledger saved to {}", backup.cyan());
    }
    let _ = writeln!(writer, "{} {}", "Wrote".green().bold(), summary.ledger);
    let _ = writeln!(writer, "Report: {}", summary.report);
}

fn print_gen<W: Write>(summary: &GenSummary, writer: &mut W) {
    match &summary.outcome {
        GenerateOutcome::Written { files, resolved } => {
            let _ = writeln!(
                writer,
                "{} {}",
                SUCCESS_MARK.green(),
                format!("Wrote {}", plural(files.len(), "locale pack", "locale packs")).green()
            );
            for file in files {
                let _ = writeln!(writer, "  - {}", display_path(file));
            }
            if *resolved > 0 {
                let _ = writeln!(
                    writer,
                    "Applied {}",
                    plural(*resolved, "conflict selection", "conflict selections")
                );
            }
            if let Some(master) = &summary.master {
                let _ = writeln!(writer, "{} {}", "Appended to".green().bold(), master);
            }
        }
        GenerateOutcome::Blocked {
            report,
            unresolved,
            total,
        } => {
            let _ = writeln!(
                writer,
                "{} {} ({} unresolved); no locale pack was written",
                FAILURE_MARK.red(),
                plural(*total, "conflict", "conflicts"),
                unresolved
            );
            let _ = writeln!(
                writer,
                "Set \"selected\" for each entry in {} and run again.",
                display_path(report).cyan()
            );
        }
    }
}

fn print_init<W: Write>(summary: &InitSummary, writer: &mut W) {
    if summary.created {
        let _ = writeln!(
            writer,
            "{} {}",
            SUCCESS_MARK.green(),
            format!("Created {}", CONFIG_FILE_NAME).green()
        );
    }
}

// ============================================================
// Tests
// ============================================================
