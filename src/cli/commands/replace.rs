use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use rayon::prelude::*;

use super::{CommandResult, CommandSummary, FileChange, ReplaceSummary, ledger_store, load_ledger};
use crate::{
    cli::args::{ReplaceArgs, ReplaceCommand},
    core::{
        TranslationRecord,
        context::ProjectContext,
        files::sheet_name,
        format_gaps::MemberGaps,
        hooks::{CommandFormatter, Formatter},
        ledger::{Ledger, LedgerRow},
        rewrite::{RewriteMode, RewriteOutcome, Rewriter},
        script::TargetScript,
    },
    issues::{
        ConfigWarningIssue, Issue, MissingSourceIssue, NoLedgerRowsIssue, ParseErrorIssue,
        WriteFailedIssue,
    },
};

enum FileRewrite {
    Missing { rows: usize },
    Unreadable(String),
    Done(RewriteOutcome),
}

/// A file that was (or would be) rewritten.
struct Rewritten {
    file: String,
    path: PathBuf,
    gaps: MemberGaps,
}

/// Rewrites every file referenced by an active ledger row, and every other
/// source file under a scanned root, so its texts become lookup calls.
pub fn replace(cmd: ReplaceCommand) -> Result<CommandResult> {
    let ReplaceArgs {
        common,
        ledger,
        import_path,
        file,
        fix_lint,
        dry_run,
    } = cmd.args;
    let mut ctx = ProjectContext::new(&common)?;
    let mut issues = std::mem::take(&mut ctx.issues);

    let store = ledger_store(&ctx, ledger.as_deref());
    let ledger = load_ledger(&store)?;
    let rewriter = ctx.rewriter(import_path.as_deref());

    let sheets = active_records(&ledger);
    let mut targets = rewrite_targets(&ctx, &sheets);
    if let Some(only) = file {
        let only = only.trim_start_matches("./").replace('\\', "/");
        targets.retain(|f, _| *f == only);
        if targets.is_empty() {
            issues.push(NoLedgerRowsIssue { file_path: only }.into());
        }
    }

    let (script, _) = ctx.config.target_script();
    let results: Vec<(&String, FileRewrite)> = targets
        .par_iter()
        .map(|(file, target)| (file, rewrite_file(&ctx, &rewriter, &script, file, target)))
        .collect();

    let mut changes = Vec::new();
    let mut rewritten = Vec::new();
    for (file, result) in results {
        let outcome = match result {
            FileRewrite::Missing { rows } => {
                issues.push(
                    MissingSourceIssue {
                        file_path: file.clone(),
                        rows,
                    }
                    .into(),
                );
                continue;
            }
            FileRewrite::Unreadable(error) => {
                issues.push(
                    WriteFailedIssue {
                        file_path: file.clone(),
                        error,
                    }
                    .into(),
                );
                continue;
            }
            FileRewrite::Done(outcome) => outcome,
        };

        let fallback = outcome.mode == RewriteMode::Fallback;
        if let Some(error) = &outcome.parse_error {
            issues.push(
                ParseErrorIssue {
                    file_path: file.clone(),
                    error: error.clone(),
                    fallback,
                }
                .into(),
            );
        }
        if !outcome.changed() {
            continue;
        }

        let path = ctx.resolve(file);
        if !dry_run {
            let gaps = if fix_lint && ctx.config.restore_member_gaps {
                fs::read_to_string(&path)
                    .map(|original| MemberGaps::capture(&original))
                    .unwrap_or_default()
            } else {
                MemberGaps::default()
            };
            if let Err(e) = fs::write(&path, &outcome.content) {
                issues.push(
                    WriteFailedIssue {
                        file_path: file.clone(),
                        error: format!("failed to write file: {e}"),
                    }
                    .into(),
                );
                continue;
            }
            tracing::debug!(file = %file, replacements = outcome.replacements, "rewritten");
            rewritten.push(Rewritten {
                file: file.clone(),
                path,
                gaps,
            });
        }
        changes.push(FileChange {
            file: file.clone(),
            replacements: outcome.replacements,
            import_added: outcome.import_added,
            fallback,
        });
    }

    let mut formatted = false;
    let mut gaps_restored = 0;
    if fix_lint && !rewritten.is_empty() {
        match CommandFormatter::new(&ctx.config.formatter, &ctx.root_dir) {
            None => issues.push(
                ConfigWarningIssue {
                    file_path: None,
                    message: "--fix-lint given but no formatter is configured".to_string(),
                }
                .into(),
            ),
            Some(formatter) => {
                let paths: Vec<PathBuf> = rewritten.iter().map(|r| r.path.clone()).collect();
                match formatter.format(&paths) {
                    Ok(()) => {
                        formatted = true;
                        gaps_restored = restore_gaps(&rewritten, &mut issues);
                    }
                    Err(e) => {
                        tracing::warn!("formatter failed: {e:#}");
                        issues.push(
                            ConfigWarningIssue {
                                file_path: None,
                                message: format!("{e:#}"),
                            }
                            .into(),
                        );
                    }
                }
            }
        }
    }

    let summary = ReplaceSummary {
        changes,
        files_checked: targets.len(),
        is_dry_run: dry_run,
        formatted,
        gaps_restored,
    };
    Ok(CommandResult::new(CommandSummary::Replace(summary), issues))
}

/// A file to rewrite and the records it is rewritten against.
struct Target<'l> {
    /// Active records of the file's sheet.
    records: &'l [TranslationRecord],
    /// Ledger rows naming this file.
    rows: usize,
}

/// Every file named by an active row, plus every source file under a
/// configured root whose sheet is in the ledger. A sheet stores one row per
/// key, so the same text in other files is only reached through the root.
fn rewrite_targets<'l>(
    ctx: &ProjectContext,
    sheets: &'l BTreeMap<String, Vec<TranslationRecord>>,
) -> BTreeMap<String, Target<'l>> {
    let mut targets: BTreeMap<String, Target<'l>> = BTreeMap::new();
    for records in sheets.values() {
        let records = records.as_slice();
        for record in records {
            targets
                .entry(record.file.clone())
                .or_insert(Target { records, rows: 0 })
                .rows += 1;
        }
    }
    for root in &ctx.config.src_roots {
        let Some(records) = sheets.get(&sheet_name(root)).map(Vec::as_slice) else {
            continue;
        };
        if !ctx.resolve(root).is_dir() {
            continue;
        }
        for file in ctx.source_files(root) {
            targets.entry(file.rel).or_insert(Target { records, rows: 0 });
        }
    }
    targets
}

/// Active records per sheet name; sheets without active rows are left out.
fn active_records(ledger: &Ledger) -> BTreeMap<String, Vec<TranslationRecord>> {
    ledger
        .sheets
        .iter()
        .map(|sheet| {
            let records: Vec<TranslationRecord> = sheet.active_rows().map(LedgerRow::to_record).collect();
            (sheet.name.clone(), records)
        })
        .filter(|(_, records)| !records.is_empty())
        .collect()
}

/// Rewrites one target. A file no row names is only parsed when it holds
/// target-script text, the same gate extraction applies.
fn rewrite_file(
    ctx: &ProjectContext,
    rewriter: &Rewriter,
    script: &TargetScript,
    file: &str,
    target: &Target<'_>,
) -> FileRewrite {
    let path = ctx.resolve(file);
    if !path.is_file() {
        return FileRewrite::Missing { rows: target.rows };
    }
    match fs::read_to_string(&path) {
        Ok(source) if target.rows == 0 && !script.matches(&source) => {
            FileRewrite::Done(rewriter.rewrite(file, &source, &[]))
        }
        Ok(source) => FileRewrite::Done(rewriter.rewrite(file, &source, target.records)),
        Err(e) => FileRewrite::Unreadable(format!("failed to read file: {e}")),
    }
}

/// Puts back blank lines between class members that the formatter removed.
/// Returns how many were restored.
fn restore_gaps(rewritten: &[Rewritten], issues: &mut Vec<Issue>) -> usize {
    let mut restored = 0;
    for entry in rewritten.iter().filter(|r| !r.gaps.is_empty()) {
        let Ok(formatted) = fs::read_to_string(&entry.path) else {
            continue;
        };
        let content = entry.gaps.restore(&formatted);
        if content == formatted {
            continue;
        }
        restored += content.lines().count().saturating_sub(formatted.lines().count());
        if let Err(e) = fs::write(&entry.path, content) {
            issues.push(
                WriteFailedIssue {
                    file_path: entry.file.clone(),
                    error: format!("failed to restore member spacing: {e}"),
                }
                .into(),
            );
        }
    }
    restored
}
