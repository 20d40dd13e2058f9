use std::fs;

use anyhow::{Context, Result};

use super::{CommandResult, CommandSummary, SyncCounts, SyncSummary, ledger_store, load_ledger};
use crate::{
    cli::args::{SyncArgs, SyncCommand},
    core::{
        SourceLocation,
        context::ProjectContext,
        hooks::{NoopTranslator, SourceLinker},
        ledger::{JsonLedgerStore, LedgerStore, Sheet},
        reconcile::{reconcile, render_report},
    },
    issues::{ConfigWarningIssue, Issue, KeyCollisionIssue},
    utils::relative_to,
};

/// Reconciles each sheet of an existing ledger with a fresh extraction of
/// its root, keeping every translation whose text survived.
pub fn sync(cmd: SyncCommand) -> Result<CommandResult> {
    let SyncArgs {
        common,
        ledger,
        src,
        output,
        report,
        link_prefix,
    } = cmd.args;
    let mut ctx = ProjectContext::new(&common)?;
    let mut issues = std::mem::take(&mut ctx.issues);

    let store = ledger_store(&ctx, ledger.as_deref());
    let mut ledger = load_ledger(&store)?;
    let extractor = ctx.extractor(&ledger.hash_scheme);
    let roots = if src.is_empty() {
        ctx.config.src_roots.clone()
    } else {
        src
    };
    let linker = ctx.linker(link_prefix.as_deref());
    let linker = linker.as_ref().map(|l| l as &dyn SourceLinker);

    let mut results = Vec::new();
    for root in &roots {
        if !ctx.resolve(root).is_dir() {
            issues.push(
                ConfigWarningIssue {
                    file_path: None,
                    message: format!("source root '{root}' not found; its sheet was left as is"),
                }
                .into(),
            );
            continue;
        }
        let extraction = ctx.extract_root(&extractor, root, None);
        issues.extend(extraction.issues);

        let existing = ledger
            .sheet(&extraction.sheet)
            .map(Sheet::records)
            .unwrap_or_default();
        let result = reconcile(&existing, &extraction.records);
        tracing::debug!(
            sheet = %extraction.sheet,
            matched = result.matched.len(),
            moved = result.updated.len(),
            new = result.new_items.len(),
            missing = result.missing.len(),
            "reconciled"
        );

        let (mut sheet, collisions) = Sheet::from_sync(&extraction.sheet, &result, linker);
        issues.extend(collisions.into_iter().map(|c| -> Issue {
            KeyCollisionIssue {
                location: SourceLocation::new(c.file, c.line),
                key: c.key,
                kept: c.kept,
                dropped: c.dropped,
            }
            .into()
        }));
        sheet.prefill(&ctx.config.locales, &NoopTranslator);
        ledger.put_sheet(sheet);
        results.push((extraction.sheet, result));
    }

    let target = match &output {
        Some(path) => JsonLedgerStore::new(ctx.resolve(path)),
        None => store,
    };
    let backup = target.backup()?;
    target.save(&ledger)?;

    let report_path = ctx.resolve(report.unwrap_or_else(|| ctx.config.sync_report.clone().into()));
    if let Some(parent) = report_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(&report_path, render_report(&results))
        .with_context(|| format!("Failed to write sync report {}", report_path.display()))?;

    let summary = SyncSummary {
        ledger: relative_to(target.path(), &ctx.root_dir),
        backup: backup.as_deref().map(|p| relative_to(p, &ctx.root_dir)),
        report: relative_to(&report_path, &ctx.root_dir),
        sheets: results
            .iter()
            .map(|(sheet, result)| SyncCounts {
                sheet: sheet.clone(),
                matched: result.matched.len(),
                moved: result.updated.len(),
                new_items: result.new_items.len(),
                missing: result.missing.len(),
            })
            .collect(),
    };
    Ok(CommandResult::new(CommandSummary::Sync(summary), issues))
}
