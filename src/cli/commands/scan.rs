use std::collections::HashSet;

use anyhow::Result;

use super::{CommandResult, CommandSummary, ScanSummary, SheetCount, ledger_store};
use crate::{
    cli::args::{ScanArgs, ScanCommand},
    core::{
        SourceLocation,
        context::ProjectContext,
        hooks::{NoopTranslator, SourceLinker},
        ledger::{Ledger, LedgerStore, Sheet},
    },
    issues::{ConfigWarningIssue, Issue, KeyCollisionIssue},
    utils::relative_to,
};

/// Extracts every configured root into the ledger, one sheet per root.
///
/// Translations already in the ledger are carried over to the rescanned
/// rows, and rows whose text is gone are kept as deleted. With `--file`,
/// only that file's rows change. The previous ledger is backed up first.
pub fn scan(cmd: ScanCommand) -> Result<CommandResult> {
    let ScanArgs {
        common,
        src,
        out,
        file,
        link_prefix,
    } = cmd.args;
    let mut ctx = ProjectContext::new(&common)?;
    let mut issues = std::mem::take(&mut ctx.issues);

    let store = ledger_store(&ctx, out.as_deref());
    let previous = store.load()?;
    let roots = if src.is_empty() {
        ctx.config.src_roots.clone()
    } else {
        src
    };
    // A single-file scan must derive keys the way the rest of the ledger did
    let scheme = match (&previous, &file) {
        (Some(previous), Some(_)) => previous.hash_scheme.clone(),
        _ => ctx.config.hash_scheme.clone(),
    };
    let extractor = ctx.extractor(&scheme);
    let linker = ctx.linker(link_prefix.as_deref());
    let linker = linker.as_ref().map(|l| l as &dyn SourceLinker);

    let mut ledger = Ledger::new(scheme);
    if let Some(previous) = &previous {
        ledger.sheets = previous.sheets.clone();
    }
    let mut scanned = HashSet::new();
    let mut files_scanned = 0;
    let mut occurrences = 0;
    for root in &roots {
        if !ctx.resolve(root).is_dir() {
            issues.push(
                ConfigWarningIssue {
                    file_path: None,
                    message: format!("source root '{root}' not found"),
                }
                .into(),
            );
            continue;
        }
        let extraction = ctx.extract_root(&extractor, root, file.as_deref());
        files_scanned += extraction.files_scanned;
        occurrences += extraction.records.len();
        issues.extend(extraction.issues);
        if file.is_some() && extraction.files_scanned == 0 {
            continue;
        }

        let (fresh, collisions) = Sheet::from_records(&extraction.sheet, &extraction.records, linker);
        issues.extend(collisions.into_iter().map(|c| -> Issue {
            KeyCollisionIssue {
                location: SourceLocation::new(c.file, c.line),
                key: c.key,
                kept: c.kept,
                dropped: c.dropped,
            }
            .into()
        }));
        if !scanned.insert(fresh.name.clone()) {
            tracing::warn!(sheet = %fresh.name, root = %root, "two roots share a sheet name; the later one wins");
        }

        let before = previous.as_ref().and_then(|p| p.sheet(&fresh.name));
        if before.is_none() && file.is_some() && fresh.rows.is_empty() {
            continue;
        }
        let mut sheet = match (before, file.as_deref()) {
            (Some(before), Some(only)) => before.splice_file(&normalize_rel(only), fresh),
            (Some(before), None) => {
                let mut fresh = fresh;
                fresh.carry_forward(before);
                fresh
            }
            (None, _) => fresh,
        };
        sheet.prefill(&ctx.config.locales, &NoopTranslator);
        ledger.put_sheet(sheet);
    }

    let backup = store.backup()?;
    store.save(&ledger)?;

    let summary = ScanSummary {
        ledger: relative_to(store.path(), &ctx.root_dir),
        backup: backup.as_deref().map(|p| relative_to(p, &ctx.root_dir)),
        files_scanned,
        occurrences,
        sheets: ledger
            .sheets
            .iter()
            .map(|s| SheetCount {
                name: s.name.clone(),
                rows: s.rows.len(),
            })
            .collect(),
    };
    Ok(CommandResult::new(CommandSummary::Scan(summary), issues))
}

fn normalize_rel(path: &str) -> String {
    path.trim_start_matches("./").replace('\\', "/")
}
