use std::path::{Path, PathBuf};

use anyhow::Result;

use super::{CommandResult, CommandSummary, GenSummary, ledger_store, load_ledger};
use crate::{
    cli::{
        ExitStatus,
        args::{GenArgs, GenCommand},
    },
    core::{
        context::ProjectContext,
        ledger::{JsonLedgerStore, Ledger, LedgerStore},
        merge::{GenerateOutcome, generate, incoming_packs},
    },
    utils::relative_to,
};

/// Merges the ledger's active rows into `<locale>.json` packs. Any value
/// that would overwrite a different existing one blocks the whole run until
/// the conflict report carries a selection for it.
pub fn gen_packs(cmd: GenCommand) -> Result<CommandResult> {
    let GenArgs {
        common,
        ledger,
        out,
        conflicts,
        master,
    } = cmd.args;
    let mut ctx = ProjectContext::new(&common)?;
    let issues = std::mem::take(&mut ctx.issues);

    let store = ledger_store(&ctx, ledger.as_deref());
    let ledger = load_ledger(&store)?;

    let out_dir = ctx.resolve(out.unwrap_or_else(|| PathBuf::from(&ctx.config.locales_dir)));
    let report_path = ctx.resolve(conflicts.unwrap_or_else(|| PathBuf::from(&ctx.config.conflict_report)));

    let incoming = incoming_packs(&ledger, &ctx.config.source_locale);
    let outcome = generate(&incoming, &out_dir, &report_path)?;

    let mut master_path = None;
    let status = match &outcome {
        GenerateOutcome::Written { .. } => {
            if let Some(master) = master {
                let master_store = JsonLedgerStore::new(ctx.resolve(master));
                let mut merged = master_store
                    .load()?
                    .unwrap_or_else(|| Ledger::new(ledger.hash_scheme.clone()));
                if merged.hash_scheme != ledger.hash_scheme {
                    tracing::warn!(
                        master = %master_store.path().display(),
                        "master ledger uses a different hash scheme"
                    );
                }
                ledger.append_into(&mut merged);
                master_store.save(&merged)?;
                master_path = Some(relative_to(master_store.path(), &ctx.root_dir));
            }
            ExitStatus::Success
        }
        GenerateOutcome::Blocked { .. } => ExitStatus::Failure,
    };

    let summary = GenSummary {
        outcome: relative_outcome(outcome, &ctx.root_dir),
        master: master_path,
    };
    Ok(CommandResult::new(CommandSummary::Gen(summary), issues).with_status(status))
}

fn relative_outcome(outcome: GenerateOutcome, root: &Path) -> GenerateOutcome {
    let relative = |path: &Path| PathBuf::from(relative_to(path, root));
    match outcome {
        GenerateOutcome::Written { files, resolved } => GenerateOutcome::Written {
            files: files.iter().map(|f| relative(f.as_path())).collect(),
            resolved,
        },
        GenerateOutcome::Blocked {
            report,
            unresolved,
            total,
        } => GenerateOutcome::Blocked {
            report: relative(report.as_path()),
            unresolved,
            total,
        },
    }
}
