pub mod command_result;
pub mod generate;
pub mod init;
pub mod replace;
pub mod scan;
pub mod sync;

pub use command_result::*;

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::core::context::ProjectContext;
use crate::core::ledger::{JsonLedgerStore, Ledger, LedgerStore};

/// The ledger at `path`, or the configured one.
pub(crate) fn ledger_store(ctx: &ProjectContext, path: Option<&Path>) -> JsonLedgerStore {
    let path = path.map_or_else(|| PathBuf::from(&ctx.config.ledger), Path::to_path_buf);
    JsonLedgerStore::new(ctx.resolve(path))
}

/// Loads a ledger that must exist.
pub(crate) fn load_ledger(store: &JsonLedgerStore) -> Result<Ledger> {
    match store.load()? {
        Some(ledger) => Ok(ledger),
        None => anyhow::bail!("ledger {} not found; run `hanzi scan` first", store.path().display()),
    }
}
