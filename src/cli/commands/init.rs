use std::{fs, path::Path};

use anyhow::{Context, Result};

use super::{CommandResult, CommandSummary, InitSummary};
use crate::cli::ExitStatus;
use crate::config::{CONFIG_FILE_NAME, default_config_json};

/// Writes a default `.hanzirc.json` into the working directory.
pub fn init() -> Result<CommandResult> {
    init_in(Path::new("."))
}

pub fn init_in(dir: &Path) -> Result<CommandResult> {
    let config_path = dir.join(CONFIG_FILE_NAME);

    if config_path.exists() {
        eprintln!("Error: {} already exists", CONFIG_FILE_NAME);
        return Ok(CommandResult::new(
            CommandSummary::Init(InitSummary { created: false }),
            Vec::new(),
        )
        .with_status(ExitStatus::Failure));
    }

    fs::write(&config_path, default_config_json()? + "\n")
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    Ok(CommandResult::new(
        CommandSummary::Init(InitSummary { created: true }),
        Vec::new(),
    ))
}
