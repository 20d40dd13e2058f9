//! Dispatches parsed arguments to the command handlers.

use anyhow::Result;

use super::{
    args::{Arguments, Command},
    commands::{
        CommandResult, generate::gen_packs, init::init, replace::replace, scan::scan, sync::sync,
    },
};

pub fn run(Arguments { command }: Arguments) -> Result<CommandResult> {
    match command {
        Some(Command::Scan(cmd)) => scan(cmd),
        Some(Command::Replace(cmd)) => replace(cmd),
        Some(Command::Sync(cmd)) => sync(cmd),
        Some(Command::Gen(cmd)) => gen_packs(cmd),
        Some(Command::Init) => init(),
        None => {
            anyhow::bail!("No command provided. Use --help to see available commands.")
        }
    }
}
