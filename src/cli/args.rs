//! CLI argument definitions using clap.
//!
//! ## Commands
//!
//! - `scan`: Extract target-script text into a fresh ledger
//! - `replace`: Rewrite sources so ledger texts become lookup calls
//! - `sync`: Reconcile an existing ledger with the current sources
//! - `gen`: Merge the ledger into per-locale packs
//! - `init`: Initialize the configuration file

use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Arguments {
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Arguments {
    /// Check if a command was provided, otherwise print help and return None.
    pub fn with_command_or_help(self) -> Option<Self> {
        if self.command.is_none() {
            Self::command().print_help().ok();
            None
        } else {
            Some(self)
        }
    }

    /// Get the verbose flag from the command's common args.
    pub fn verbose(&self) -> bool {
        match &self.command {
            Some(Command::Scan(cmd)) => cmd.args.common.verbose,
            Some(Command::Replace(cmd)) => cmd.args.common.verbose,
            Some(Command::Sync(cmd)) => cmd.args.common.verbose,
            Some(Command::Gen(cmd)) => cmd.args.common.verbose,
            Some(Command::Init) | None => false,
        }
    }
}

/// Common arguments shared by all commands.
#[derive(Debug, Clone, Default, Args)]
pub struct CommonArgs {
    /// Config file to use instead of the nearest .hanzirc.json
    #[arg(long, env = "HANZI_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Parser)]
pub struct ScanArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Source roots, comma separated (overrides srcRoots)
    #[arg(long, value_delimiter = ',')]
    pub src: Vec<String>,

    /// Ledger to write (overrides ledger)
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Only scan this project-relative file
    #[arg(long)]
    pub file: Option<String>,

    /// Prefix for source links, e.g. a repository blob URL (overrides linkPrefix)
    #[arg(long)]
    pub link_prefix: Option<String>,
}

#[derive(Debug, Args)]
pub struct ScanCommand {
    #[command(flatten)]
    pub args: ScanArgs,
}

#[derive(Debug, Parser)]
pub struct ReplaceArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Ledger to read (overrides ledger)
    #[arg(long)]
    pub ledger: Option<PathBuf>,

    /// Module the lookup function is imported from (overrides importPath)
    #[arg(long)]
    pub import_path: Option<String>,

    /// Only rewrite this project-relative file
    #[arg(long)]
    pub file: Option<String>,

    /// Run the configured formatter on changed files
    #[arg(long)]
    pub fix_lint: bool,

    /// Report what would change without writing
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Args)]
pub struct ReplaceCommand {
    #[command(flatten)]
    pub args: ReplaceArgs,
}

#[derive(Debug, Parser)]
pub struct SyncArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Ledger to reconcile (overrides ledger)
    #[arg(long)]
    pub ledger: Option<PathBuf>,

    /// Source roots, comma separated (overrides srcRoots)
    #[arg(long, value_delimiter = ',')]
    pub src: Vec<String>,

    /// Where to write the reconciled ledger (default: in place)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Markdown report path (overrides syncReport)
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Prefix for source links (overrides linkPrefix)
    #[arg(long)]
    pub link_prefix: Option<String>,
}

#[derive(Debug, Args)]
pub struct SyncCommand {
    #[command(flatten)]
    pub args: SyncArgs,
}

#[derive(Debug, Parser)]
pub struct GenArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Ledger to read (overrides ledger)
    #[arg(long)]
    pub ledger: Option<PathBuf>,

    /// Directory of <locale>.json packs (overrides localesDir)
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Conflict report path (overrides conflictReport)
    #[arg(long)]
    pub conflicts: Option<PathBuf>,

    /// Master ledger to append this ledger's sheets to after generating
    #[arg(long)]
    pub master: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct GenCommand {
    #[command(flatten)]
    pub args: GenArgs,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract translatable text from source roots into a new ledger
    Scan(ScanCommand),
    /// Replace ledger texts in source files with lookup calls
    Replace(ReplaceCommand),
    /// Reconcile the ledger with the current sources, keeping translations
    Sync(SyncCommand),
    /// Generate per-locale packs from the ledger
    Gen(GenCommand),
    /// Initialize a new .hanzirc.json configuration file
    Init,
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use crate::cli::args::*;

    #[test]
    fn test_src_is_comma_separated() {
        let args = Arguments::parse_from(["hanzi", "scan", "--src", "app/src,lib", "-v"]);
        let Some(Command::Scan(cmd)) = args.command else {
            panic!("expected scan");
        };
        assert_eq!(cmd.args.src, vec!["app/src", "lib"]);
        assert!(cmd.args.common.verbose);
    }

    #[test]
    fn test_verbose_defaults_to_false() {
        let args = Arguments::parse_from(["hanzi", "gen", "--out", "i18n"]);
        assert!(!args.verbose());
    }
}
