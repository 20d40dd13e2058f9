//! Extension points around the pipeline: machine translation, source
//! links and the external formatter.

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, bail};

/// Pre-fills locale columns for new rows.
pub trait Translator: Send + Sync {
    /// `None` leaves the column for a human.
    fn translate(&self, text: &str, locale: &str) -> Option<String>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTranslator;

impl Translator for NoopTranslator {
    fn translate(&self, _text: &str, _locale: &str) -> Option<String> {
        None
    }
}

/// Builds the traceability link stored with a ledger row.
pub trait SourceLinker: Send + Sync {
    fn link(&self, file: &str, line: usize) -> String;
}

/// `<prefix>/<file>#L<line>`, e.g. a repository blob URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixLinker {
    prefix: String,
}

impl PrefixLinker {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.trim_end_matches('/').to_string(),
        }
    }
}

impl SourceLinker for PrefixLinker {
    fn link(&self, file: &str, line: usize) -> String {
        format!("{}/{}#L{}", self.prefix, file.trim_start_matches("./"), line)
    }
}

/// Normalizes rewritten files in place.
pub trait Formatter {
    fn format(&self, files: &[PathBuf]) -> Result<()>;
}

/// Runs a configured command with the files appended, e.g.
/// `npx prettier --write <files>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFormatter {
    argv: Vec<String>,
    cwd: PathBuf,
}

impl CommandFormatter {
    /// `None` when `argv` is empty.
    pub fn new(argv: &[String], cwd: &Path) -> Option<Self> {
        if argv.is_empty() {
            return None;
        }
        Some(Self {
            argv: argv.to_vec(),
            cwd: cwd.to_path_buf(),
        })
    }
}

impl Formatter for CommandFormatter {
    fn format(&self, files: &[PathBuf]) -> Result<()> {
        let Some((program, args)) = self.argv.split_first() else {
            return Ok(());
        };
        if files.is_empty() {
            return Ok(());
        }
        tracing::debug!(program = %program, files = files.len(), "running formatter");
        let status = Command::new(program)
            .args(args)
            .args(files)
            .current_dir(&self.cwd)
            .status()
            .with_context(|| format!("failed to run formatter `{}`", self.argv.join(" ")))?;
        if !status.success() {
            bail!("formatter `{}` exited with {}", self.argv.join(" "), status);
        }
        Ok(())
    }
}
