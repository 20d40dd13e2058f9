use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use rayon::prelude::*;

use crate::{
    cli::args::CommonArgs,
    config::{Config, load_config},
    core::{
        TranslationRecord,
        extract::Extractor,
        files::{FileFilter, SourceFile, scan_root, sheet_name},
        hash::HashScheme,
        hooks::PrefixLinker,
        rewrite::{RewriteOptions, Rewriter},
        rules::RuleSet,
    },
    issues::{ConfigWarningIssue, Issue, ParseErrorIssue},
    utils::display_path,
};

/// Records extracted from one source root.
#[derive(Debug, Clone, Default)]
pub struct RootExtraction {
    /// Sheet the root maps to.
    pub sheet: String,
    pub files_scanned: usize,
    /// Sorted by `(file, line, text)`.
    pub records: Vec<TranslationRecord>,
    pub issues: Vec<Issue>,
}

/// Configuration and project root for one command run.
///
/// The project root is the directory holding the config file, or the
/// working directory when there is none. Every relative path in the config
/// and in the ledger is taken from it.
pub struct ProjectContext {
    pub config: Config,
    pub root_dir: PathBuf,
    pub verbose: bool,
    /// Config problems, reported with the command's own issues.
    pub issues: Vec<Issue>,
    filter: FileFilter,
}

impl ProjectContext {
    pub fn new(common_args: &CommonArgs) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to read the working directory")?;
        let loaded = load_config(&cwd, common_args.config.as_deref())?;

        if common_args.verbose && loaded.path.is_none() {
            eprintln!("Note: No .hanzirc.json found, using default configuration");
        }

        let root_dir = loaded
            .path
            .as_deref()
            .and_then(Path::parent)
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or(cwd);
        let config_file = loaded.path.as_deref().map(display_path);

        let mut context = Self::from_config(loaded.config, root_dir, common_args.verbose);
        let mut issues: Vec<Issue> = loaded
            .warnings
            .into_iter()
            .map(|message| {
                ConfigWarningIssue {
                    file_path: config_file.clone(),
                    message,
                }
                .into()
            })
            .collect();
        issues.append(&mut context.issues);
        context.issues = issues;
        Ok(context)
    }

    pub fn from_config(config: Config, root_dir: PathBuf, verbose: bool) -> Self {
        let (filter, warnings) = FileFilter::new(
            &config.extensions,
            &config.ignores,
            config.skip_declaration_files,
        );
        let issues = warnings
            .into_iter()
            .map(|message| {
                ConfigWarningIssue {
                    file_path: None,
                    message,
                }
                .into()
            })
            .collect();
        Self {
            config,
            root_dir,
            verbose,
            issues,
            filter,
        }
    }

    /// `path` joined onto the project root unless already absolute.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root_dir.join(path)
        }
    }

    pub fn rule_set(&self) -> RuleSet {
        RuleSet::new(&self.config.test_attributes, &self.config.style_factories)
    }

    /// Extractor deriving keys with `scheme`, which must be the scheme of
    /// the ledger the records end up in.
    pub fn extractor(&self, scheme: &HashScheme) -> Extractor {
        let (script, _) = self.config.target_script();
        Extractor::new(self.rule_set(), script, scheme.clone())
    }

    pub fn rewriter(&self, import_path: Option<&str>) -> Rewriter {
        Rewriter::new(
            self.rule_set(),
            RewriteOptions {
                lookup_fn: self.config.lookup_fn.clone(),
                import_path: import_path.unwrap_or(&self.config.import_path).to_string(),
                test_attributes: self.config.test_attributes.clone(),
            },
        )
    }

    /// Linker from the CLI override or `linkPrefix`.
    pub fn linker(&self, prefix: Option<&str>) -> Option<PrefixLinker> {
        prefix
            .or(self.config.link_prefix.as_deref())
            .filter(|p| !p.is_empty())
            .map(PrefixLinker::new)
    }

    pub fn source_files(&self, root: &str) -> Vec<SourceFile> {
        let result = scan_root(&self.root_dir, root, &self.filter);
        if result.skipped_count > 0 {
            eprintln!(
                "Warning: {} path(s) skipped due to access errors{}",
                result.skipped_count,
                if self.verbose { "" } else { " (use -v for details)" }
            );
        }
        result.files
    }

    /// Extracts every source file under `root`, in parallel. With `only`,
    /// just that project-relative file. Unparseable files are skipped and
    /// reported.
    pub fn extract_root(&self, extractor: &Extractor, root: &str, only: Option<&str>) -> RootExtraction {
        let mut files = self.source_files(root);
        if let Some(only) = only {
            let only = only.trim_start_matches("./").replace('\\', "/");
            files.retain(|f| f.rel == only);
        }
        tracing::debug!(root, files = files.len(), "extracting");

        let results: Vec<_> = files
            .par_iter()
            .map(|file| {
                let result = std::fs::read_to_string(&file.path)
                    .map_err(|e| format!("failed to read file: {e}"))
                    .and_then(|source| {
                        extractor
                            .extract(&file.rel, &source)
                            .map_err(|failure| failure.to_string())
                    });
                (file, result)
            })
            .collect();

        let mut extraction = RootExtraction {
            sheet: sheet_name(root),
            files_scanned: files.len(),
            ..RootExtraction::default()
        };
        for (file, result) in results {
            match result {
                Ok(records) => {
                    tracing::debug!(file = %file.rel, records = records.len(), "extracted");
                    extraction.records.extend(records);
                }
                Err(error) => {
                    tracing::warn!(file = %file.rel, "skipped: {error}");
                    extraction.issues.push(
                        ParseErrorIssue {
                            file_path: file.rel.clone(),
                            error,
                            fallback: false,
                        }
                        .into(),
                    );
                }
            }
        }
        extraction
            .records
            .sort_by(|a, b| (&a.file, a.line, &a.text).cmp(&(&b.file, b.line, &b.text)));
        extraction
    }
}
