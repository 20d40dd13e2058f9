//! Source file discovery.
//!
//! Ignore entries without `*` or `?` match as substrings of the path;
//! entries with wildcards are glob patterns matched against the
//! project-relative path.

use std::path::{Path, PathBuf};

use glob::Pattern;
use walkdir::WalkDir;

use crate::utils::relative_to;

/// A source file: absolute path plus the project-relative form stored in
/// the ledger.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SourceFile {
    pub rel: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Default)]
pub struct FileFilter {
    extensions: Vec<String>,
    substrings: Vec<String>,
    globs: Vec<Pattern>,
    skip_declaration_files: bool,
}

fn is_glob_pattern(pattern: &str) -> bool {
    pattern.contains('*') || pattern.contains('?')
}

impl FileFilter {
    /// Also returns a warning per ignore pattern that failed to compile.
    pub fn new(extensions: &[String], ignores: &[String], skip_declaration_files: bool) -> (Self, Vec<String>) {
        let mut filter = Self {
            extensions: extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_string())
                .collect(),
            skip_declaration_files,
            ..Self::default()
        };
        let mut warnings = Vec::new();
        for ignore in ignores.iter().filter(|i| !i.is_empty()) {
            if is_glob_pattern(ignore) {
                match Pattern::new(ignore) {
                    Ok(pattern) => filter.globs.push(pattern),
                    Err(e) => warnings.push(format!("invalid ignore pattern '{ignore}': {e}")),
                }
            } else {
                filter.substrings.push(ignore.clone());
            }
        }
        (filter, warnings)
    }

    pub fn is_ignored(&self, rel: &str) -> bool {
        self.substrings.iter().any(|s| rel.contains(s.as_str()))
            || self.globs.iter().any(|p| p.matches(rel))
    }

    pub fn is_source(&self, rel: &str) -> bool {
        if self.skip_declaration_files && (rel.ends_with(".d.ts") || rel.ends_with(".d.mts") || rel.ends_with(".d.cts")) {
            return false;
        }
        Path::new(rel)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e == ext))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    /// Sorted by relative path.
    pub files: Vec<SourceFile>,
    /// Entries walkdir could not read.
    pub skipped_count: usize,
}

/// Every source file under `root` (relative to `project_root`, or
/// absolute). A root that does not exist yields nothing.
pub fn scan_root(project_root: &Path, root: &str, filter: &FileFilter) -> ScanResult {
    let dir = project_root.join(root);
    let mut result = ScanResult::default();

    let walker = WalkDir::new(&dir).into_iter().filter_entry(|entry| {
        let rel = relative_to(entry.path(), project_root);
        entry.depth() == 0 || !filter.is_ignored(&rel)
    });
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!("cannot access path: {e}");
                result.skipped_count += 1;
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = relative_to(entry.path(), project_root);
        if filter.is_ignored(&rel) || !filter.is_source(&rel) {
            continue;
        }
        result.files.push(SourceFile {
            rel,
            path: entry.path().to_path_buf(),
        });
    }
    result.files.sort();
    result
}

/// Last path component of a root, used as its sheet name.
pub fn sheet_name(root: &str) -> String {
    let trimmed = root.trim_end_matches(['/', '\\']);
    match crate::utils::basename(trimmed) {
        "" | "." | ".." => "main".to_string(),
        name => name.to_string(),
    }
}
