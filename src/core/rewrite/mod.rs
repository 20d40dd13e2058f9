//! Rewriting: replace extracted text with lookup calls.
//!
//! - `edits`: span-based edits with nesting
//! - `fallback`: regex rewriting for files no grammar accepts
//! - `import`: lookup-function import detection and placement
//!
//! The syntax path runs the same analysis as extraction, so anything the
//! extractor skipped is skipped here too. Only texts present in the
//! supplied records are touched; everything outside the replaced ranges is
//! preserved byte for byte.

pub mod edits;
pub mod fallback;
pub mod import;

use std::collections::HashMap;

pub use edits::{Edit, Part, apply_edits};
pub use fallback::FallbackOutcome;

use crate::core::data::TranslationRecord;
use crate::core::extract::{Candidate, SourceAnalysis, TemplateParts};
use crate::core::parsers::{ParsedSource, parse_source};
use crate::core::rules::RuleSet;
use crate::utils::{quote_single, split_bom};

pub const DEFAULT_LOOKUP_FN: &str = "t";
pub const DEFAULT_IMPORT_PATH: &str = "core/util/i18n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteOptions {
    pub lookup_fn: String,
    pub import_path: String,
    /// Used by the fallback path to approximate the test-attribute rule.
    pub test_attributes: Vec<String>,
}

impl Default for RewriteOptions {
    fn default() -> Self {
        Self {
            lookup_fn: DEFAULT_LOOKUP_FN.to_string(),
            import_path: DEFAULT_IMPORT_PATH.to_string(),
            test_attributes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteMode {
    /// No records were supplied; the file was not parsed.
    Skipped,
    Syntax,
    /// No grammar accepted the file; regex replacement was used.
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteOutcome {
    pub content: String,
    pub replacements: usize,
    pub import_added: bool,
    pub mode: RewriteMode,
    /// Parse errors that forced the fallback path.
    pub parse_error: Option<String>,
}

impl RewriteOutcome {
    fn unchanged(source: &str, mode: RewriteMode) -> Self {
        Self {
            content: source.to_string(),
            replacements: 0,
            import_added: false,
            mode,
            parse_error: None,
        }
    }

    pub fn changed(&self) -> bool {
        self.replacements > 0 || self.import_added
    }
}

/// Text to key, first record wins.
struct KeyIndex<'r> {
    keys: HashMap<&'r str, &'r str>,
}

impl<'r> KeyIndex<'r> {
    fn new(records: &'r [TranslationRecord]) -> Self {
        let mut keys = HashMap::new();
        for record in records {
            keys.entry(record.text.as_str()).or_insert(record.key.as_str());
        }
        Self { keys }
    }

    fn get(&self, text: &str) -> Option<&'r str> {
        self.keys.get(text).copied()
    }
}

pub struct Rewriter {
    rules: RuleSet,
    options: RewriteOptions,
}

impl Rewriter {
    pub fn new(rules: RuleSet, options: RewriteOptions) -> Self {
        Self { rules, options }
    }

    pub fn options(&self) -> &RewriteOptions {
        &self.options
    }

    /// Rewrite one file's source against `records`.
    ///
    /// Candidates are compared by their decoded values, so a literal
    /// written with escapes still finds its record. A leading byte order
    /// mark is kept in front of the output.
    pub fn rewrite(&self, file: &str, source: &str, records: &[TranslationRecord]) -> RewriteOutcome {
        let index = KeyIndex::new(records);
        if index.keys.is_empty() {
            return RewriteOutcome::unchanged(source, RewriteMode::Skipped);
        }

        let (bom, body) = split_bom(source);
        let mut outcome = match parse_source(body, file) {
            Ok(parsed) => self.rewrite_syntax(&parsed, body, &index),
            Err(failure) => {
                tracing::warn!(file, error = %failure, "falling back to textual rewrite");
                let mut outcome = self.rewrite_fallback(body, &index);
                outcome.parse_error = Some(failure.to_string());
                outcome
            }
        };
        outcome.content.insert_str(0, bom);
        outcome
    }

    fn call(&self, key: &str) -> String {
        format!("{}({})", self.options.lookup_fn, quote_single(key))
    }

    fn candidate_edits(&self, candidate: &Candidate, index: &KeyIndex<'_>) -> Vec<Edit> {
        match (&candidate.template, index.get(&candidate.text)) {
            (None, Some(key)) => {
                let call = self.call(key);
                let text = if candidate.needs_braces() {
                    format!("{{{call}}}")
                } else {
                    call
                };
                vec![Edit::replace(candidate.range.clone(), text)]
            }
            (None, None) => Vec::new(),
            (Some(parts), Some(key)) => vec![self.template_edit(candidate, parts, key)],
            (Some(parts), None) => self.segment_edits(parts, index),
        }
    }

    /// `t('key', { Identifier1: name })`
    fn template_edit(&self, candidate: &Candidate, parts: &TemplateParts, key: &str) -> Edit {
        if parts.placeholders.is_empty() {
            return Edit::replace(candidate.range.clone(), self.call(key));
        }
        let mut out = vec![Part::Text(format!(
            "{}({}, {{ ",
            self.options.lookup_fn,
            quote_single(key)
        ))];
        for (i, placeholder) in parts.placeholders.iter().enumerate() {
            if i > 0 {
                out.push(Part::Text(", ".to_string()));
            }
            out.push(Part::Text(format!("{}: ", placeholder.name)));
            out.push(Part::Source(placeholder.range.clone()));
        }
        out.push(Part::Text(" })".to_string()));
        Edit {
            range: candidate.range.clone(),
            parts: out,
        }
    }

    /// Records keyed on individual literal segments rather than the whole
    /// template: replace just those segments with `${t('key')}`.
    fn segment_edits(&self, parts: &TemplateParts, index: &KeyIndex<'_>) -> Vec<Edit> {
        parts
            .segments
            .iter()
            .filter(|segment| !segment.raw.trim().is_empty())
            .filter_map(|segment| {
                let key = index.get(&segment.raw)?;
                let range = segment.range.clone()?;
                Some(Edit::replace(range, format!("${{{}}}", self.call(key))))
            })
            .collect()
    }

    fn rewrite_syntax(&self, parsed: &ParsedSource, source: &str, index: &KeyIndex<'_>) -> RewriteOutcome {
        let analysis = SourceAnalysis::analyze(parsed, source, &self.rules);
        let mut edits: Vec<Edit> = analysis
            .included()
            .flat_map(|candidate| self.candidate_edits(candidate, index))
            .collect();
        let replacements = edits.len();
        if replacements == 0 {
            return RewriteOutcome::unchanged(source, RewriteMode::Syntax);
        }

        let import_added = !import::binds_lookup(parsed, &self.options.lookup_fn);
        if import_added {
            let at = import::insertion_offset(parsed, source, &analysis.lines);
            edits.push(Edit::insert(at, self.import_text(source, at)));
        }

        RewriteOutcome {
            content: apply_edits(source, edits),
            replacements,
            import_added,
            mode: RewriteMode::Syntax,
            parse_error: None,
        }
    }

    fn rewrite_fallback(&self, source: &str, index: &KeyIndex<'_>) -> RewriteOutcome {
        // Each text as written in the source: decoded, and with the escapes
        // a quoted literal needs for it
        let mut forms: Vec<(String, String)> = Vec::new();
        for (text, key) in &index.keys {
            let call = self.call(key);
            let escaped = fallback::escape_literal_body(text);
            if escaped != *text {
                forms.push((escaped, call.clone()));
            }
            forms.push((text.to_string(), call));
        }
        let mut pairs: Vec<(&str, String)> = forms.iter().map(|(text, call)| (text.as_str(), call.clone())).collect();
        // Longer texts first so a text containing another is replaced whole
        pairs.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(b.0)));

        let FallbackOutcome {
            mut content,
            replacements,
        } = fallback::fallback_rewrite(source, &pairs, &self.options.test_attributes);

        let import_added =
            replacements > 0 && !fallback::has_lookup_import(&content, &self.options.lookup_fn);
        if import_added {
            let at = fallback::textual_insertion_offset(&content);
            let text = self.import_text(&content, at);
            content.insert_str(at, &text);
        }

        RewriteOutcome {
            content,
            replacements,
            import_added,
            mode: RewriteMode::Fallback,
            parse_error: None,
        }
    }

    fn import_text(&self, source: &str, at: usize) -> String {
        let line = import::import_line(&self.options.lookup_fn, &self.options.import_path);
        if at > 0 && !source[..at].ends_with('\n') {
            format!("\n{line}\n")
        } else {
            format!("{line}\n")
        }
    }
}
