use std::ops::Range;

use crate::core::rules::{CandidateKind, RuleName};
use crate::core::script::TargetScript;

/// A string-like node found during analysis, before filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub kind: CandidateKind,
    /// Canonical text.
    pub text: String,
    /// Byte range replaced when rewriting. Covers the quotes of string
    /// literals, the backticks of templates, and only the trimmed part of
    /// JSX text.
    pub range: Range<usize>,
    /// Reported 1-based line.
    pub line: usize,
    pub template: Option<TemplateParts>,
    /// First exclusion rule that fired.
    pub excluded_by: Option<RuleName>,
    /// Name of the innermost enclosing declaration.
    pub enclosing: Option<String>,
}

impl Candidate {
    pub fn is_excluded(&self) -> bool {
        self.excluded_by.is_some()
    }

    /// Whether the node carries target-script text. Templates count only
    /// their literal segments, never interpolated code.
    pub fn has_target_text(&self, script: &TargetScript) -> bool {
        match &self.template {
            Some(parts) => parts.segments.iter().any(|s| script.matches(&s.raw)),
            None => script.matches(&self.text),
        }
    }

    /// Wraps the replacement in `{...}` (JSX attribute values and text).
    pub fn needs_braces(&self) -> bool {
        matches!(self.kind, CandidateKind::AttrLiteral | CandidateKind::JsxText)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateParts {
    pub segments: Vec<TemplateSegment>,
    pub placeholders: Vec<Placeholder>,
}

/// Literal piece of a template, as written in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSegment {
    pub raw: String,
    /// Location of the raw text, when it could be pinned down.
    pub range: Option<Range<usize>>,
}

/// Interpolated expression and the placeholder name standing in for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub name: String,
    pub range: Range<usize>,
}
