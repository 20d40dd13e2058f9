//! Line suppressions derived from ignore directives.

use std::collections::BTreeSet;

use crate::core::collect::comments::CommentIndex;
use crate::core::collect::directive::Directive;
use crate::core::data::source::LineIndex;

/// Inclusive line range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisabledRange {
    pub start: usize,
    pub end: usize,
}

impl DisabledRange {
    fn overlaps(&self, start: usize, end: usize) -> bool {
        start <= self.end && end >= self.start
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Suppressions {
    pub file_ignored: bool,
    /// Lines carrying an `i18n-ignore` directive.
    pub directive_lines: BTreeSet<usize>,
    /// Directive lines where the comment stands alone; these also cover the
    /// whole statement that follows.
    pub statement_anchors: BTreeSet<usize>,
    pub disabled_ranges: Vec<DisabledRange>,
}

impl Suppressions {
    pub fn collect(comments: &CommentIndex, lines: &LineIndex) -> Self {
        let mut suppressions = Suppressions {
            file_ignored: comments
                .leading()
                .any(|c| Directive::parse(&c.text) == Some(Directive::IgnoreFile)),
            ..Default::default()
        };

        let mut open_start: Option<usize> = None;
        for comment in comments.iter() {
            match Directive::parse(&comment.text) {
                Some(Directive::Ignore) => {
                    suppressions.directive_lines.insert(comment.end_line);
                    if comment.standalone {
                        suppressions.statement_anchors.insert(comment.end_line);
                    }
                }
                Some(Directive::IgnoreStart) => {
                    open_start.get_or_insert(comment.line);
                }
                Some(Directive::IgnoreEnd) => {
                    if let Some(start) = open_start.take() {
                        suppressions.disabled_ranges.push(DisabledRange {
                            start,
                            end: comment.end_line,
                        });
                    }
                }
                // Only honored in the leading block
                Some(Directive::IgnoreFile) | None => {}
            }
        }
        if let Some(start) = open_start {
            suppressions.disabled_ranges.push(DisabledRange {
                start,
                end: lines.line_count(),
            });
        }
        suppressions
    }

    /// Extend standalone directives over the statement that follows them.
    ///
    /// `statements` are `(start_line, end_line)` spans. A statement follows an
    /// anchor when only blank or comment lines separate them; the outermost
    /// statement starting there wins.
    pub fn cover_statements(&mut self, statements: &[(usize, usize)], source: &str, lines: &LineIndex) {
        for &anchor in &self.statement_anchors {
            let mut target = anchor + 1;
            while target <= lines.line_count() && is_filler_line(lines.line_text(source, target)) {
                target += 1;
            }
            let end = statements
                .iter()
                .filter(|(start, _)| *start == target)
                .map(|(_, end)| *end)
                .max();
            if let Some(end) = end {
                self.disabled_ranges.push(DisabledRange { start: target, end });
            }
        }
    }

    /// Whether a node spanning `start_line..=end_line` is suppressed by a
    /// line or range directive. File-level ignores are checked separately.
    pub fn is_suppressed(&self, start_line: usize, end_line: usize) -> bool {
        if self
            .directive_lines
            .range(start_line.saturating_sub(1)..=end_line)
            .next()
            .is_some()
        {
            return true;
        }
        self.disabled_ranges
            .iter()
            .any(|r| r.overlaps(start_line, end_line))
    }
}

fn is_filler_line(text: &str) -> bool {
    let text = text.trim();
    text.is_empty()
        || text.starts_with("//")
        || text.starts_with("/*")
        || text.starts_with('*')
        || text.starts_with("{/*")
}
