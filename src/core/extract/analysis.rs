//! Per-file analysis shared by the extractor and the rewriter.

use swc_ecma_visit::VisitWith;

use crate::core::collect::{CommentIndex, StatementCollector, Suppressions};
use crate::core::data::source::LineIndex;
use crate::core::extract::candidate::Candidate;
use crate::core::extract::visitor::CandidateCollector;
use crate::core::parsers::ParsedSource;
use crate::core::rules::{FileFacts, RuleSet};

/// Every candidate in one file with its exclusion verdict, plus the
/// indexes it was judged against.
pub struct SourceAnalysis {
    pub lines: LineIndex,
    pub comments: CommentIndex,
    pub suppressions: Suppressions,
    pub candidates: Vec<Candidate>,
}

impl SourceAnalysis {
    pub fn analyze(parsed: &ParsedSource, source: &str, rules: &RuleSet) -> Self {
        let lines = LineIndex::new(source);
        let comments = CommentIndex::from_swc(&parsed.comments, parsed.base(), source, &lines);
        let mut suppressions = Suppressions::collect(&comments, &lines);

        if suppressions.file_ignored {
            return Self {
                lines,
                comments,
                suppressions,
                candidates: Vec::new(),
            };
        }

        if !suppressions.statement_anchors.is_empty() {
            let statements = StatementCollector::collect(&parsed.program, parsed.base(), &lines);
            suppressions.cover_statements(&statements, source, &lines);
        }

        let facts = FileFacts {
            comments: &comments,
            suppressions: &suppressions,
        };
        let mut collector = CandidateCollector::new(parsed.base(), source, &lines, rules, facts);
        parsed.program.visit_with(&mut collector);
        let candidates = collector.into_candidates();

        Self {
            lines,
            comments,
            suppressions,
            candidates,
        }
    }

    /// Candidates no rule excluded.
    pub fn included(&self) -> impl Iterator<Item = &Candidate> {
        self.candidates.iter().filter(|c| !c.is_excluded())
    }
}
