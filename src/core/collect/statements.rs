//! Statement line spans, used to widen standalone `i18n-ignore` directives
//! over the whole statement that follows them.

use swc_common::{BytePos, Span, Spanned};
use swc_ecma_ast::{ClassMember, ModuleDecl, Program, Stmt};
use swc_ecma_visit::{Visit, VisitWith};

use crate::core::data::source::LineIndex;

pub struct StatementCollector<'a> {
    base: BytePos,
    lines: &'a LineIndex,
    spans: Vec<(usize, usize)>,
}

impl<'a> StatementCollector<'a> {
    pub fn collect(program: &Program, base: BytePos, lines: &'a LineIndex) -> Vec<(usize, usize)> {
        let mut collector = Self {
            base,
            lines,
            spans: Vec::new(),
        };
        program.visit_with(&mut collector);
        collector.spans
    }

    fn record(&mut self, span: Span) {
        if span.lo < self.base || span.hi < span.lo {
            return;
        }
        let start = (span.lo.0 - self.base.0) as usize;
        let end = ((span.hi.0 - self.base.0) as usize).saturating_sub(1).max(start);
        self.spans
            .push((self.lines.line_of(start), self.lines.line_of(end)));
    }
}

impl Visit for StatementCollector<'_> {
    fn visit_stmt(&mut self, node: &Stmt) {
        self.record(node.span());
        node.visit_children_with(self);
    }

    fn visit_module_decl(&mut self, node: &ModuleDecl) {
        self.record(node.span());
        node.visit_children_with(self);
    }

    fn visit_class_member(&mut self, node: &ClassMember) {
        self.record(node.span());
        node.visit_children_with(self);
    }
}

#[cfg(test)]
mod tests {
    use crate::core::collect::statements::*;
    use crate::core::parsers::parse_source;

    #[test]
    fn test_collects_nested_statement_spans() {
        let src = "function f() {\n  const a = {\n    x: 1,\n  };\n}\nexport const b = 2;\n";
        let parsed = parse_source(src, "a.js").unwrap();
        let lines = LineIndex::new(src);
        let spans = StatementCollector::collect(&parsed.program, parsed.base(), &lines);
        assert!(spans.contains(&(1, 5)));
        assert!(spans.contains(&(2, 4)));
        assert!(spans.contains(&(6, 6)));
    }
}
