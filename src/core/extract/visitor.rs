//! AST pass that finds every string-like node and evaluates the exclusion
//! rules against it.
//!
//! The visitor keeps a stack of [`Frame`]s describing the constructs that
//! enclose the current node. Rules only ever look at that stack, so the
//! same verdict is reached whether the caller extracts or rewrites.

use swc_common::{BytePos, Span};
use swc_ecma_ast::{
    ArrowExpr, BinaryOp, Callee, Class, ClassDecl, ClassMethod, Expr, FnDecl, Function,
    JSXAttr, JSXAttrName, JSXAttrValue, JSXText, MemberProp, Pat, Prop, PropName, Str, TaggedTpl,
    Tpl, TsInterfaceDecl, TsLit, TsLitType, TsType, TsTypeAliasDecl, TsTypeAnn, VarDeclarator,
};
use swc_ecma_visit::{Visit, VisitWith};

use crate::core::data::source::LineIndex;
use crate::core::extract::candidate::{Candidate, Placeholder, TemplateParts, TemplateSegment};
use crate::core::extract::template::{PlaceholderNamer, canonical_text};
use crate::core::rules::{CandidateKind, FileFacts, Frame, NodeContext, RuleSet};

pub struct CandidateCollector<'a> {
    base: BytePos,
    source: &'a str,
    lines: &'a LineIndex,
    rules: &'a RuleSet,
    facts: FileFacts<'a>,
    frames: Vec<Frame>,
    names: Vec<String>,
    candidates: Vec<Candidate>,
}

impl<'a> CandidateCollector<'a> {
    pub fn new(
        base: BytePos,
        source: &'a str,
        lines: &'a LineIndex,
        rules: &'a RuleSet,
        facts: FileFacts<'a>,
    ) -> Self {
        Self {
            base,
            source,
            lines,
            rules,
            facts,
            frames: Vec::new(),
            names: Vec::new(),
            candidates: Vec::new(),
        }
    }

    pub fn into_candidates(mut self) -> Vec<Candidate> {
        self.candidates.sort_by_key(|c| (c.range.start, c.range.end));
        self.candidates
    }

    fn offset(&self, pos: BytePos) -> usize {
        pos.0.saturating_sub(self.base.0) as usize
    }

    fn range(&self, span: Span) -> std::ops::Range<usize> {
        self.offset(span.lo)..self.offset(span.hi)
    }

    fn with_frame<F>(&mut self, frame: Frame, f: F)
    where
        F: FnOnce(&mut Self),
    {
        self.frames.push(frame);
        f(self);
        self.frames.pop();
    }

    fn with_name<F>(&mut self, name: Option<String>, f: F)
    where
        F: FnOnce(&mut Self),
    {
        let pushed = name.map(|n| self.names.push(n)).is_some();
        f(self);
        if pushed {
            self.names.pop();
        }
    }

    fn push(
        &mut self,
        kind: CandidateKind,
        text: String,
        range: std::ops::Range<usize>,
        line: Option<usize>,
        template: Option<TemplateParts>,
    ) {
        let start_line = self.lines.line_of(range.start);
        let end_line = self
            .lines
            .line_of(range.end.saturating_sub(1).max(range.start));
        let node = NodeContext {
            kind,
            path: &self.frames,
            start: range.start,
            end: range.end,
            start_line,
            end_line,
        };
        let excluded_by = self.rules.first_match(&node, &self.facts);
        self.candidates.push(Candidate {
            kind,
            text,
            range,
            line: line.unwrap_or(start_line),
            template,
            excluded_by,
            enclosing: self.names.last().cloned(),
        });
    }

    fn string_literal(&mut self, node: &Str, kind: CandidateKind) {
        // Lone surrogates have no UTF-8 form and cannot hold target text
        let Some(value) = node.value.as_str() else {
            return;
        };
        if value.trim().is_empty() {
            return;
        }
        let range = self.range(node.span);
        self.push(kind, value.to_string(), range, None, None);
    }

    fn template(&mut self, tpl: &Tpl) {
        let range = self.range(tpl.span);
        let mut namer = PlaceholderNamer::default();
        let mut segments = Vec::with_capacity(tpl.quasis.len());
        let mut placeholders = Vec::with_capacity(tpl.exprs.len());
        let mut search_from = range.start + 1;

        for (i, quasi) in tpl.quasis.iter().enumerate() {
            let raw: &str = &quasi.raw;
            let seg_range = self.locate_segment(raw, self.range(quasi.span), search_from);
            if let Some(r) = &seg_range {
                search_from = r.end;
            }
            segments.push(TemplateSegment {
                raw: raw.to_string(),
                range: seg_range,
            });
            if let Some(expr) = tpl.exprs.get(i) {
                let expr_range = self.range(expr_span(expr));
                search_from = search_from.max(expr_range.end);
                placeholders.push(Placeholder {
                    name: namer.next_name(expr),
                    range: expr_range,
                });
            }
        }

        let raws: Vec<&str> = segments.iter().map(|s| s.raw.as_str()).collect();
        let names: Vec<String> = placeholders.iter().map(|p| p.name.clone()).collect();
        let text = canonical_text(&raws, &names);

        let start_line = self.lines.line_of(range.start);
        let line = if self.rest_of_line_is_blank(range.start + 1) {
            start_line + 1
        } else {
            start_line
        };

        if !text.trim().is_empty() {
            self.push(
                CandidateKind::Template,
                text,
                range,
                Some(line),
                Some(TemplateParts {
                    segments,
                    placeholders,
                }),
            );
        }

        self.with_frame(Frame::Template, |this| {
            for expr in &tpl.exprs {
                expr.visit_with(this);
            }
        });
    }

    /// Pin a raw segment to its byte range: trust the quasi span when the
    /// text there matches, otherwise search forward from the previous piece.
    fn locate_segment(
        &self,
        raw: &str,
        span_range: std::ops::Range<usize>,
        search_from: usize,
    ) -> Option<std::ops::Range<usize>> {
        if self.source.get(span_range.clone()) == Some(raw) {
            return Some(span_range);
        }
        let found = self.source.get(search_from..)?.find(raw)?;
        let start = search_from + found;
        Some(start..start + raw.len())
    }

    fn rest_of_line_is_blank(&self, offset: usize) -> bool {
        let rest = self.source.get(offset..).unwrap_or_default();
        let line = rest.split('\n').next().unwrap_or_default();
        line.trim().is_empty() && rest.contains('\n')
    }
}

fn expr_span(expr: &Expr) -> Span {
    use swc_common::Spanned;
    expr.span()
}

fn callee_path(callee: &Callee) -> Option<String> {
    match callee {
        Callee::Expr(expr) => expr_path(expr),
        _ => None,
    }
}

/// Dotted path of a static member chain, e.g. `StyleSheet.create`.
fn expr_path(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Ident(ident) => Some(ident.sym.to_string()),
        Expr::Member(member) => match &member.prop {
            MemberProp::Ident(prop) => Some(format!("{}.{}", expr_path(&member.obj)?, prop.sym)),
            _ => None,
        },
        Expr::Paren(paren) => expr_path(&paren.expr),
        _ => None,
    }
}

fn prop_name(key: &PropName) -> Option<String> {
    match key {
        PropName::Ident(ident) => Some(ident.sym.to_string()),
        PropName::Str(s) => s.value.as_str().map(|s| s.to_string()),
        PropName::Num(n) => Some(n.value.to_string()),
        _ => None,
    }
}

fn jsx_attr_name(name: &JSXAttrName) -> String {
    match name {
        JSXAttrName::Ident(ident) => ident.sym.to_string(),
        JSXAttrName::JSXNamespacedName(ns) => format!("{}:{}", ns.ns.sym, ns.name.sym),
    }
}

impl Visit for CandidateCollector<'_> {
    // ------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------

    fn visit_expr(&mut self, node: &Expr) {
        match node {
            Expr::Lit(swc_ecma_ast::Lit::Str(s)) => self.string_literal(s, CandidateKind::Literal),
            Expr::Tpl(tpl) => self.template(tpl),
            Expr::Paren(_) => self.with_frame(Frame::Paren, |this| node.visit_children_with(this)),
            Expr::Bin(bin) if bin.op == BinaryOp::Add => {
                self.with_frame(Frame::Concat, |this| node.visit_children_with(this))
            }
            Expr::Bin(bin)
                if matches!(
                    bin.op,
                    BinaryOp::LogicalAnd | BinaryOp::LogicalOr | BinaryOp::NullishCoalescing
                ) =>
            {
                self.with_frame(Frame::Choice, |this| node.visit_children_with(this))
            }
            Expr::Cond(_) => self.with_frame(Frame::Choice, |this| node.visit_children_with(this)),
            Expr::Call(call) => {
                let callee = callee_path(&call.callee);
                self.with_frame(Frame::Call { callee }, |this| {
                    node.visit_children_with(this)
                })
            }
            _ => self.with_frame(Frame::Expr, |this| node.visit_children_with(this)),
        }
    }

    fn visit_tagged_tpl(&mut self, node: &TaggedTpl) {
        // The tag owns its literal text; only interpolations are visited
        node.tag.visit_with(self);
        node.type_params.visit_with(self);
        self.with_frame(Frame::Template, |this| {
            for expr in &node.tpl.exprs {
                expr.visit_with(this);
            }
        });
    }

    fn visit_prop(&mut self, node: &Prop) {
        match node {
            Prop::KeyValue(kv) => {
                if let PropName::Computed(computed) = &kv.key {
                    computed.visit_with(self);
                }
                let name = prop_name(&kv.key).unwrap_or_default();
                self.with_frame(Frame::Attribute { name }, |this| kv.value.visit_with(this));
            }
            _ => node.visit_children_with(self),
        }
    }

    // ------------------------------------------------------------
    // JSX
    // ------------------------------------------------------------

    fn visit_jsx_attr(&mut self, node: &JSXAttr) {
        let name = jsx_attr_name(&node.name);
        self.with_frame(Frame::Attribute { name }, |this| match &node.value {
            Some(JSXAttrValue::Str(s)) => this.string_literal(s, CandidateKind::AttrLiteral),
            Some(value) => value.visit_with(this),
            None => {}
        });
    }

    fn visit_jsx_text(&mut self, node: &JSXText) {
        let value: &str = &node.value;
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return;
        }
        let full = self.range(node.span);
        let raw = self.source.get(full.clone()).unwrap_or(value);
        let lead = raw.len() - raw.trim_start().len();
        let trail = raw.len() - raw.trim_end().len();
        let range = full.start + lead..full.end - trail;
        self.push(
            CandidateKind::JsxText,
            trimmed.to_string(),
            range,
            None,
            None,
        );
    }

    // ------------------------------------------------------------
    // Types
    // ------------------------------------------------------------

    fn visit_ts_type(&mut self, node: &TsType) {
        self.with_frame(Frame::TypeOnly, |this| node.visit_children_with(this));
    }

    fn visit_ts_type_ann(&mut self, node: &TsTypeAnn) {
        self.with_frame(Frame::TypeOnly, |this| node.visit_children_with(this));
    }

    fn visit_ts_interface_decl(&mut self, node: &TsInterfaceDecl) {
        self.with_frame(Frame::TypeOnly, |this| node.visit_children_with(this));
    }

    fn visit_ts_type_alias_decl(&mut self, node: &TsTypeAliasDecl) {
        self.with_frame(Frame::TypeOnly, |this| node.visit_children_with(this));
    }

    fn visit_ts_lit_type(&mut self, node: &TsLitType) {
        if let TsLit::Str(s) = &node.lit {
            self.string_literal(s, CandidateKind::TypeLiteral);
        }
    }

    // ------------------------------------------------------------
    // Scopes and declaration names
    // ------------------------------------------------------------

    fn visit_function(&mut self, node: &Function) {
        node.decorators.visit_with(self);
        node.type_params.visit_with(self);
        node.params.visit_with(self);
        if let Some(return_type) = &node.return_type {
            self.with_frame(Frame::ReturnType, |this| return_type.visit_with(this));
        }
        if let Some(body) = &node.body {
            self.with_frame(Frame::ValueScope, |this| body.visit_with(this));
        }
    }

    fn visit_arrow_expr(&mut self, node: &ArrowExpr) {
        node.type_params.visit_with(self);
        node.params.visit_with(self);
        if let Some(return_type) = &node.return_type {
            self.with_frame(Frame::ReturnType, |this| return_type.visit_with(this));
        }
        self.with_frame(Frame::ValueScope, |this| node.body.visit_with(this));
    }

    fn visit_class(&mut self, node: &Class) {
        self.with_frame(Frame::ValueScope, |this| node.visit_children_with(this));
    }

    fn visit_fn_decl(&mut self, node: &FnDecl) {
        self.with_name(Some(node.ident.sym.to_string()), |this| {
            node.visit_children_with(this)
        });
    }

    fn visit_class_decl(&mut self, node: &ClassDecl) {
        self.with_name(Some(node.ident.sym.to_string()), |this| {
            node.visit_children_with(this)
        });
    }

    fn visit_class_method(&mut self, node: &ClassMethod) {
        self.with_name(prop_name(&node.key), |this| node.visit_children_with(this));
    }

    fn visit_var_declarator(&mut self, node: &VarDeclarator) {
        let name = match &node.name {
            Pat::Ident(binding) => Some(binding.id.sym.to_string()),
            _ => None,
        };
        self.with_name(name, |this| node.visit_children_with(this));
    }
}

#[cfg(test)]
mod tests {
    use crate::core::collect::{CommentIndex, Suppressions};
    use crate::core::extract::visitor::*;
    use crate::core::parsers::parse_source;
    use crate::core::rules::RuleName;

    fn collect(code: &str, file: &str) -> Vec<Candidate> {
        let parsed = parse_source(code, file).unwrap();
        let lines = LineIndex::new(code);
        let comments = CommentIndex::from_swc(&parsed.comments, parsed.base(), code, &lines);
        let suppressions = Suppressions::collect(&comments, &lines);
        let rules = RuleSet::new(&["testID"], &["StyleSheet.create"]);
        let facts = FileFacts {
            comments: &comments,
            suppressions: &suppressions,
        };
        let mut collector = CandidateCollector::new(parsed.base(), code, &lines, &rules, facts);
        parsed.program.visit_with(&mut collector);
        collector.into_candidates()
    }

    fn kept(candidates: &[Candidate]) -> Vec<&str> {
        candidates
            .iter()
            .filter(|c| !c.is_excluded())
            .map(|c| c.text.as_str())
            .collect()
    }

    #[test]
    fn test_literal_range_covers_quotes() {
        let code = "const a = '确定';";
        let candidates = collect(code, "a.js");
        assert_eq!(candidates.len(), 1);
        assert_eq!(&code[candidates[0].range.clone()], "'确定'");
        assert_eq!(candidates[0].enclosing.as_deref(), Some("a"));
    }

    #[test]
    fn test_jsx_text_is_trimmed() {
        let code = "const v = <Text>\n   确定\n</Text>;";
        let candidates = collect(code, "a.jsx");
        assert_eq!(kept(&candidates), vec!["确定"]);
        assert_eq!(&code[candidates[0].range.clone()], "确定");
        assert_eq!(candidates[0].line, 2);
        assert!(candidates[0].needs_braces());
    }

    #[test]
    fn test_test_attribute_excluded_everywhere() {
        let code = r#"const v = <View testID="登录按钮" title="登录">{x}</View>;
const o = { testID: '提交', label: '提交' };
const w = <View testID={"前缀" + id} />;"#;
        let candidates = collect(code, "a.jsx");
        assert_eq!(kept(&candidates), vec!["登录", "提交"]);
        let excluded: Vec<_> = candidates
            .iter()
            .filter_map(|c| c.excluded_by)
            .collect();
        assert_eq!(excluded, vec![RuleName::TestAttribute; 3]);
    }

    #[test]
    fn test_type_positions_excluded() {
        let code = r#"type Mode = "确定" | "取消";
function f(a: "确定"): "取消" { return "确定"; }
interface P { label: "标签" }"#;
        let candidates = collect(code, "a.ts");
        assert_eq!(kept(&candidates), vec!["确定"]);
        assert!(
            candidates
                .iter()
                .filter(|c| c.is_excluded())
                .all(|c| c.excluded_by == Some(RuleName::TypeOnly))
        );
    }

    #[test]
    fn test_style_factory_excluded() {
        let code = "const s = StyleSheet.create({ a: { fontFamily: '宋体' } });\nconst b = '宋体';";
        let candidates = collect(code, "a.js");
        assert_eq!(kept(&candidates), vec!["宋体"]);
        assert_eq!(candidates[0].excluded_by, Some(RuleName::StyleFactory));
    }

    #[test]
    fn test_template_canonical_text() {
        let code = "const m = `你好，${name}！`;";
        let candidates = collect(code, "a.js");
        let tpl = &candidates[0];
        assert_eq!(tpl.text, "你好，{{Identifier1}}！");
        let parts = tpl.template.as_ref().unwrap();
        assert_eq!(parts.placeholders[0].name, "Identifier1");
        assert_eq!(&code[parts.placeholders[0].range.clone()], "name");
        assert_eq!(
            &code[parts.segments[0].range.clone().unwrap()],
            "你好，"
        );
    }

    #[test]
    fn test_template_line_policy() {
        let code = "const m = `\n  第一行\n`;\nconst n = `第二 ${a}`;";
        let candidates = collect(code, "a.js");
        assert_eq!(candidates[0].line, 2);
        assert_eq!(candidates[1].line, 4);

        // leading blanks, then text on the opening line: that line is reported
        let code = "const p = `   你好${a}\n  再见`;";
        let candidates = collect(code, "a.js");
        assert_eq!(candidates[0].text, "   你好{{Identifier1}}\n  再见");
        assert_eq!(candidates[0].line, 1);
    }

    #[test]
    fn test_tagged_template_is_not_a_candidate() {
        let code = "const q = gql`查询 ${'参数'}`;";
        let candidates = collect(code, "a.js");
        assert_eq!(kept(&candidates), vec!["参数"]);
    }

    #[test]
    fn test_property_keys_and_imports_are_not_candidates() {
        let code = "import x from '模块';\nconst o = { '键': 1 };";
        assert!(collect(code, "a.js").is_empty());
    }
}
