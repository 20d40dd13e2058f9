//! Exclusion rules.
//!
//! Every string-like node found in a file is checked against an ordered
//! list of rules; the first rule that fires excludes the node from both
//! extraction and rewriting, so the two can never disagree. Rules see the
//! node's kind, its byte and line span, and the stack of syntactic frames
//! that enclose it, plus per-file facts (comment index and suppressions).

use std::collections::HashSet;

use enum_dispatch::enum_dispatch;

use crate::core::collect::{CommentIndex, Suppressions};

/// One enclosing syntactic construct, outermost first in a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Type annotation, alias, interface or other type position.
    TypeOnly,
    /// Declared return type of a function.
    ReturnType,
    /// Function or class body; type positions outside it stop counting.
    ValueScope,
    /// Call expression with its callee as a dotted path when static.
    Call { callee: Option<String> },
    /// JSX attribute or object property, by name.
    Attribute { name: String },
    Paren,
    /// `a + b` string concatenation.
    Concat,
    /// Conditional or logical expression selecting one of its operands.
    Choice,
    /// Interpolation inside a template literal.
    Template,
    /// Any other expression.
    Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CandidateKind {
    /// String literal in expression position.
    Literal,
    /// String literal used directly as a JSX attribute value.
    AttrLiteral,
    /// String literal type, e.g. `type A = "确定"`.
    TypeLiteral,
    JsxText,
    Template,
}

/// What a rule sees about one node.
#[derive(Debug, Clone, Copy)]
pub struct NodeContext<'a> {
    pub kind: CandidateKind,
    pub path: &'a [Frame],
    pub start: usize,
    pub end: usize,
    pub start_line: usize,
    pub end_line: usize,
}

/// What a rule sees about the file.
#[derive(Debug, Clone, Copy)]
pub struct FileFacts<'a> {
    pub comments: &'a CommentIndex,
    pub suppressions: &'a Suppressions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleName {
    CommentSpan,
    TypeOnly,
    StyleFactory,
    TestAttribute,
    LineDirective,
    FileDirective,
}

impl std::fmt::Display for RuleName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleName::CommentSpan => write!(f, "comment"),
            RuleName::TypeOnly => write!(f, "type-only"),
            RuleName::StyleFactory => write!(f, "style-factory"),
            RuleName::TestAttribute => write!(f, "test-attribute"),
            RuleName::LineDirective => write!(f, "line-directive"),
            RuleName::FileDirective => write!(f, "file-directive"),
        }
    }
}

#[enum_dispatch]
pub trait ExclusionRule {
    fn name(&self) -> RuleName;

    fn excludes(&self, node: &NodeContext<'_>, facts: &FileFacts<'_>) -> bool;
}

#[enum_dispatch(ExclusionRule)]
#[derive(Debug, Clone)]
pub enum Rule {
    CommentSpan(CommentSpanRule),
    TypeOnly(TypeOnlyRule),
    StyleFactory(StyleFactoryRule),
    TestAttribute(TestAttributeRule),
    LineDirective(LineDirectiveRule),
    FileDirective(FileDirectiveRule),
}

// ============================================================
// Rules
// ============================================================

/// Node lies inside a comment.
#[derive(Debug, Clone, Default)]
pub struct CommentSpanRule;

impl ExclusionRule for CommentSpanRule {
    fn name(&self) -> RuleName {
        RuleName::CommentSpan
    }

    fn excludes(&self, node: &NodeContext<'_>, facts: &FileFacts<'_>) -> bool {
        facts.comments.covers(node.start, node.end)
    }
}

/// Node sits in a type position or a function's declared return type.
#[derive(Debug, Clone, Default)]
pub struct TypeOnlyRule;

impl ExclusionRule for TypeOnlyRule {
    fn name(&self) -> RuleName {
        RuleName::TypeOnly
    }

    fn excludes(&self, node: &NodeContext<'_>, _facts: &FileFacts<'_>) -> bool {
        if node.kind == CandidateKind::TypeLiteral {
            return true;
        }
        for frame in node.path.iter().rev() {
            match frame {
                Frame::TypeOnly | Frame::ReturnType => return true,
                Frame::ValueScope => return false,
                _ => {}
            }
        }
        false
    }
}

/// Node is an argument, at any depth, of a style-factory call such as
/// `StyleSheet.create(...)`.
#[derive(Debug, Clone)]
pub struct StyleFactoryRule {
    pub factories: HashSet<String>,
}

impl ExclusionRule for StyleFactoryRule {
    fn name(&self) -> RuleName {
        RuleName::StyleFactory
    }

    fn excludes(&self, node: &NodeContext<'_>, _facts: &FileFacts<'_>) -> bool {
        node.path.iter().any(|frame| match frame {
            Frame::Call {
                callee: Some(callee),
            } => self.factories.contains(callee),
            _ => false,
        })
    }
}

/// Node is the value of a test-identifier attribute or property, directly
/// or through parentheses, concatenation, a conditional or a template.
#[derive(Debug, Clone)]
pub struct TestAttributeRule {
    pub attributes: HashSet<String>,
}

impl ExclusionRule for TestAttributeRule {
    fn name(&self) -> RuleName {
        RuleName::TestAttribute
    }

    fn excludes(&self, node: &NodeContext<'_>, _facts: &FileFacts<'_>) -> bool {
        for frame in node.path.iter().rev() {
            match frame {
                Frame::Paren | Frame::Concat | Frame::Choice | Frame::Template => continue,
                Frame::Attribute { name } => return self.attributes.contains(name),
                _ => return false,
            }
        }
        false
    }
}

/// Node's lines are covered by `i18n-ignore` or an ignore range.
#[derive(Debug, Clone, Default)]
pub struct LineDirectiveRule;

impl ExclusionRule for LineDirectiveRule {
    fn name(&self) -> RuleName {
        RuleName::LineDirective
    }

    fn excludes(&self, node: &NodeContext<'_>, facts: &FileFacts<'_>) -> bool {
        facts
            .suppressions
            .is_suppressed(node.start_line, node.end_line)
    }
}

/// File opts out with `i18n-ignore-file`.
#[derive(Debug, Clone, Default)]
pub struct FileDirectiveRule;

impl ExclusionRule for FileDirectiveRule {
    fn name(&self) -> RuleName {
        RuleName::FileDirective
    }

    fn excludes(&self, _node: &NodeContext<'_>, facts: &FileFacts<'_>) -> bool {
        facts.suppressions.file_ignored
    }
}

// ============================================================
// Rule set
// ============================================================

/// The full ordered rule list shared by extraction and rewriting.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new<S: AsRef<str>>(test_attributes: &[S], style_factories: &[S]) -> Self {
        Self {
            rules: vec![
                CommentSpanRule.into(),
                TypeOnlyRule.into(),
                StyleFactoryRule {
                    factories: style_factories.iter().map(|s| s.as_ref().to_string()).collect(),
                }
                .into(),
                TestAttributeRule {
                    attributes: test_attributes.iter().map(|s| s.as_ref().to_string()).collect(),
                }
                .into(),
                LineDirectiveRule.into(),
                FileDirectiveRule.into(),
            ],
        }
    }

    /// First rule that excludes the node, if any.
    pub fn first_match(&self, node: &NodeContext<'_>, facts: &FileFacts<'_>) -> Option<RuleName> {
        self.rules
            .iter()
            .find(|rule| rule.excludes(node, facts))
            .map(|rule| rule.name())
    }
}
