//! Template literal canonicalization.
//!
//! `` `你好，${user.name}！` `` becomes `你好，{{MemberExpression1}}！`: every
//! interpolation is replaced by `{{<Kind><n>}}`, where `Kind` names the
//! expression's syntactic category and `n` counts occurrences of that kind
//! within the template, starting at 1. Literal segments keep their raw text.

use std::collections::HashMap;

use swc_ecma_ast::{BinaryOp, Expr, Lit, OptChainBase};

/// Category name for an interpolated expression. Parentheses are looked
/// through.
pub fn expr_kind_name(expr: &Expr) -> &'static str {
    match expr {
        Expr::Paren(paren) => expr_kind_name(&paren.expr),
        Expr::Ident(_) => "Identifier",
        Expr::Member(_) | Expr::SuperProp(_) => "MemberExpression",
        Expr::OptChain(chain) => match &*chain.base {
            OptChainBase::Member(_) => "OptionalMemberExpression",
            OptChainBase::Call(_) => "OptionalCallExpression",
            #[allow(unreachable_patterns)]
            _ => "Expression",
        },
        Expr::Call(_) => "CallExpression",
        Expr::New(_) => "NewExpression",
        Expr::Bin(bin) => match bin.op {
            BinaryOp::LogicalAnd | BinaryOp::LogicalOr | BinaryOp::NullishCoalescing => {
                "LogicalExpression"
            }
            _ => "BinaryExpression",
        },
        Expr::Cond(_) => "ConditionalExpression",
        Expr::Unary(_) => "UnaryExpression",
        Expr::Update(_) => "UpdateExpression",
        Expr::Assign(_) => "AssignmentExpression",
        Expr::Seq(_) => "SequenceExpression",
        Expr::Lit(lit) => match lit {
            Lit::Str(_) => "StringLiteral",
            Lit::Num(_) => "NumericLiteral",
            Lit::Bool(_) => "BooleanLiteral",
            Lit::Null(_) => "NullLiteral",
            Lit::BigInt(_) => "BigIntLiteral",
            Lit::Regex(_) => "RegExpLiteral",
            Lit::JSXText(_) => "JSXText",
            #[allow(unreachable_patterns)]
            _ => "Literal",
        },
        Expr::Tpl(_) => "TemplateLiteral",
        Expr::TaggedTpl(_) => "TaggedTemplateExpression",
        Expr::Arrow(_) => "ArrowFunctionExpression",
        Expr::Fn(_) => "FunctionExpression",
        Expr::Class(_) => "ClassExpression",
        Expr::Array(_) => "ArrayExpression",
        Expr::Object(_) => "ObjectExpression",
        Expr::This(_) => "ThisExpression",
        Expr::Await(_) => "AwaitExpression",
        Expr::Yield(_) => "YieldExpression",
        Expr::MetaProp(_) => "MetaProperty",
        Expr::JSXElement(_) => "JSXElement",
        Expr::JSXFragment(_) => "JSXFragment",
        Expr::TsAs(_) | Expr::TsConstAssertion(_) => "TSAsExpression",
        Expr::TsSatisfies(_) => "TSSatisfiesExpression",
        Expr::TsNonNull(_) => "TSNonNullExpression",
        Expr::TsTypeAssertion(_) => "TSTypeAssertion",
        _ => "Expression",
    }
}

/// Hands out `Kind<n>` placeholder names in order of appearance.
#[derive(Debug, Default)]
pub struct PlaceholderNamer {
    counts: HashMap<&'static str, usize>,
}

impl PlaceholderNamer {
    pub fn next_name(&mut self, expr: &Expr) -> String {
        let kind = expr_kind_name(expr);
        let count = self.counts.entry(kind).or_insert(0);
        *count += 1;
        format!("{kind}{count}")
    }
}

/// Join raw segments and placeholder names into the canonical text.
pub fn canonical_text<S: AsRef<str>>(segments: &[S], names: &[String]) -> String {
    let mut text = String::new();
    for (i, segment) in segments.iter().enumerate() {
        text.push_str(segment.as_ref());
        if let Some(name) = names.get(i) {
            text.push_str("{{");
            text.push_str(name);
            text.push_str("}}");
        }
    }
    text
}
