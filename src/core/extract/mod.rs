//! Extraction: source text in, translation records out.
//!
//! - `analysis`: per-file candidate analysis shared with the rewriter
//! - `candidate`: candidate and template part types
//! - `template`: template canonicalization and placeholder naming
//! - `visitor`: the AST pass that finds candidates and applies the rules

pub mod analysis;
pub mod candidate;
pub mod template;
pub mod visitor;

pub use analysis::SourceAnalysis;
pub use candidate::{Candidate, Placeholder, TemplateParts, TemplateSegment};
pub use visitor::CandidateCollector;

use crate::core::collect::{CommentIndex, Suppressions};
use crate::core::data::TranslationRecord;
use crate::core::data::source::LineIndex;
use crate::core::hash::HashScheme;
use crate::core::parsers::{ParseFailure, parse_source};
use crate::core::rules::RuleSet;
use crate::core::script::TargetScript;
use crate::utils::split_bom;

/// Longest neighbouring-line excerpt kept in a record's context.
const CONTEXT_LINE_CHARS: usize = 120;

/// Turns one file's source into translation records.
#[derive(Debug, Clone)]
pub struct Extractor {
    rules: RuleSet,
    script: TargetScript,
    scheme: HashScheme,
}

impl Extractor {
    pub fn new(rules: RuleSet, script: TargetScript, scheme: HashScheme) -> Self {
        Self {
            rules,
            script,
            scheme,
        }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn scheme(&self) -> &HashScheme {
        &self.scheme
    }

    /// Records for every included candidate carrying target-script text,
    /// in source order.
    ///
    /// A file opting out with `i18n-ignore-file` yields nothing and is not
    /// parsed. A file no grammar accepts yields a [`ParseFailure`]; callers
    /// skip it and keep going.
    pub fn extract(&self, file: &str, source: &str) -> Result<Vec<TranslationRecord>, ParseFailure> {
        let (_, source) = split_bom(source);
        if !self.script.matches(source) || file_opts_out(source) {
            return Ok(Vec::new());
        }
        let parsed = parse_source(source, file)?;
        let analysis = SourceAnalysis::analyze(&parsed, source, &self.rules);

        let records = analysis
            .included()
            .filter(|c| c.has_target_text(&self.script))
            .map(|c| TranslationRecord {
                key: self.scheme.key_for(&c.text),
                text: c.text.clone(),
                file: file.to_string(),
                line: c.line,
                content_hash: self.scheme.content_hash(&c.text, file),
                context: build_context(c.enclosing.as_deref(), source, &analysis.lines, c.line),
                per_locale: Default::default(),
            })
            .collect();
        Ok(records)
    }
}

/// Cheap pre-parse check for `i18n-ignore-file` in the leading comments.
fn file_opts_out(source: &str) -> bool {
    let lines = LineIndex::new(source);
    let comments = CommentIndex::scan(source, &lines);
    Suppressions::collect(&comments, &lines).file_ignored
}

/// Enclosing declaration name followed by the record's line and its
/// non-blank neighbours.
fn build_context(
    enclosing: Option<&str>,
    source: &str,
    lines: &LineIndex,
    line: usize,
) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(name) = enclosing {
        parts.push(format!("in {name}"));
    }
    for n in line.saturating_sub(1).max(1)..=line + 1 {
        let text = lines.line_text(source, n).trim();
        if !text.is_empty() {
            parts.push(text.chars().take(CONTEXT_LINE_CHARS).collect());
        }
    }
    (!parts.is_empty()).then(|| parts.join("\n"))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::core::extract::*;

    fn extractor() -> Extractor {
        Extractor::new(
            RuleSet::new(
                &["testID", "accessibilityLabel", "accessibilityHint", "nativeID"],
                &["StyleSheet.create"],
            ),
            TargetScript::cjk(),
            HashScheme::default(),
        )
    }

    fn texts(records: &[TranslationRecord]) -> Vec<&str> {
        records.iter().map(|r| r.text.as_str()).collect()
    }

    #[test]
    fn test_extract_is_deterministic() {
        let code = "const a = '确定';\nconst b = <Text>取消</Text>;";
        let first = extractor().extract("src/a.jsx", code).unwrap();
        let second = extractor().extract("src/a.jsx", code).unwrap();
        assert_eq!(first, second);
        assert_eq!(texts(&first), vec!["确定", "取消"]);
        assert_eq!(first[0].line, 1);
        assert_eq!(first[1].line, 2);
        assert_eq!(first[0].key, HashScheme::default().key_for("确定"));
    }

    #[test]
    fn test_test_attribute_value_not_extracted() {
        let code = r#"const v = <Button testID="登录按钮" title="登录" />;"#;
        let records = extractor().extract("src/Login.jsx", code).unwrap();
        assert_eq!(texts(&records), vec!["登录"]);
    }

    #[test]
    fn test_type_only_literal_excluded_but_value_kept() {
        let code = "type Mode = \"确定\";\nconst label = \"确定\";";
        let records = extractor().extract("src/mode.ts", code).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].line, 2);
    }

    #[test]
    fn test_template_with_interpolation() {
        let code = "const m = `你好，${name}！`;";
        let records = extractor().extract("src/a.js", code).unwrap();
        assert_eq!(texts(&records), vec!["你好，{{Identifier1}}！"]);
    }

    #[test]
    fn test_template_with_only_code_cjk_is_skipped() {
        let code = "const m = `${labels['确定']}: ok`;";
        let records = extractor().extract("src/a.js", code).unwrap();
        assert_eq!(texts(&records), vec!["确定"]);
    }

    #[test]
    fn test_non_target_text_is_ignored() {
        let code = "const a = 'hello';\nconst b = <Text>world</Text>;";
        assert!(extractor().extract("src/a.jsx", code).unwrap().is_empty());
    }

    #[test]
    fn test_file_directive() {
        let code = "/* i18n-ignore-file */\nconst a = '确定';";
        assert!(extractor().extract("src/a.js", code).unwrap().is_empty());
    }

    #[test]
    fn test_content_hash_and_context() {
        let code = "function Login() {\n  return <Text>登录</Text>;\n}";
        let records = extractor().extract("src/pages/Login.jsx", code).unwrap();
        let record = &records[0];
        assert_eq!(
            record.content_hash,
            HashScheme::default().content_hash("登录", "Login.jsx")
        );
        let context = record.context.as_deref().unwrap();
        assert!(context.starts_with("in Login\n"));
        assert!(context.contains("<Text>登录</Text>"));
    }

    #[test]
    fn test_parse_failure_is_reported() {
        let err = match extractor().extract("src/bad.js", "const = '确定' = ;") {
            Err(err) => err,
            Ok(_) => panic!("expected parse failure"),
        };
        assert_eq!(err.file, "src/bad.js");
    }
}
