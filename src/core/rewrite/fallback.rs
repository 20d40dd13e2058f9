//! Textual rewriting for files no grammar accepts.
//!
//! Each known text is searched as a quoted literal (or bare JSX text)
//! and replaced by a lookup call. Exclusions are approximated: matches
//! inside comments, on suppressed lines, in ignored files, and directly
//! after a test-identifier attribute are left alone. Type positions and
//! style-factory arguments are not recognized here. Texts with template
//! placeholders cannot be matched textually and are skipped.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::core::collect::{CommentIndex, Suppressions};
use crate::core::data::has_placeholders;
use crate::core::data::source::LineIndex;

static USE_DIRECTIVE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^\s*['"]use [\w -]+['"];?\s*$"#).unwrap());

static ATTRIBUTE_TAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([A-Za-z_$][\w$-]*)['"]?\s*[:=]\s*\{?\s*$"#).unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackOutcome {
    pub content: String,
    pub replacements: usize,
}

/// Rewrite `source` for each `(text, call)` pair, where `call` is the
/// rendered lookup expression such as `t('i18n_…')`.
pub fn fallback_rewrite(
    source: &str,
    pairs: &[(&str, String)],
    test_attributes: &[String],
) -> FallbackOutcome {
    let mut content = source.to_string();
    let mut replacements = 0;

    for (text, call) in pairs {
        if text.is_empty() || has_placeholders(text) || !content.contains(*text) {
            continue;
        }
        let escaped = regex::escape(text);
        let quoted = format!(r#""{escaped}"|'{escaped}'|`{escaped}`"#);
        let passes = [
            // {"text"} in JSX children or attribute expressions
            (format!(r"\{{\s*(?:{quoted})\s*\}}"), format!("{{{call}}}"), None),
            // name="text" JSX attribute; no spaces around `=`, unlike assignments
            (
                format!(r#"(\s[A-Za-z_][\w:-]*=)(?:"{escaped}"|'{escaped}')"#),
                format!("{{{call}}}"),
                Some(1),
            ),
            // >text< JSX text
            (format!(r">(\s*){escaped}(\s*)<"), call.clone(), Some(0)),
            // any other quoted literal
            (quoted.clone(), call.clone(), None),
        ];

        for (pattern, replacement, keep_group) in passes {
            let Ok(regex) = Regex::new(&pattern) else {
                continue;
            };
            let (next, count) = replace_pass(&content, &regex, &replacement, keep_group, test_attributes);
            content = next;
            replacements += count;
        }
    }

    FallbackOutcome {
        content,
        replacements,
    }
}

fn replace_pass(
    content: &str,
    regex: &Regex,
    replacement: &str,
    keep_group: Option<usize>,
    test_attributes: &[String],
) -> (String, usize) {
    let lines = LineIndex::new(content);
    let comments = CommentIndex::scan(content, &lines);
    let suppressions = Suppressions::collect(&comments, &lines);
    if suppressions.file_ignored {
        return (content.to_string(), 0);
    }

    let mut count = 0;
    let replaced = regex.replace_all(content, |caps: &Captures<'_>| {
        let Some(whole) = caps.get(0) else {
            return String::new();
        };
        let start_line = lines.line_of(whole.start());
        let end_line = lines.line_of(whole.end().saturating_sub(1).max(whole.start()));
        let excluded = comments.covers(whole.start(), whole.end())
            || suppressions.is_suppressed(start_line, end_line)
            || follows_test_attribute(content, &lines, whole.start(), attr_name(caps, keep_group), test_attributes);
        if excluded {
            return caps[0].to_string();
        }
        count += 1;
        match keep_group {
            // JSX text: keep the surrounding whitespace and angle brackets
            Some(0) => format!(
                ">{}{{{}}}{}<",
                caps.get(1).map_or("", |m| m.as_str()),
                replacement,
                caps.get(2).map_or("", |m| m.as_str())
            ),
            Some(group) => format!(
                "{}{}",
                caps.get(group).map_or("", |m| m.as_str()),
                replacement
            ),
            None => replacement.to_string(),
        }
    });
    (replaced.into_owned(), count)
}

/// Attribute name captured by the `name="text"` pass.
fn attr_name<'c>(caps: &'c Captures<'_>, keep_group: Option<usize>) -> Option<&'c str> {
    match keep_group {
        Some(group) if group > 0 => caps
            .get(group)
            .map(|m| m.as_str().trim().trim_end_matches('=')),
        _ => None,
    }
}

/// Whether the match is the value of a test-identifier attribute or
/// property, judged from the captured name or the text before it on the
/// same line.
fn follows_test_attribute(
    content: &str,
    lines: &LineIndex,
    start: usize,
    captured_name: Option<&str>,
    test_attributes: &[String],
) -> bool {
    if let Some(name) = captured_name {
        return test_attributes.iter().any(|a| a == name);
    }
    let line_start = lines.line_start(lines.line_of(start)).unwrap_or(0);
    let before = content.get(line_start..start).unwrap_or_default();
    ATTRIBUTE_TAIL_REGEX
        .captures(before)
        .and_then(|caps| caps.get(1))
        .is_some_and(|name| test_attributes.iter().any(|a| a == name.as_str()))
}

/// `text` as it appears between the quotes of a literal that spells its
/// control characters and backslashes with escapes.
pub fn escape_literal_body(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out
}

/// Textual check for an existing import binding `lookup_fn`.
pub fn has_lookup_import(source: &str, lookup_fn: &str) -> bool {
    let name = regex::escape(lookup_fn);
    let pattern = format!(
        r"import\s+(?:\{{[^}}]*\b{name}\b[^}}]*\}}|{name}\s*(?:,|from\b))"
    );
    Regex::new(&pattern).is_ok_and(|re| re.is_match(source))
}

/// Offset after a shebang and any `'use …'` directive lines.
pub fn textual_insertion_offset(source: &str) -> usize {
    let mut offset = 0;
    for (i, line) in source.split_inclusive('\n').enumerate() {
        let is_prologue = (i == 0 && line.starts_with("#!")) || USE_DIRECTIVE_REGEX.is_match(line);
        if !is_prologue {
            break;
        }
        offset += line.len();
    }
    offset
}
