use std::collections::BTreeMap;

/// One extracted occurrence of translatable text.
///
/// `text` is the canonical text: literals verbatim, JSX text trimmed, and
/// templates with `{{Kind<n>}}` placeholders in place of interpolations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRecord {
    pub key: String,
    pub text: String,
    /// Project-relative path, forward slashes.
    pub file: String,
    /// 1-based line.
    pub line: usize,
    pub content_hash: String,
    /// Enclosing declaration and neighbouring lines, for translators.
    pub context: Option<String>,
    /// Locale code to translated text.
    pub per_locale: BTreeMap<String, String>,
}

impl TranslationRecord {
    /// Whether the text carries template placeholders.
    pub fn has_placeholders(&self) -> bool {
        has_placeholders(&self.text)
    }
}

pub fn has_placeholders(text: &str) -> bool {
    text.contains("{{") && text.contains("}}")
}
