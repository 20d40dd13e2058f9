//! Ignore directive parsing.
//!
//! - `i18n-ignore-file`: skip the whole file (leading comment block only)
//! - `i18n-ignore`: skip the directive's line and the line after it
//! - `i18n-ignore-start` / `i18n-ignore-end`: skip every line in between

pub const IGNORE_FILE: &str = "i18n-ignore-file";
pub const IGNORE_START: &str = "i18n-ignore-start";
pub const IGNORE_END: &str = "i18n-ignore-end";
pub const IGNORE: &str = "i18n-ignore";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    IgnoreFile,
    IgnoreStart,
    IgnoreEnd,
    Ignore,
}

impl Directive {
    /// Parse a directive from a comment body (delimiters already stripped).
    ///
    /// JSDoc-style leading `*` are tolerated; anything after the directive
    /// name and a whitespace separator is a free-form note.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text
            .trim_start_matches(|c: char| c == '*' || c.is_whitespace())
            .trim_end();

        // Longer names first
        if strip_directive_prefix(text, IGNORE_FILE).is_some() {
            return Some(Self::IgnoreFile);
        }
        if strip_directive_prefix(text, IGNORE_START).is_some() {
            return Some(Self::IgnoreStart);
        }
        if strip_directive_prefix(text, IGNORE_END).is_some() {
            return Some(Self::IgnoreEnd);
        }
        if strip_directive_prefix(text, IGNORE).is_some() {
            return Some(Self::Ignore);
        }
        None
    }
}

/// Try to match directive prefix, requiring whitespace or end after it
fn strip_directive_prefix<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    text.strip_prefix(prefix)
        .filter(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
}
