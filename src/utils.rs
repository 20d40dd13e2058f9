//! Common utility functions shared across the codebase.

use std::path::{Component, Path};

/// Collapses every run of whitespace into a single space and trims both ends.
///
/// # Examples
///
/// ```
/// use hanzi_i18n::utils::normalize_whitespace;
///
/// assert_eq!(normalize_whitespace("  你好\n\t世界 "), "你好 世界");
/// assert_eq!(normalize_whitespace(""), "");
/// ```
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Final path component of a slash- or backslash-separated path.
pub fn basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Renders a path with forward slashes, dropping any leading `./`.
pub fn display_path(path: &Path) -> String {
    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::RootDir => parts.push(String::new()),
            other => parts.push(other.as_os_str().to_string_lossy().into_owned()),
        }
    }
    if parts.len() == 1 && parts[0].is_empty() {
        return "/".to_string();
    }
    parts.join("/")
}

/// Path of `path` relative to `base`, falling back to the path itself.
pub fn relative_to(path: &Path, base: &Path) -> String {
    match path.strip_prefix(base) {
        Ok(rel) => display_path(rel),
        Err(_) => display_path(path),
    }
}

/// Splits a leading UTF-8 byte order mark off `source`.
///
/// swc drops the mark when it loads a file, so spans index the text after
/// it; callers slicing by span must slice the remainder.
pub fn split_bom(source: &str) -> (&str, &str) {
    match source.strip_prefix('\u{feff}') {
        Some(rest) => (&source[..source.len() - rest.len()], rest),
        None => ("", source),
    }
}

/// Escapes a value for a single-quoted JavaScript string literal.
pub fn quote_single(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out.push('\'');
    out
}
