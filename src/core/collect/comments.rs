//! Comment range index.
//!
//! Comments are indexed by byte range once per file. The syntax path builds
//! the index from the comments swc collected while parsing; the regex
//! fallback builds it with a small lexical scan because there is no tree to
//! lean on. Both feed the same suppression and comment-span checks.

use swc_common::BytePos;

use crate::core::data::source::LineIndex;
use crate::core::parsers::source::ExtractedComments;

/// One comment, with its body (delimiters stripped) and line span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceComment {
    pub start: usize,
    pub end: usize,
    pub text: String,
    pub line: usize,
    pub end_line: usize,
    /// Nothing but whitespace (or JSX expression braces) shares its lines.
    pub standalone: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentIndex {
    comments: Vec<SourceComment>,
    /// Offset of the first byte that is neither whitespace, shebang nor comment.
    first_code_offset: usize,
}

impl CommentIndex {
    /// Build from comments collected by the parser. `base` is the start
    /// position of the parsed source file.
    pub fn from_swc(
        extracted: &ExtractedComments,
        base: BytePos,
        source: &str,
        lines: &LineIndex,
    ) -> Self {
        let (leading, trailing) = extracted.borrow_all();
        let mut ranges: Vec<(usize, usize, String)> = leading
            .values()
            .chain(trailing.values())
            .flatten()
            .map(|c| {
                (
                    (c.span.lo.0 - base.0) as usize,
                    (c.span.hi.0 - base.0) as usize,
                    c.text.to_string(),
                )
            })
            .collect();
        ranges.sort_by_key(|(start, end, _)| (*start, *end));
        ranges.dedup_by_key(|(start, _, _)| *start);
        Self::build(ranges, source, lines)
    }

    /// Lexical scan that skips string and template literals. Regex literals
    /// and JSX text are not understood, so results are approximate.
    pub fn scan(source: &str, lines: &LineIndex) -> Self {
        let bytes = source.as_bytes();
        let len = bytes.len();
        let mut ranges = Vec::new();
        let mut i = if source.starts_with("#!") {
            source.find('\n').unwrap_or(len)
        } else {
            0
        };

        while i < len {
            match bytes[i] {
                b'/' if bytes.get(i + 1) == Some(&b'/') => {
                    let end = source[i..].find('\n').map_or(len, |p| i + p);
                    let end = if bytes.get(end - 1) == Some(&b'\r') { end - 1 } else { end };
                    ranges.push((i, end, source[i + 2..end].to_string()));
                    i = end;
                }
                b'/' if bytes.get(i + 1) == Some(&b'*') => {
                    let (body_end, end) = match source[i + 2..].find("*/") {
                        Some(p) => (i + 2 + p, i + 4 + p),
                        None => (len, len),
                    };
                    ranges.push((i, end, source[i + 2..body_end].to_string()));
                    i = end;
                }
                quote @ (b'\'' | b'"' | b'`') => {
                    i += 1;
                    while i < len && bytes[i] != quote {
                        if bytes[i] == b'\\' {
                            i += 1;
                        } else if bytes[i] == b'\n' && quote != b'`' {
                            break;
                        }
                        i += 1;
                    }
                    i += 1;
                }
                _ => i += 1,
            }
        }

        Self::build(ranges, source, lines)
    }

    fn build(ranges: Vec<(usize, usize, String)>, source: &str, lines: &LineIndex) -> Self {
        let comments: Vec<SourceComment> = ranges
            .into_iter()
            .map(|(start, end, text)| {
                let line = lines.line_of(start);
                let end_line = lines.line_of(end.saturating_sub(1).max(start));
                let standalone = is_standalone(source, lines, start, end, line, end_line);
                SourceComment {
                    start,
                    end,
                    text,
                    line,
                    end_line,
                    standalone,
                }
            })
            .collect();
        let first_code_offset = first_code_offset(source, &comments);
        Self {
            comments,
            first_code_offset,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &SourceComment> {
        self.comments.iter()
    }

    pub fn len(&self) -> usize {
        self.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    /// Whether `[start, end)` lies entirely inside one comment.
    pub fn covers(&self, start: usize, end: usize) -> bool {
        let idx = self.comments.partition_point(|c| c.start <= start);
        idx > 0 && self.comments[idx - 1].end >= end
    }

    /// Comments that sit before any code, i.e. the file's leading block.
    pub fn leading(&self) -> impl Iterator<Item = &SourceComment> {
        self.comments
            .iter()
            .take_while(move |c| c.start < self.first_code_offset)
    }
}

fn is_standalone(
    source: &str,
    lines: &LineIndex,
    start: usize,
    end: usize,
    line: usize,
    end_line: usize,
) -> bool {
    let line_start = lines.line_start(line).unwrap_or(0);
    let before = source.get(line_start..start).unwrap_or_default().trim();
    let after_end = lines
        .line_start(end_line + 1)
        .map_or(source.len(), |next| next.saturating_sub(1))
        .max(end);
    let after = source.get(end..after_end).unwrap_or_default().trim();
    matches!(before, "" | "{") && matches!(after, "" | "}")
}

fn first_code_offset(source: &str, comments: &[SourceComment]) -> usize {
    let mut offset = if source.starts_with("#!") {
        source.find('\n').unwrap_or(source.len())
    } else {
        0
    };
    let mut remaining = comments.iter().peekable();
    loop {
        let rest = source.get(offset..).unwrap_or_default();
        let trimmed = rest.trim_start();
        offset += rest.len() - trimmed.len();
        while remaining.next_if(|c| c.start < offset).is_some() {}
        match remaining.peek() {
            Some(c) if c.start == offset => {
                offset = c.end;
                remaining.next();
            }
            _ => return offset,
        }
    }
}
