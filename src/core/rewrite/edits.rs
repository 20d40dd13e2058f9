//! Span-based source edits.
//!
//! An edit replaces a byte range with a sequence of literal text and
//! references back into the original source. Edits may nest: an edit that
//! lies inside a referenced range is applied when that range is rendered,
//! which is how a string inside a template interpolation gets rewritten
//! along with the template around it.

use std::cmp::Reverse;
use std::ops::Range;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    Text(String),
    /// Original source for this range, with nested edits applied.
    Source(Range<usize>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub range: Range<usize>,
    pub parts: Vec<Part>,
}

impl Edit {
    pub fn replace(range: Range<usize>, text: impl Into<String>) -> Self {
        Self {
            range,
            parts: vec![Part::Text(text.into())],
        }
    }

    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self::replace(at..at, text)
    }
}

/// Apply all edits to `source`. Edits that straddle another edit's
/// boundary are dropped; edits fully inside a `Source` part are applied.
pub fn apply_edits(source: &str, mut edits: Vec<Edit>) -> String {
    // Inserts go before replacements starting at the same offset
    edits.sort_by_key(|e| (e.range.start, !e.range.is_empty(), Reverse(e.range.end)));
    render(source, 0..source.len(), &edits)
}

fn render(source: &str, range: Range<usize>, edits: &[Edit]) -> String {
    let mut out = String::with_capacity(range.len());
    let mut cursor = range.start;
    let mut i = 0;

    while i < edits.len() {
        let edit = &edits[i];
        if edit.range.start < cursor || edit.range.end > range.end {
            i += 1;
            continue;
        }
        if edit.range.start >= range.end && !edit.range.is_empty() {
            break;
        }

        // Edits inside this one sort directly after it
        let nested_end = edits[i + 1..]
            .iter()
            .position(|e| e.range.start >= edit.range.end)
            .map_or(edits.len(), |p| i + 1 + p);
        let nested = &edits[i + 1..nested_end];

        out.push_str(source.get(cursor..edit.range.start).unwrap_or_default());
        for part in &edit.parts {
            match part {
                Part::Text(text) => out.push_str(text),
                Part::Source(inner) => out.push_str(&render(source, inner.clone(), nested)),
            }
        }
        cursor = edit.range.end;
        i = if edit.range.is_empty() { i + 1 } else { nested_end };
    }

    out.push_str(source.get(cursor..range.end).unwrap_or_default());
    out
}
