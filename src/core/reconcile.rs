//! Reconciliation of a stored ledger against a fresh extraction.
//!
//! A fresh record found at an existing row's exact location matches it.
//! The rest are matched by content hash first, then by exact text. A hit
//! carries the existing key and translations forward with the fresh
//! location. Each existing row is claimed once; further occurrences of its
//! text are duplicates, which the ledger does not store. A miss is new.
//! Existing rows left unclaimed are reported missing and kept, so their
//! translations survive if the text returns.

use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;

use crate::core::data::{SourceLocation, TranslationRecord};

/// A matched record whose location changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Moved {
    pub record: TranslationRecord,
    pub previous: SourceLocation,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncResult {
    /// Matched at the same file and line.
    pub matched: Vec<TranslationRecord>,
    /// Matched at a different file or line.
    pub updated: Vec<Moved>,
    pub new_items: Vec<TranslationRecord>,
    /// Further occurrences of a text already matched or new elsewhere.
    pub duplicates: Vec<TranslationRecord>,
    /// Existing rows with no trace in the fresh extraction.
    pub missing: Vec<TranslationRecord>,
}

impl SyncResult {
    /// Live records in ledger order: matched, updated, then new.
    pub fn live_records(&self) -> impl Iterator<Item = &TranslationRecord> {
        self.matched
            .iter()
            .chain(self.updated.iter().map(|m| &m.record))
            .chain(self.new_items.iter())
    }

    pub fn is_unchanged(&self) -> bool {
        self.updated.is_empty() && self.new_items.is_empty() && self.missing.is_empty()
    }
}

/// Classify every fresh record against `existing`.
///
/// `existing` order decides which row wins when several share a hash or
/// text; `fresh` order does not matter.
pub fn reconcile(existing: &[TranslationRecord], fresh: &[TranslationRecord]) -> SyncResult {
    let mut by_location: HashMap<(&str, usize, &str), usize> = HashMap::new();
    let mut by_hash: HashMap<&str, usize> = HashMap::new();
    let mut by_text: HashMap<&str, usize> = HashMap::new();
    for (i, record) in existing.iter().enumerate() {
        by_location
            .entry((record.file.as_str(), record.line, record.text.as_str()))
            .or_insert(i);
        if !record.content_hash.is_empty() {
            by_hash.entry(record.content_hash.as_str()).or_insert(i);
        }
        by_text.entry(record.text.as_str()).or_insert(i);
    }

    let mut fresh: Vec<&TranslationRecord> = fresh.iter().collect();
    fresh.sort_by(|a, b| {
        (a.file.as_str(), a.line, a.text.as_str()).cmp(&(b.file.as_str(), b.line, b.text.as_str()))
    });

    let mut result = SyncResult::default();
    let mut claimed = vec![false; existing.len()];
    let mut pending = Vec::new();
    for current in fresh {
        let location = (current.file.as_str(), current.line, current.text.as_str());
        match by_location.get(&location) {
            Some(&i) if !claimed[i] => {
                claimed[i] = true;
                result.matched.push(carried(&existing[i], current));
            }
            _ => pending.push(current),
        }
    }

    let mut new_texts = HashSet::new();
    for current in pending {
        let hit = by_hash
            .get(current.content_hash.as_str())
            .or_else(|| by_text.get(current.text.as_str()))
            .copied();
        let Some(i) = hit else {
            if new_texts.insert(current.text.as_str()) {
                tracing::debug!(text = %current.text, file = %current.file, line = current.line, "new text");
                result.new_items.push(current.clone());
            } else {
                result.duplicates.push(current.clone());
            }
            continue;
        };

        let previous = &existing[i];
        let record = carried(previous, current);
        if claimed[i] {
            result.duplicates.push(record);
            continue;
        }
        claimed[i] = true;
        tracing::debug!(
            text = %current.text,
            from = %format!("{}:{}", previous.file, previous.line),
            to = %format!("{}:{}", current.file, current.line),
            "moved"
        );
        result.updated.push(Moved {
            record,
            previous: SourceLocation::new(&previous.file, previous.line),
        });
    }

    result.missing = existing
        .iter()
        .zip(&claimed)
        .filter(|(_, claimed)| !**claimed)
        .map(|(record, _)| record.clone())
        .collect();

    result
}

/// The existing row's key, text and translations at the fresh location.
fn carried(previous: &TranslationRecord, current: &TranslationRecord) -> TranslationRecord {
    TranslationRecord {
        key: previous.key.clone(),
        text: previous.text.clone(),
        file: current.file.clone(),
        line: current.line,
        content_hash: current.content_hash.clone(),
        context: current.context.clone(),
        per_locale: previous.per_locale.clone(),
    }
}

/// Markdown summary of one sheet's reconciliation.
pub fn render_report(sheets: &[(String, SyncResult)]) -> String {
    let mut out = String::from("# Translation sync report\n");
    for (name, result) in sheets {
        let _ = writeln!(out, "\n## {name}\n");
        let _ = writeln!(out, "- Matched: {}", result.matched.len());
        let _ = writeln!(out, "- Moved: {}", result.updated.len());
        let _ = writeln!(out, "- New: {}", result.new_items.len());
        if !result.duplicates.is_empty() {
            let _ = writeln!(out, "- Duplicates: {}", result.duplicates.len());
        }
        let _ = writeln!(out, "- Missing: {}", result.missing.len());

        if !result.updated.is_empty() {
            out.push_str("\n### Moved\n\n");
            for moved in &result.updated {
                let _ = writeln!(
                    out,
                    "- \"{}\" {}:{} -> {}:{}",
                    moved.record.text,
                    moved.previous.file_path,
                    moved.previous.line,
                    moved.record.file,
                    moved.record.line
                );
            }
        }
        if !result.new_items.is_empty() {
            out.push_str("\n### New\n\n");
            for record in &result.new_items {
                let _ = writeln!(out, "- \"{}\" at {}:{}", record.text, record.file, record.line);
            }
        }
        if !result.missing.is_empty() {
            out.push_str("\n### Missing\n\n");
            for record in &result.missing {
                let _ = writeln!(
                    out,
                    "- \"{}\" from {}:{} (translations kept)",
                    record.text, record.file, record.line
                );
            }
        }
    }
    out
}
