//! Locale pack generation with conflict blocking.
//!
//! Incoming values from the ledger are merged into the packs already on
//! disk. A key present in both with different values is a conflict; while
//! any conflict lacks an explicit selection, no pack is written and a
//! conflict report is produced instead. A resolved report handed back on a
//! later run supplies the selections.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::ledger::Ledger;

/// Flat key to text map for one locale.
pub type LocalePack = BTreeMap<String, String>;

/// How a conflict was settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Selection {
    Existing,
    Incoming,
    /// Literal replacement text.
    Override(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictEntry {
    pub existing_value: String,
    pub incoming_value: String,
    /// `null` until someone decides.
    #[serde(default)]
    pub selected: Option<Selection>,
}

impl ConflictEntry {
    fn resolved_value(&self) -> Option<&str> {
        match self.selected.as_ref()? {
            Selection::Existing => Some(&self.existing_value),
            Selection::Incoming => Some(&self.incoming_value),
            Selection::Override(text) => Some(text),
        }
    }
}

/// Locale, then key, to conflict.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConflictReport {
    pub locales: BTreeMap<String, BTreeMap<String, ConflictEntry>>,
}

impl ConflictReport {
    pub fn len(&self) -> usize {
        self.locales.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn unresolved(&self) -> usize {
        self.entries().filter(|(_, _, e)| e.selected.is_none()).count()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str, &ConflictEntry)> {
        self.locales.iter().flat_map(|(locale, entries)| {
            entries
                .iter()
                .map(move |(key, entry)| (locale.as_str(), key.as_str(), entry))
        })
    }

    /// Selection recorded for exactly this pair of values. A selection made
    /// for values that have since changed does not count.
    fn selection_for(&self, locale: &str, key: &str, existing: &str, incoming: &str) -> Option<&Selection> {
        let entry = self.locales.get(locale)?.get(key)?;
        if entry.existing_value == existing && entry.incoming_value == incoming {
            entry.selected.as_ref()
        } else {
            None
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// Carries every conflict of the run, with still-valid selections kept.
    #[error("{} of {} conflicting key(s) unresolved", .0.unresolved(), .0.len())]
    Conflicts(ConflictReport),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergedPacks {
    pub packs: BTreeMap<String, LocalePack>,
    /// Conflicts settled by a selection.
    pub resolved: usize,
}

/// Merge `incoming` into `existing` per locale.
///
/// Empty incoming values never replace anything. Fails with every
/// conflict when at least one has no valid selection in `resolutions`.
pub fn merge_packs(
    incoming: &BTreeMap<String, LocalePack>,
    existing: &BTreeMap<String, LocalePack>,
    resolutions: Option<&ConflictReport>,
) -> Result<MergedPacks, MergeError> {
    let empty = LocalePack::new();
    let mut report = ConflictReport::default();
    let mut merged = MergedPacks::default();

    for (locale, values) in incoming {
        let current = existing.get(locale).unwrap_or(&empty);
        let mut pack = current.clone();
        for (key, value) in values {
            if value.is_empty() {
                continue;
            }
            match current.get(key) {
                Some(old) if old != value => {
                    let entry = ConflictEntry {
                        existing_value: old.clone(),
                        incoming_value: value.clone(),
                        selected: resolutions
                            .and_then(|r| r.selection_for(locale, key, old, value))
                            .cloned(),
                    };
                    if let Some(resolved) = entry.resolved_value() {
                        pack.insert(key.clone(), resolved.to_string());
                    }
                    report
                        .locales
                        .entry(locale.clone())
                        .or_default()
                        .insert(key.clone(), entry);
                }
                _ => {
                    pack.insert(key.clone(), value.clone());
                }
            }
        }
        merged.packs.insert(locale.clone(), pack);
    }

    if report.unresolved() > 0 {
        return Err(MergeError::Conflicts(report));
    }
    merged.resolved = report.len();
    Ok(merged)
}

/// Incoming packs from the ledger's active rows: the `text` column as the
/// source locale, plus every non-empty locale column. The first row wins
/// for a key.
pub fn incoming_packs(ledger: &Ledger, source_locale: &str) -> BTreeMap<String, LocalePack> {
    let mut packs: BTreeMap<String, LocalePack> = BTreeMap::new();
    for row in ledger.active_rows() {
        packs
            .entry(source_locale.to_string())
            .or_default()
            .entry(row.key.clone())
            .or_insert_with(|| row.text.clone());
        for (locale, value) in &row.locales {
            if value.is_empty() || locale == source_locale {
                continue;
            }
            packs
                .entry(locale.clone())
                .or_default()
                .entry(row.key.clone())
                .or_insert_with(|| value.clone());
        }
    }
    packs
}

pub fn pack_path(out_dir: &Path, locale: &str) -> PathBuf {
    out_dir.join(format!("{locale}.json"))
}

/// Reads the existing pack for each locale. A missing pack is empty; an
/// unreadable one is an error, so nothing is overwritten by accident.
pub fn read_packs<'a>(
    out_dir: &Path,
    locales: impl IntoIterator<Item = &'a String>,
) -> Result<BTreeMap<String, LocalePack>> {
    let mut packs = BTreeMap::new();
    for locale in locales {
        let path = pack_path(out_dir, locale);
        if !path.exists() {
            continue;
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read locale pack {}", path.display()))?;
        let pack: LocalePack = serde_json::from_str(&content)
            .with_context(|| format!("locale pack {} is not a flat string map", path.display()))?;
        packs.insert(locale.clone(), pack);
    }
    Ok(packs)
}

pub fn read_conflict_report(path: &Path) -> Result<Option<ConflictReport>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read conflict report {}", path.display()))?;
    let report = serde_json::from_str(&content)
        .with_context(|| format!("conflict report {} is not valid", path.display()))?;
    Ok(Some(report))
}

pub fn write_conflict_report(path: &Path, report: &ConflictReport) -> Result<()> {
    write_json_atomic(path, report)
        .with_context(|| format!("failed to write conflict report {}", path.display()))
}

/// Writes every pack in two phases: all temporary files first, then the
/// renames. A failure while staging removes the temporary files and leaves
/// every existing pack untouched.
pub fn write_packs(out_dir: &Path, packs: &BTreeMap<String, LocalePack>) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    let mut staged: Vec<(PathBuf, PathBuf)> = Vec::new();
    for (locale, pack) in packs {
        let path = pack_path(out_dir, locale);
        let tmp = tmp_path(&path);
        if let Err(e) = write_json(&tmp, pack) {
            let _ = fs::remove_file(&tmp);
            discard(&staged);
            return Err(e).with_context(|| format!("failed to write locale pack {}", path.display()));
        }
        staged.push((tmp, path));
    }

    let mut written = Vec::new();
    for (i, (tmp, path)) in staged.iter().enumerate() {
        if let Err(e) = fs::rename(tmp, path) {
            discard(&staged[i..]);
            return Err(e).with_context(|| format!("failed to replace locale pack {}", path.display()));
        }
        written.push(path.clone());
    }
    Ok(written)
}

fn discard(staged: &[(PathBuf, PathBuf)]) {
    for (tmp, _) in staged {
        if let Err(e) = fs::remove_file(tmp) {
            tracing::warn!(path = %tmp.display(), "failed to remove temporary file: {e}");
        }
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut content = serde_json::to_string_pretty(value)?;
    content.push('\n');
    fs::write(path, content)?;
    Ok(())
}

fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let tmp = tmp_path(path);
    write_json(&tmp, value)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerateOutcome {
    Written { files: Vec<PathBuf>, resolved: usize },
    /// Nothing was written; the report lists what needs a decision.
    Blocked { report: PathBuf, unresolved: usize, total: usize },
}

/// Full generation run: read packs and any earlier report, merge, then
/// either write every pack and drop the report, or write only the report.
pub fn generate(
    incoming: &BTreeMap<String, LocalePack>,
    out_dir: &Path,
    report_path: &Path,
) -> Result<GenerateOutcome> {
    let existing = read_packs(out_dir, incoming.keys())?;
    let resolutions = read_conflict_report(report_path)?;

    match merge_packs(incoming, &existing, resolutions.as_ref()) {
        Ok(merged) => {
            let files = write_packs(out_dir, &merged.packs)?;
            if report_path.exists() {
                fs::remove_file(report_path)
                    .with_context(|| format!("failed to remove {}", report_path.display()))?;
            }
            Ok(GenerateOutcome::Written {
                files,
                resolved: merged.resolved,
            })
        }
        Err(MergeError::Conflicts(report)) => {
            tracing::warn!(
                unresolved = report.unresolved(),
                total = report.len(),
                "locale packs left untouched"
            );
            write_conflict_report(report_path, &report)?;
            Ok(GenerateOutcome::Blocked {
                report: report_path.to_path_buf(),
                unresolved: report.unresolved(),
                total: report.len(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use crate::core::merge::*;

    fn pack(pairs: &[(&str, &str)]) -> LocalePack {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn packs(locale: &str, pairs: &[(&str, &str)]) -> BTreeMap<String, LocalePack> {
        BTreeMap::from([(locale.to_string(), pack(pairs))])
    }

    #[test]
    fn test_merge_without_conflict() {
        let merged = merge_packs(&packs("en", &[("b", "Y")]), &packs("en", &[("a", "X")]), None).unwrap();
        assert_eq!(merged.packs["en"], pack(&[("a", "X"), ("b", "Y")]));
        assert_eq!(merged.resolved, 0);
    }

    #[test]
    fn test_conflict_blocks_merge() {
        let err = merge_packs(&packs("en", &[("greet", "Hello")]), &packs("en", &[("greet", "Hi")]), None)
            .unwrap_err();
        let MergeError::Conflicts(report) = err;
        let entry = &report.locales["en"]["greet"];
        assert_eq!(entry.existing_value, "Hi");
        assert_eq!(entry.incoming_value, "Hello");
        assert_eq!(entry.selected, None);
    }

    #[test]
    fn test_selections_apply() {
        let incoming = BTreeMap::from([
            ("en".to_string(), pack(&[("a", "A2"), ("b", "B2"), ("c", "C2")])),
        ]);
        let existing = packs("en", &[("a", "A1"), ("b", "B1"), ("c", "C1")]);
        let MergeError::Conflicts(mut report) = merge_packs(&incoming, &existing, None).unwrap_err();
        let entries = report.locales.get_mut("en").unwrap();
        entries.get_mut("a").unwrap().selected = Some(Selection::Existing);
        entries.get_mut("b").unwrap().selected = Some(Selection::Incoming);
        entries.get_mut("c").unwrap().selected = Some(Selection::Override("C3".to_string()));

        let merged = merge_packs(&incoming, &existing, Some(&report)).unwrap();
        assert_eq!(merged.packs["en"], pack(&[("a", "A1"), ("b", "B2"), ("c", "C3")]));
        assert_eq!(merged.resolved, 3);
    }

    #[test]
    fn test_partial_or_stale_resolution_still_blocks() {
        let incoming = packs("en", &[("a", "A2"), ("b", "B2")]);
        let existing = packs("en", &[("a", "A1"), ("b", "B1")]);
        let MergeError::Conflicts(mut report) = merge_packs(&incoming, &existing, None).unwrap_err();
        report.locales.get_mut("en").unwrap().get_mut("a").unwrap().selected = Some(Selection::Incoming);
        let MergeError::Conflicts(again) = merge_packs(&incoming, &existing, Some(&report)).unwrap_err();
        assert_eq!(again.unresolved(), 1);
        assert_eq!(again.locales["en"]["a"].selected, Some(Selection::Incoming));

        // incoming changed since the selection was made
        let changed = packs("en", &[("a", "A9"), ("b", "B1")]);
        let MergeError::Conflicts(stale) = merge_packs(&changed, &existing, Some(&report)).unwrap_err();
        assert_eq!(stale.locales["en"]["a"].selected, None);
    }

    #[test]
    fn test_empty_incoming_value_is_skipped() {
        let merged = merge_packs(&packs("en", &[("a", "")]), &packs("en", &[("a", "X")]), None).unwrap();
        assert_eq!(merged.packs["en"], pack(&[("a", "X")]));
    }

    #[test]
    fn test_report_json_shape() {
        let mut report = ConflictReport::default();
        report.locales.entry("en".to_string()).or_default().insert(
            "greet".to_string(),
            ConflictEntry {
                existing_value: "Hi".to_string(),
                incoming_value: "Hello".to_string(),
                selected: Some(Selection::Override("Hey".to_string())),
            },
        );
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"en": {"greet": {"existingValue": "Hi", "incomingValue": "Hello", "selected": {"override": "Hey"}}}})
        );
        let parsed: ConflictReport = serde_json::from_str(
            r#"{"en": {"greet": {"existingValue": "Hi", "incomingValue": "Hello", "selected": "existing"}}}"#,
        )
        .unwrap();
        assert_eq!(parsed.locales["en"]["greet"].selected, Some(Selection::Existing));
    }

    #[test]
    fn test_generate_blocks_then_writes() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("locales");
        let report_path = dir.path().join("conflicts.json");
        fs::create_dir_all(&out).unwrap();
        let original = "{\n  \"greet\": \"Hi\"\n}";
        fs::write(out.join("en.json"), original).unwrap();

        let incoming = packs("en", &[("greet", "Hello")]);
        let outcome = generate(&incoming, &out, &report_path).unwrap();
        assert!(matches!(outcome, GenerateOutcome::Blocked { unresolved: 1, .. }));
        assert_eq!(fs::read_to_string(out.join("en.json")).unwrap(), original);

        let content = fs::read_to_string(&report_path).unwrap();
        fs::write(&report_path, content.replace("null", "\"incoming\"")).unwrap();
        let outcome = generate(&incoming, &out, &report_path).unwrap();
        assert!(matches!(outcome, GenerateOutcome::Written { resolved: 1, .. }));
        assert_eq!(
            fs::read_to_string(out.join("en.json")).unwrap(),
            "{\n  \"greet\": \"Hello\"\n}\n"
        );
        assert!(!report_path.exists());
    }

    #[test]
    fn test_failed_pack_leaves_others_untouched() {
        let dir = TempDir::new().unwrap();
        let original = "{\n  \"a\": \"X\"\n}\n";
        fs::write(dir.path().join("en.json"), original).unwrap();
        // a directory where the ja staging file should go makes that write fail
        fs::create_dir(dir.path().join("ja.json.tmp")).unwrap();

        let incoming = BTreeMap::from([
            ("en".to_string(), pack(&[("a", "X"), ("b", "Y")])),
            ("ja".to_string(), pack(&[("a", "エックス")])),
        ]);
        assert!(write_packs(dir.path(), &incoming).is_err());
        assert_eq!(fs::read_to_string(dir.path().join("en.json")).unwrap(), original);
        assert!(!dir.path().join("en.json.tmp").exists());
        assert!(!dir.path().join("ja.json").exists());
    }

    #[test]
    fn test_malformed_pack_aborts() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("en.json"), "[1, 2]").unwrap();
        let err = generate(&packs("en", &[("a", "X")]), dir.path(), &dir.path().join("c.json"));
        assert!(err.is_err());
    }
}
