//! The translation ledger and its on-disk store.
//!
//! A ledger is a set of named sheets, one per scanned source root, each a
//! list of rows keyed by translation key. Any row column outside
//! [`RESERVED_COLUMNS`] is a locale code. The hash scheme that produced the
//! keys is stored alongside the sheets.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::core::data::TranslationRecord;
use crate::core::hash::HashScheme;
use crate::core::hooks::{SourceLinker, Translator};
use crate::core::reconcile::SyncResult;
use crate::utils::basename;

/// Row columns that are not locale codes.
pub const RESERVED_COLUMNS: &[&str] = &[
    "key", "text", "file", "line", "link", "hash", "context", "status",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowStatus {
    #[default]
    Active,
    /// No longer found in the source; kept for its translations.
    Deleted,
}

impl RowStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, RowStatus::Active)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRow {
    pub key: String,
    pub text: String,
    pub file: String,
    pub line: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    /// Content hash used by reconciliation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "RowStatus::is_active")]
    pub status: RowStatus,
    /// Locale code to translation.
    #[serde(flatten)]
    pub locales: BTreeMap<String, String>,
}

impl LedgerRow {
    pub fn from_record(record: &TranslationRecord, linker: Option<&dyn SourceLinker>) -> Self {
        Self {
            key: record.key.clone(),
            text: record.text.clone(),
            file: record.file.clone(),
            line: record.line,
            link: linker.map(|l| l.link(&record.file, record.line)),
            hash: (!record.content_hash.is_empty()).then(|| record.content_hash.clone()),
            context: record.context.clone(),
            status: RowStatus::Active,
            locales: record.per_locale.clone(),
        }
    }

    pub fn to_record(&self) -> TranslationRecord {
        TranslationRecord {
            key: self.key.clone(),
            text: self.text.clone(),
            file: self.file.clone(),
            line: self.line,
            content_hash: self.hash.clone().unwrap_or_default(),
            context: self.context.clone(),
            per_locale: self.locales.clone(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

/// Two distinct texts that derived the same key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCollision {
    pub key: String,
    pub kept: String,
    pub dropped: String,
    pub file: String,
    pub line: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    #[serde(default)]
    pub rows: Vec<LedgerRow>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
        }
    }

    /// One row per key, keeping the first occurrence in `(file, line)`
    /// order. A later occurrence with a different text under the same key
    /// is dropped and reported.
    pub fn from_records(
        name: impl Into<String>,
        records: &[TranslationRecord],
        linker: Option<&dyn SourceLinker>,
    ) -> (Self, Vec<KeyCollision>) {
        let mut ordered: Vec<&TranslationRecord> = records.iter().collect();
        ordered.sort_by(|a, b| (a.file.as_str(), a.line).cmp(&(b.file.as_str(), b.line)));

        let mut sheet = Self::new(name);
        let mut collisions = Vec::new();
        let mut seen: HashMap<&str, &str> = HashMap::new();
        for record in ordered {
            match seen.get(record.key.as_str()) {
                Some(kept) if *kept != record.text => collisions.push(KeyCollision {
                    key: record.key.clone(),
                    kept: kept.to_string(),
                    dropped: record.text.clone(),
                    file: record.file.clone(),
                    line: record.line,
                }),
                Some(_) => {}
                None => {
                    seen.insert(&record.key, &record.text);
                    sheet.rows.push(LedgerRow::from_record(record, linker));
                }
            }
        }
        (sheet, collisions)
    }

    /// Rebuild a sheet from a reconciliation: live rows first, then the
    /// missing ones marked deleted. Keys already live are not repeated.
    pub fn from_sync(
        name: impl Into<String>,
        result: &SyncResult,
        linker: Option<&dyn SourceLinker>,
    ) -> (Self, Vec<KeyCollision>) {
        let live: Vec<TranslationRecord> = result.live_records().cloned().collect();
        let (mut sheet, collisions) = Self::from_records(name, &live, linker);
        let live_keys: BTreeSet<String> = sheet.rows.iter().map(|r| r.key.clone()).collect();
        let mut deleted_keys = BTreeSet::new();
        for record in &result.missing {
            if live_keys.contains(&record.key) || !deleted_keys.insert(record.key.clone()) {
                continue;
            }
            let mut row = LedgerRow::from_record(record, linker);
            row.status = RowStatus::Deleted;
            sheet.rows.push(row);
        }
        (sheet, collisions)
    }

    /// Carries translations from `previous` onto this freshly scanned sheet.
    /// Rows are paired by key, then by text; a non-empty previous value
    /// fills an empty or absent column. Previous rows left unpaired are
    /// kept, marked deleted, unless their key is already present.
    pub fn carry_forward(&mut self, previous: &Sheet) {
        let paired = self.carry_translations(&previous.rows);
        self.keep_unpaired(&previous.rows, &paired);
    }

    /// This sheet with the rows of `file` replaced by `fresh`, a sheet
    /// scanned from that file alone. Fresh rows whose key is live in
    /// another file are dropped; rows of `file` that vanished are kept as
    /// deleted.
    pub fn splice_file(&self, file: &str, mut fresh: Sheet) -> Sheet {
        let fresh_keys: HashSet<&str> = fresh.rows.iter().map(|r| r.key.as_str()).collect();
        let (replaced, kept): (Vec<&LedgerRow>, Vec<&LedgerRow>) = self
            .rows
            .iter()
            .partition(|r| r.file == file || (!r.is_active() && fresh_keys.contains(r.key.as_str())));

        let kept_keys: HashSet<&str> = kept.iter().map(|r| r.key.as_str()).collect();
        fresh.rows.retain(|r| !kept_keys.contains(r.key.as_str()));
        let replaced: Vec<LedgerRow> = replaced.into_iter().cloned().collect();
        let paired = fresh.carry_translations(&replaced);

        let mut sheet = Sheet {
            name: self.name.clone(),
            rows: kept.into_iter().cloned().collect(),
        };
        sheet.rows.append(&mut fresh.rows);
        sheet.keep_unpaired(&replaced, &paired);
        sheet
    }

    /// Copies translations from the matching `previous` row onto each row.
    /// Returns which previous rows were paired.
    fn carry_translations(&mut self, previous: &[LedgerRow]) -> Vec<bool> {
        let mut by_key: HashMap<&str, usize> = HashMap::new();
        let mut by_text: HashMap<&str, usize> = HashMap::new();
        for (i, row) in previous.iter().enumerate() {
            by_key.entry(row.key.as_str()).or_insert(i);
            by_text.entry(row.text.as_str()).or_insert(i);
        }

        let mut paired = vec![false; previous.len()];
        for row in &mut self.rows {
            let Some(&i) = by_key.get(row.key.as_str()).or_else(|| by_text.get(row.text.as_str())) else {
                continue;
            };
            paired[i] = true;
            for (locale, value) in &previous[i].locales {
                if value.is_empty() {
                    continue;
                }
                let slot = row.locales.entry(locale.clone()).or_default();
                if slot.is_empty() {
                    *slot = value.clone();
                }
            }
        }
        paired
    }

    fn keep_unpaired(&mut self, previous: &[LedgerRow], paired: &[bool]) {
        let mut keys: HashSet<String> = self.rows.iter().map(|r| r.key.clone()).collect();
        for (row, _) in previous.iter().zip(paired).filter(|(_, paired)| !**paired) {
            if !keys.insert(row.key.clone()) {
                continue;
            }
            let mut row = row.clone();
            row.status = RowStatus::Deleted;
            self.rows.push(row);
        }
    }

    /// Adds every `locales` column missing from a row, asking the
    /// translator first and leaving it empty otherwise.
    pub fn prefill(&mut self, locales: &[String], translator: &dyn Translator) {
        for row in &mut self.rows {
            for locale in locales {
                if RESERVED_COLUMNS.contains(&locale.as_str()) || row.locales.contains_key(locale) {
                    continue;
                }
                let value = translator.translate(&row.text, locale).unwrap_or_default();
                row.locales.insert(locale.clone(), value);
            }
        }
    }

    pub fn records(&self) -> Vec<TranslationRecord> {
        self.rows.iter().map(LedgerRow::to_record).collect()
    }

    pub fn active_rows(&self) -> impl Iterator<Item = &LedgerRow> {
        self.rows.iter().filter(|r| r.is_active())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ledger {
    #[serde(default)]
    pub hash_scheme: HashScheme,
    #[serde(default)]
    pub sheets: Vec<Sheet>,
}

impl Ledger {
    pub fn new(hash_scheme: HashScheme) -> Self {
        Self {
            hash_scheme,
            sheets: Vec::new(),
        }
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// Replaces the sheet with the same name, or appends it.
    pub fn put_sheet(&mut self, sheet: Sheet) {
        match self.sheets.iter_mut().find(|s| s.name == sheet.name) {
            Some(existing) => *existing = sheet,
            None => self.sheets.push(sheet),
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = &LedgerRow> {
        self.sheets.iter().flat_map(|s| s.rows.iter())
    }

    pub fn active_rows(&self) -> impl Iterator<Item = &LedgerRow> {
        self.rows().filter(|r| r.is_active())
    }

    /// Every locale column present on any row.
    pub fn locales(&self) -> BTreeSet<String> {
        self.rows()
            .flat_map(|r| r.locales.keys())
            .filter(|k| !RESERVED_COLUMNS.contains(&k.as_str()))
            .cloned()
            .collect()
    }

    /// Appends this ledger's rows into `master` sheet by sheet, creating
    /// sheets `master` lacks. Rows are ordered by file basename, then line;
    /// rows without a file go last.
    pub fn append_into(&self, master: &mut Ledger) {
        for sheet in &self.sheets {
            let mut rows = master
                .sheet(&sheet.name)
                .map(|s| s.rows.clone())
                .unwrap_or_default();
            rows.extend(sheet.rows.iter().cloned());
            rows.sort_by(|a, b| {
                let (fa, fb) = (basename(&a.file), basename(&b.file));
                (fa.is_empty(), fa, a.line).cmp(&(fb.is_empty(), fb, b.line))
            });
            master.put_sheet(Sheet {
                name: sheet.name.clone(),
                rows,
            });
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("failed to read ledger {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("ledger {} is not valid: {source}", path.display())]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to write ledger {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Persistence for a whole ledger; read and written in full.
pub trait LedgerStore {
    /// `None` when no ledger exists yet.
    fn load(&self) -> Result<Option<Ledger>, LedgerError>;
    fn save(&self, ledger: &Ledger) -> Result<(), LedgerError>;
}

/// Ledger stored as one pretty-printed JSON document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonLedgerStore {
    path: PathBuf,
}

impl JsonLedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Copies the current file to `<ledger>.backup.<unix seconds>`.
    pub fn backup(&self) -> Result<Option<PathBuf>, LedgerError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let mut name = self.path.as_os_str().to_owned();
        name.push(format!(".backup.{secs}"));
        let backup = PathBuf::from(name);
        fs::copy(&self.path, &backup).map_err(|source| LedgerError::Write {
            path: backup.clone(),
            source,
        })?;
        Ok(Some(backup))
    }
}

impl LedgerStore for JsonLedgerStore {
    fn load(&self) -> Result<Option<Ledger>, LedgerError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path).map_err(|source| LedgerError::Read {
            path: self.path.clone(),
            source,
        })?;
        let ledger = serde_json::from_str(&content).map_err(|source| LedgerError::Malformed {
            path: self.path.clone(),
            source,
        })?;
        Ok(Some(ledger))
    }

    fn save(&self, ledger: &Ledger) -> Result<(), LedgerError> {
        let write_err = |source| LedgerError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let mut content = serde_json::to_string_pretty(ledger).map_err(|e| write_err(e.into()))?;
        content.push('\n');
        fs::write(&self.path, content).map_err(write_err)
    }
}
