use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::hash::HashScheme;
use crate::core::script::{DEFAULT_RANGE, TargetScript};

pub const CONFIG_FILE_NAME: &str = ".hanzirc.json";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default = "default_src_roots")]
    pub src_roots: Vec<String>,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    /// Substring (or glob, with `*`/`?`) matched against relative paths.
    #[serde(default = "default_ignores")]
    pub ignores: Vec<String>,
    #[serde(default = "default_true")]
    pub skip_declaration_files: bool,
    #[serde(default = "default_test_attributes")]
    pub test_attributes: Vec<String>,
    #[serde(default = "default_style_factories")]
    pub style_factories: Vec<String>,
    /// Inclusive code-point ranges such as `"4E00-9FA5"`.
    #[serde(default = "default_target_script")]
    pub target_script: Vec<String>,
    #[serde(default)]
    pub hash_scheme: HashScheme,
    #[serde(default = "default_lookup_fn")]
    pub lookup_fn: String,
    #[serde(default = "default_import_path")]
    pub import_path: String,
    #[serde(default = "default_source_locale")]
    pub source_locale: String,
    /// Locale columns created for every new ledger row.
    #[serde(default = "default_locales")]
    pub locales: Vec<String>,
    #[serde(default = "default_ledger")]
    pub ledger: String,
    #[serde(default = "default_locales_dir")]
    pub locales_dir: String,
    #[serde(default = "default_conflict_report")]
    pub conflict_report: String,
    #[serde(default = "default_sync_report")]
    pub sync_report: String,
    /// Command run on rewritten files, e.g. `["npx", "prettier", "--write"]`.
    #[serde(default)]
    pub formatter: Vec<String>,
    #[serde(default = "default_true")]
    pub restore_member_gaps: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_prefix: Option<String>,
}

fn default_src_roots() -> Vec<String> {
    vec!["src".to_string()]
}

fn default_extensions() -> Vec<String> {
    ["js", "jsx", "ts", "tsx"].map(String::from).to_vec()
}

fn default_ignores() -> Vec<String> {
    ["node_modules", ".git", "dist", "build"].map(String::from).to_vec()
}

fn default_true() -> bool {
    true
}

fn default_test_attributes() -> Vec<String> {
    [
        "testID",
        "accessibilityLabel",
        "accessibilityHint",
        "nativeID",
        "data-testid",
    ]
    .map(String::from)
    .to_vec()
}

fn default_style_factories() -> Vec<String> {
    vec!["StyleSheet.create".to_string()]
}

fn default_target_script() -> Vec<String> {
    vec![DEFAULT_RANGE.to_string()]
}

fn default_lookup_fn() -> String {
    "t".to_string()
}

fn default_import_path() -> String {
    "core/util/i18n".to_string()
}

fn default_source_locale() -> String {
    "zh".to_string()
}

fn default_locales() -> Vec<String> {
    vec!["en".to_string()]
}

fn default_ledger() -> String {
    "i18n/translations.json".to_string()
}

fn default_locales_dir() -> String {
    "i18n/locales".to_string()
}

fn default_conflict_report() -> String {
    "i18n/conflicts.json".to_string()
}

fn default_sync_report() -> String {
    "i18n/sync-report.md".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            src_roots: default_src_roots(),
            extensions: default_extensions(),
            ignores: default_ignores(),
            skip_declaration_files: true,
            test_attributes: default_test_attributes(),
            style_factories: default_style_factories(),
            target_script: default_target_script(),
            hash_scheme: HashScheme::default(),
            lookup_fn: default_lookup_fn(),
            import_path: default_import_path(),
            source_locale: default_source_locale(),
            locales: default_locales(),
            ledger: default_ledger(),
            locales_dir: default_locales_dir(),
            conflict_report: default_conflict_report(),
            sync_report: default_sync_report(),
            formatter: Vec::new(),
            restore_member_gaps: true,
            link_prefix: None,
        }
    }
}

impl Config {
    /// Target script from `targetScript`, with a warning per dropped entry.
    pub fn target_script(&self) -> (TargetScript, Vec<String>) {
        TargetScript::from_specs(&self.target_script)
    }

    /// Problems that do not stop a run.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings: Vec<String> = self.target_script().1;
        warnings.extend(self.hash_scheme.length_warning());
        if self.lookup_fn.is_empty() {
            warnings.push("lookupFn is empty".to_string());
        }
        warnings
    }
}

pub fn default_config_json() -> Result<String> {
    let config = Config::default();
    serde_json::to_string_pretty(&config).context("Failed to generate default config.")
}

pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Some(config_path);
        }
        if current.join(".git").exists() {
            return None;
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Result of loading configuration.
pub struct ConfigLoadResult {
    pub config: Config,
    /// File the config came from, if any.
    pub path: Option<PathBuf>,
    /// Reported once; defaults were used where they apply.
    pub warnings: Vec<String>,
}

/// Loads `explicit` if given, otherwise the nearest config file above
/// `start_dir`. A config that fails to parse is a warning and yields the
/// defaults; only an unreadable explicit path is an error.
pub fn load_config(start_dir: &Path, explicit: Option<&Path>) -> Result<ConfigLoadResult> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => find_config_file(start_dir),
    };
    let Some(path) = path else {
        return Ok(ConfigLoadResult {
            config: Config::default(),
            path: None,
            warnings: Vec::new(),
        });
    };

    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let (config, mut warnings) = match serde_json::from_str::<Config>(&content) {
        Ok(config) => (config, Vec::new()),
        Err(e) => (
            Config::default(),
            vec![format!(
                "{} is invalid ({e}); using default configuration",
                path.display()
            )],
        ),
    };
    warnings.extend(config.warnings());
    Ok(ConfigLoadResult {
        config,
        path: Some(path),
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use crate::config::*;
    use crate::core::hash::HashAlgorithm;
    use std::fs::File;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.src_roots, vec!["src"]);
        assert!(config.test_attributes.contains(&"testID".to_string()));
        assert_eq!(config.lookup_fn, "t");
        assert!(config.warnings().is_empty());
    }

    #[test]
    fn test_partial_config() {
        let json = r#"{
              "srcRoots": ["app", "lib"],
              "hashScheme": { "algorithm": "sha1", "length": 10 },
              "linkPrefix": "https://git.example.com/blob/dev"
          }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.src_roots, vec!["app", "lib"]);
        assert_eq!(config.hash_scheme.algorithm, HashAlgorithm::Sha1);
        assert_eq!(config.hash_scheme.length, 10);
        assert_eq!(config.ignores, default_ignores());
        assert_eq!(config.import_path, "core/util/i18n");
    }

    #[test]
    fn test_default_config_json_round_trips() {
        let json = default_config_json().unwrap();
        let config: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(config, Config::default());
        assert!(json.contains("\"testAttributes\""));
    }

    #[test]
    fn test_find_config_file() {
        let dir = tempdir().unwrap();
        let sub_dir = dir.path().join("src").join("components");
        fs::create_dir_all(&sub_dir).unwrap();

        let config_path = dir.path().join(CONFIG_FILE_NAME);
        File::create(&config_path).unwrap();

        assert_eq!(find_config_file(&sub_dir), Some(config_path));
    }

    #[test]
    fn test_find_config_stops_at_git() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        assert!(find_config_file(dir.path()).is_none());
    }

    #[test]
    fn test_malformed_config_warns_and_defaults() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "{ nope").unwrap();

        let result = load_config(dir.path(), None).unwrap();
        assert!(result.path.is_some());
        assert_eq!(result.config, Config::default());
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_bad_target_script_warns() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            r#"{ "targetScript": ["3040-309F", "zzz"] }"#,
        )
        .unwrap();

        let result = load_config(dir.path(), None).unwrap();
        assert_eq!(result.warnings.len(), 1);
        let (script, _) = result.config.target_script();
        assert!(script.matches("ひらがな"));
    }

    #[test]
    fn test_explicit_missing_config_is_error() {
        let dir = tempdir().unwrap();
        assert!(load_config(dir.path(), Some(&dir.path().join("nope.json"))).is_err());
    }
}
