use std::fs;

use anyhow::Result;
use pretty_assertions::assert_eq;

use crate::{CONFIG, CliTest, sheet_rows, stdout};

const LEDGER: &str = r#"{
  "hashScheme": { "algorithm": "sha256", "length": 12 },
  "sheets": [
    {
      "name": "src",
      "rows": [
        { "key": "i18n_abc", "text": "确定", "file": "src/a.js", "line": 1, "en": "OK" },
        { "key": "i18n_old", "text": "旧文本", "file": "src/a.js", "line": 2, "en": "Old" }
      ]
    }
  ]
}
"#;

fn setup() -> Result<CliTest> {
    let test = CliTest::with_config(CONFIG)?;
    test.write_file("i18n/translations.json", LEDGER)?;
    test.write_file(
        "src/b.js",
        "\nexport const b = '确定';\nexport const c = '你好';\n",
    )?;
    Ok(test)
}

#[test]
fn test_sync_keeps_keys_and_translations() -> Result<()> {
    let test = setup()?;

    let output = test.run(&["sync"])?;
    assert!(output.status.success(), "{}", stdout(&output));
    assert!(stdout(&output).contains("src: 0 matched, 1 moved, 1 new, 1 missing"));

    let ledger = test.read_json("i18n/translations.json")?;
    let rows = sheet_rows(&ledger, "src");
    assert_eq!(rows.len(), 3);

    assert_eq!(rows[0]["key"], "i18n_abc");
    assert_eq!(rows[0]["file"], "src/b.js");
    assert_eq!(rows[0]["line"], 2);
    assert_eq!(rows[0]["en"], "OK");
    assert!(rows[0].get("status").is_none());

    assert_eq!(rows[1]["key"], "i18n_670d9743542c");
    assert_eq!(rows[1]["en"], "");

    assert_eq!(rows[2]["key"], "i18n_old");
    assert_eq!(rows[2]["status"], "deleted");
    assert_eq!(rows[2]["en"], "Old");
    Ok(())
}

#[test]
fn test_sync_writes_report_and_backup() -> Result<()> {
    let test = setup()?;

    assert!(test.run(&["sync"])?.status.success());

    let report = test.read_file("i18n/sync-report.md")?;
    assert!(report.starts_with("# Translation sync report\n"));
    assert!(report.contains("- \"确定\" src/a.js:1 -> src/b.js:2"));
    assert!(report.contains("- \"旧文本\" from src/a.js:2 (translations kept)"));

    let backups: Vec<String> = fs::read_dir(test.root().join("i18n"))?
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with("translations.json.backup."))
        .collect();
    assert_eq!(backups.len(), 1);
    assert_eq!(test.read_file(&format!("i18n/{}", backups[0]))?, LEDGER);
    Ok(())
}

#[test]
fn test_sync_to_separate_output() -> Result<()> {
    let test = setup()?;

    let output = test.run(&["sync", "--output", "out/synced.json", "--report", "out/report.md"])?;
    assert!(output.status.success());

    assert_eq!(test.read_file("i18n/translations.json")?, LEDGER);
    assert_eq!(sheet_rows(&test.read_json("out/synced.json")?, "src").len(), 3);
    assert!(test.root().join("out/report.md").exists());
    Ok(())
}

#[test]
fn test_sync_revives_deleted_row() -> Result<()> {
    let test = setup()?;
    test.run(&["sync"])?;

    test.write_file("src/b.js", "export const d = '旧文本';\n")?;
    assert!(test.run(&["sync"])?.status.success());

    let ledger = test.read_json("i18n/translations.json")?;
    let revived = sheet_rows(&ledger, "src")
        .iter()
        .find(|r| r["key"] == "i18n_old")
        .cloned()
        .unwrap_or_default();
    assert!(revived.get("status").is_none());
    assert_eq!(revived["en"], "Old");
    Ok(())
}

#[test]
fn test_sync_malformed_ledger_aborts() -> Result<()> {
    let test = CliTest::with_config(CONFIG)?;
    test.write_file("i18n/translations.json", "{ broken")?;
    test.write_file("src/a.js", "export const a = '确定';\n")?;

    let output = test.run(&["sync"])?;
    assert_eq!(output.status.code(), Some(2));
    assert_eq!(test.read_file("i18n/translations.json")?, "{ broken");
    Ok(())
}

#[test]
fn test_sync_unchanged_tree_with_shared_text() -> Result<()> {
    let test = CliTest::with_config(CONFIG)?;
    test.write_file("src/a.js", "export const a = '确定';\n")?;
    test.write_file("src/b.js", "export const b = '确定';\n")?;
    assert!(test.run(&["scan"])?.status.success());

    let output = test.run(&["sync"])?;
    assert!(output.status.success());
    assert!(stdout(&output).contains("src: 1 matched, 0 moved, 0 new, 0 missing"));
    assert_eq!(sheet_rows(&test.read_json("i18n/translations.json")?, "src").len(), 1);
    Ok(())
}
