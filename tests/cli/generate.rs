use anyhow::Result;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::{CONFIG, CliTest, sheet_rows, stdout};

const LEDGER: &str = r#"{
  "hashScheme": { "algorithm": "sha256", "length": 12 },
  "sheets": [
    {
      "name": "src",
      "rows": [
        { "key": "i18n_ok", "text": "确定", "file": "src/a.js", "line": 1, "en": "OK" },
        { "key": "i18n_cancel", "text": "取消", "file": "src/a.js", "line": 2, "en": "" },
        { "key": "i18n_gone", "text": "旧文本", "file": "src/a.js", "line": 3, "status": "deleted", "en": "Old" }
      ]
    }
  ]
}
"#;

fn setup() -> Result<CliTest> {
    let test = CliTest::with_config(CONFIG)?;
    test.write_file("i18n/translations.json", LEDGER)?;
    Ok(test)
}

#[test]
fn test_gen_writes_packs() -> Result<()> {
    let test = setup()?;

    let output = test.run(&["gen"])?;
    assert!(output.status.success(), "{}", stdout(&output));
    assert!(stdout(&output).contains("Wrote 2 locale packs"));

    assert_eq!(test.read_file("i18n/locales/en.json")?, "{\n  \"i18n_ok\": \"OK\"\n}\n");
    assert_eq!(
        test.read_json("i18n/locales/zh.json")?,
        json!({ "i18n_cancel": "取消", "i18n_ok": "确定" })
    );
    Ok(())
}

#[test]
fn test_gen_keeps_unrelated_existing_keys() -> Result<()> {
    let test = setup()?;
    test.write_file("i18n/locales/en.json", r#"{ "other": "Other", "i18n_ok": "OK" }"#)?;

    assert!(test.run(&["gen"])?.status.success());
    assert_eq!(
        test.read_json("i18n/locales/en.json")?,
        json!({ "i18n_ok": "OK", "other": "Other" })
    );
    Ok(())
}

#[test]
fn test_gen_conflict_blocks_then_resolves() -> Result<()> {
    let test = setup()?;
    let existing = r#"{ "i18n_ok": "Okay" }"#;
    test.write_file("i18n/locales/en.json", existing)?;

    let output = test.run(&["gen"])?;
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("1 conflict (1 unresolved); no locale pack was written"));
    assert_eq!(test.read_file("i18n/locales/en.json")?, existing);
    assert!(!test.root().join("i18n/locales/zh.json").exists());

    let report = test.read_json("i18n/conflicts.json")?;
    assert_eq!(
        report,
        json!({ "en": { "i18n_ok": { "existingValue": "Okay", "incomingValue": "OK", "selected": null } } })
    );

    test.write_file(
        "i18n/conflicts.json",
        r#"{ "en": { "i18n_ok": { "existingValue": "Okay", "incomingValue": "OK", "selected": "existing" } } }"#,
    )?;
    let output = test.run(&["gen"])?;
    assert!(output.status.success(), "{}", stdout(&output));
    assert!(stdout(&output).contains("Applied 1 conflict selection"));
    assert_eq!(test.read_json("i18n/locales/en.json")?, json!({ "i18n_ok": "Okay" }));
    assert!(!test.root().join("i18n/conflicts.json").exists());
    Ok(())
}

#[test]
fn test_gen_override_selection() -> Result<()> {
    let test = setup()?;
    test.write_file("i18n/locales/en.json", r#"{ "i18n_ok": "Okay" }"#)?;
    test.write_file(
        "i18n/conflicts.json",
        r#"{ "en": { "i18n_ok": { "existingValue": "Okay", "incomingValue": "OK", "selected": { "override": "Confirm" } } } }"#,
    )?;

    assert!(test.run(&["gen"])?.status.success());
    assert_eq!(test.read_json("i18n/locales/en.json")?, json!({ "i18n_ok": "Confirm" }));
    Ok(())
}

#[test]
fn test_gen_appends_to_master() -> Result<()> {
    let test = setup()?;
    test.write_file(
        "master.json",
        r#"{
  "hashScheme": { "algorithm": "sha256", "length": 12 },
  "sheets": [
    { "name": "src", "rows": [ { "key": "i18n_z", "text": "早", "file": "lib/z.js", "line": 9 } ] }
  ]
}"#,
    )?;

    let output = test.run(&["gen", "--master", "master.json", "--out", "packs"])?;
    assert!(output.status.success(), "{}", stdout(&output));
    assert!(test.root().join("packs/en.json").exists());

    let master = test.read_json("master.json")?;
    let keys: Vec<&str> = sheet_rows(&master, "src")
        .iter()
        .filter_map(|r| r["key"].as_str())
        .collect();
    assert_eq!(keys, vec!["i18n_ok", "i18n_cancel", "i18n_gone", "i18n_z"]);
    Ok(())
}

#[test]
fn test_gen_malformed_pack_aborts() -> Result<()> {
    let test = setup()?;
    test.write_file("i18n/locales/en.json", "[1, 2]")?;

    let output = test.run(&["gen"])?;
    assert_eq!(output.status.code(), Some(2));
    assert_eq!(test.read_file("i18n/locales/en.json")?, "[1, 2]");
    Ok(())
}
