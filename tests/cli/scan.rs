use anyhow::Result;
use pretty_assertions::assert_eq;

use crate::{CONFIG, CliTest, sheet_rows, stdout};

const LOGIN: &str = r#"import React from 'react';

export default function Login() {
  // 注释里的中文不提取
  const title = '登录';
  return (
    <View testID="登录按钮">
      <Text>确定</Text>
      <Button title="取消" />
    </View>
  );
}
"#;

#[test]
fn test_scan_writes_ledger() -> Result<()> {
    let test = CliTest::with_config(CONFIG)?;
    test.write_file("src/pages/Login.jsx", LOGIN)?;

    let output = test.run(&["scan"])?;
    assert!(output.status.success(), "{}", stdout(&output));
    assert!(stdout(&output).contains("Scanned 1 file: 3 occurrences, 3 rows in 1 sheet"));

    let ledger = test.read_json("i18n/translations.json")?;
    assert_eq!(ledger["hashScheme"]["algorithm"], "sha256");
    let rows = sheet_rows(&ledger, "src");
    let texts: Vec<&str> = rows.iter().filter_map(|r| r["text"].as_str()).collect();
    assert_eq!(texts, vec!["登录", "确定", "取消"]);

    let first = &rows[0];
    assert_eq!(first["key"], "i18n_1e2df9c3075a");
    assert_eq!(first["file"], "src/pages/Login.jsx");
    assert_eq!(first["line"], 5);
    assert_eq!(first["en"], "");
    assert!(first.get("link").is_none());
    Ok(())
}

#[test]
fn test_scan_deduplicates_by_key() -> Result<()> {
    let test = CliTest::with_config(CONFIG)?;
    test.write_file("src/a.js", "export const a = '确定';\n")?;
    test.write_file("src/b.js", "export const b = '确定';\nexport const c = '取消';\n")?;

    let output = test.run(&["scan"])?;
    assert!(output.status.success());

    let ledger = test.read_json("i18n/translations.json")?;
    let rows = sheet_rows(&ledger, "src");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["file"], "src/a.js");
    assert_eq!(rows[1]["key"], "i18n_2cd0f3be8738");
    Ok(())
}

#[test]
fn test_scan_flags_override_config() -> Result<()> {
    let test = CliTest::with_config(CONFIG)?;
    test.write_file("app/src/a.js", "export const a = '你好';\n")?;
    test.write_file("lib/b.ts", "export const b: string = '确定';\n")?;

    let output = test.run(&[
        "scan",
        "--src",
        "app/src,lib",
        "--out",
        "out/ledger.json",
        "--link-prefix",
        "https://git.example.com/blob/dev/",
    ])?;
    assert!(output.status.success());

    let ledger = test.read_json("out/ledger.json")?;
    let rows = sheet_rows(&ledger, "src");
    assert_eq!(rows[0]["key"], "i18n_670d9743542c");
    assert_eq!(rows[0]["link"], "https://git.example.com/blob/dev/app/src/a.js#L1");
    assert_eq!(sheet_rows(&ledger, "lib").len(), 1);
    Ok(())
}

#[test]
fn test_scan_skips_unparseable_file_with_warning() -> Result<()> {
    let test = CliTest::with_config(CONFIG)?;
    test.write_file("src/ok.js", "export const a = '确定';\n")?;
    test.write_file("src/broken.js", "const = '取消' = ;\n")?;

    let output = test.run(&["scan"])?;
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("parse-error"));
    assert!(out.contains("--> src/broken.js"));

    let ledger = test.read_json("i18n/translations.json")?;
    assert_eq!(sheet_rows(&ledger, "src").len(), 1);
    Ok(())
}

#[test]
fn test_scan_backs_up_existing_ledger() -> Result<()> {
    let test = CliTest::with_config(CONFIG)?;
    test.write_file("src/a.js", "export const a = '确定';\n")?;

    test.run(&["scan"])?;
    let output = test.run(&["scan"])?;
    assert!(output.status.success());
    assert!(stdout(&output).contains("Previous ledger saved to i18n/translations.json.backup."));
    Ok(())
}

#[test]
fn test_rescan_keeps_translations() -> Result<()> {
    let test = CliTest::with_config(CONFIG)?;
    test.write_file("src/a.js", "export const a = '确定';\nexport const b = '取消';\n")?;
    test.run(&["scan"])?;

    let ledger = test.read_file("i18n/translations.json")?;
    test.write_file(
        "i18n/translations.json",
        &ledger.replacen("\"en\": \"\"", "\"en\": \"OK\"", 1),
    )?;
    test.write_file("src/a.js", "\nexport const a = '确定';\n")?;

    let output = test.run(&["scan"])?;
    assert!(output.status.success());
    let ledger = test.read_json("i18n/translations.json")?;
    let rows = sheet_rows(&ledger, "src");
    assert_eq!(rows[0]["text"], "确定");
    assert_eq!(rows[0]["line"], 2);
    assert_eq!(rows[0]["en"], "OK");
    assert_eq!(rows[1]["text"], "取消");
    assert_eq!(rows[1]["status"], "deleted");
    Ok(())
}

#[test]
fn test_scan_single_file_touches_only_its_rows() -> Result<()> {
    let test = CliTest::with_config(CONFIG)?;
    test.write_file("src/a.js", "export const a = '确定';\n")?;
    test.write_file("src/b.js", "export const b = '取消';\n")?;
    test.run(&["scan"])?;

    test.write_file("src/a.js", "export const a = '返回';\n")?;
    test.write_file("src/b.js", "export const b = '取消';\nexport const c = '新的';\n")?;
    let output = test.run(&["scan", "--file", "src/b.js"])?;
    assert!(output.status.success());

    let ledger = test.read_json("i18n/translations.json")?;
    let rows: Vec<(&str, &str)> = sheet_rows(&ledger, "src")
        .iter()
        .filter_map(|r| Some((r["file"].as_str()?, r["text"].as_str()?)))
        .collect();
    assert_eq!(rows, vec![("src/a.js", "确定"), ("src/b.js", "取消"), ("src/b.js", "新的")]);
    Ok(())
}

#[test]
fn test_scan_malformed_config_uses_defaults() -> Result<()> {
    let test = CliTest::with_config("{ not json")?;
    test.write_file("src/a.js", "export const a = '确定';\n")?;

    let output = test.run(&["scan"])?;
    assert!(output.status.success());
    assert!(stdout(&output).contains("using default configuration"));
    assert!(test.root().join("i18n/translations.json").exists());
    Ok(())
}
