use anyhow::Result;
use pretty_assertions::assert_eq;

use crate::{CONFIG, CliTest, sheet_rows, stdout};

#[test]
fn test_replace_rewrites_and_imports() -> Result<()> {
    let test = CliTest::with_config(CONFIG)?;
    test.write_file(
        "src/a.jsx",
        "const a = '确定';\nconst v = <Button testID=\"确定\" title=\"取消\" />;\n",
    )?;

    assert!(test.run(&["scan"])?.status.success());
    let output = test.run(&["replace"])?;
    assert!(output.status.success(), "{}", stdout(&output));
    assert!(stdout(&output).contains("Replaced 2 texts in 1 file:"));

    assert_eq!(
        test.read_file("src/a.jsx")?,
        "import { t } from 'core/util/i18n';\nconst a = t('i18n_fac2a67ad878');\nconst v = <Button testID=\"确定\" title={t('i18n_2cd0f3be8738')} />;\n"
    );
    Ok(())
}

#[test]
fn test_replace_reaches_shared_text_in_every_file() -> Result<()> {
    let test = CliTest::with_config(CONFIG)?;
    test.write_file("src/a.js", "export const a = '确定';\n")?;
    test.write_file("src/pages/b.js", "export const b = '确定';\n")?;

    assert!(test.run(&["scan"])?.status.success());
    let ledger = test.read_json("i18n/translations.json")?;
    assert_eq!(sheet_rows(&ledger, "src").len(), 1);

    let output = test.run(&["replace"])?;
    assert!(output.status.success());
    assert!(stdout(&output).contains("Replaced 2 texts in 2 files:"));
    for (file, name) in [("src/a.js", "a"), ("src/pages/b.js", "b")] {
        assert_eq!(
            test.read_file(file)?,
            format!("import {{ t }} from 'core/util/i18n';\nexport const {name} = t('i18n_fac2a67ad878');\n")
        );
    }
    Ok(())
}

#[test]
fn test_replace_twice_is_noop() -> Result<()> {
    let test = CliTest::with_config(CONFIG)?;
    test.write_file("src/a.js", "'use client';\nexport const a = '确定';\n")?;

    test.run(&["scan"])?;
    test.run(&["replace"])?;
    let first = test.read_file("src/a.js")?;
    assert_eq!(
        first,
        "'use client';\nimport { t } from 'core/util/i18n';\nexport const a = t('i18n_fac2a67ad878');\n"
    );

    let output = test.run(&["replace"])?;
    assert!(output.status.success());
    assert!(stdout(&output).contains("nothing to replace"));
    assert_eq!(test.read_file("src/a.js")?, first);
    Ok(())
}

#[test]
fn test_replace_dry_run_leaves_files() -> Result<()> {
    let test = CliTest::with_config(CONFIG)?;
    let source = "export const a = '确定';\n";
    test.write_file("src/a.js", source)?;

    test.run(&["scan"])?;
    let output = test.run(&["replace", "--dry-run", "--import-path", "@/i18n"])?;
    assert!(output.status.success());
    assert!(stdout(&output).contains("Would replace 1 text in 1 file:"));
    assert_eq!(test.read_file("src/a.js")?, source);
    Ok(())
}

#[test]
fn test_replace_single_file_and_custom_import() -> Result<()> {
    let test = CliTest::with_config(CONFIG)?;
    test.write_file("src/a.js", "export const a = '确定';\n")?;
    test.write_file("src/b.js", "export const b = '取消';\n")?;

    test.run(&["scan"])?;
    let output = test.run(&["replace", "--file", "src/b.js", "--import-path", "@/i18n"])?;
    assert!(output.status.success());

    assert_eq!(test.read_file("src/a.js")?, "export const a = '确定';\n");
    assert_eq!(
        test.read_file("src/b.js")?,
        "import { t } from '@/i18n';\nexport const b = t('i18n_2cd0f3be8738');\n"
    );
    Ok(())
}

#[test]
fn test_replace_unknown_file_warns() -> Result<()> {
    let test = CliTest::with_config(CONFIG)?;
    test.write_file("src/a.js", "export const a = '确定';\n")?;

    test.run(&["scan"])?;
    let output = test.run(&["replace", "--file", "src/other.js"])?;
    assert!(output.status.success());
    assert!(stdout(&output).contains("no-ledger-rows"));
    Ok(())
}

#[test]
fn test_replace_missing_source_is_skipped() -> Result<()> {
    let test = CliTest::with_config(CONFIG)?;
    test.write_file("src/a.js", "export const a = '确定';\n")?;
    test.write_file("src/b.js", "export const b = '取消';\n")?;

    test.run(&["scan"])?;
    std::fs::remove_file(test.root().join("src/a.js"))?;
    let output = test.run(&["replace"])?;
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("missing-source"));
    assert!(out.contains("--> src/a.js"));
    assert!(test.read_file("src/b.js")?.contains("t('i18n_2cd0f3be8738')"));
    Ok(())
}

#[test]
fn test_replace_without_ledger_is_error() -> Result<()> {
    let test = CliTest::with_config(CONFIG)?;

    let output = test.run(&["replace"])?;
    assert_eq!(output.status.code(), Some(2));
    Ok(())
}
