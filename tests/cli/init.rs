use anyhow::{Context, Result};
use serde_json::Value;

use crate::{CliTest, stdout};

#[test]
fn test_init_creates_config() -> Result<()> {
    let test = CliTest::new()?;

    let output = test.run(&["init"])?;
    assert!(output.status.success());
    insta::assert_snapshot!(stdout(&output).trim_end(), @"✓ Created .hanzirc.json");

    let content = test.read_file(".hanzirc.json")?;
    let parsed: Value = serde_json::from_str(&content).context("Config should be valid JSON")?;
    assert_eq!(parsed["srcRoots"][0], "src");
    assert_eq!(parsed["lookupFn"], "t");
    assert_eq!(parsed["hashScheme"]["algorithm"], "sha256");
    Ok(())
}

#[test]
fn test_init_fails_if_exists() -> Result<()> {
    let test = CliTest::new()?;
    test.write_file(".hanzirc.json", "{}")?;

    let output = test.run(&["init"])?;
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(test.read_file(".hanzirc.json")?, "{}");
    Ok(())
}

#[test]
fn test_init_config_is_immediately_usable() -> Result<()> {
    let test = CliTest::new()?;
    test.run(&["init"])?;
    test.write_file("src/App.tsx", "export const App = () => <Text>你好</Text>;\n")?;

    let output = test.run(&["scan"])?;
    assert!(
        output.status.success(),
        "scan should work with the initialized config: {}",
        stdout(&output)
    );
    assert!(test.root().join("i18n/translations.json").exists());
    Ok(())
}
