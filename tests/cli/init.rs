use anyhow::{Context, Result};
use pretty_assertions::assert_eq;
use serde_json::Value;

use crate::{CliTest, run};

/// Validates config file structure and default values.
fn assert_config_content(content: &str) -> Result<()> {
    let parsed: Value = serde_json::from_str(content).context("Config should be valid JSON")?;

    assert_eq!(parsed["messagesRoot"], "./locales");
    assert_eq!(parsed["sourceLocale"], "en");
    assert!(
        parsed.get("plurals").is_some(),
        "Config should have 'plurals' field"
    );
    assert!(
        content.contains("\n  \""),
        "Config should use 2-space indentation"
    );

    Ok(())
}

#[test]
fn test_init_creates_config() -> Result<()> {
    let test = CliTest::new()?;

    let (code, stdout, _) = run({
        let mut cmd = test.command();
        cmd.arg("init");
        cmd
    })?;

    assert_eq!(code, 0);
    assert_eq!(stdout, "\u{2713} Created .glossarc.json\n");
    assert!(test.root().join(".glossarc.json").exists());

    let content = test.read_file(".glossarc.json")?;
    assert_config_content(&content)?;

    Ok(())
}

#[test]
fn test_init_fails_if_exists() -> Result<()> {
    let test = CliTest::with_file(".glossarc.json", "{}")?;

    let (code, stdout, stderr) = run({
        let mut cmd = test.command();
        cmd.arg("init");
        cmd
    })?;

    assert_eq!(code, 1);
    assert_eq!(stdout, "");
    assert_eq!(stderr, "Error: .glossarc.json already exists\n");
    assert_eq!(test.read_file(".glossarc.json")?, "{}");

    Ok(())
}

#[test]
fn test_init_config_is_loadable() -> Result<()> {
    let test = CliTest::new()?;
    let (code, _, _) = run({
        let mut cmd = test.command();
        cmd.arg("init");
        cmd
    })?;
    assert_eq!(code, 0);

    test.write_file("locales/en.json", r#"{"greeting": "Hello"}"#)?;
    let (code, stdout, _) = run(test.check_command())?;

    assert_eq!(stdout, "\u{2713} Checked 1 file in 1 locale - no issues found\n");
    assert_eq!(code, 0);

    Ok(())
}
