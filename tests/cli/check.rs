use anyhow::Result;
use pretty_assertions::assert_eq;

use crate::{CliTest, run};

#[test]
fn test_complete_translations() -> Result<()> {
    let test = CliTest::with_file(
        "locales/en.json",
        r#"{
  "greeting": "Hello",
  "items": {"one": "one item", "other": "{{.Count}} items"}
}"#,
    )?;
    test.write_file(
        "locales/fr.json",
        r#"[
  {"id": "greeting", "translation": "Bonjour"},
  {"id": "items", "translation": {"one": "un article", "other": "{{.Count}} articles"}}
]"#,
    )?;

    let (code, stdout, stderr) = run(test.check_command())?;

    assert_eq!(stderr, "");
    assert_eq!(stdout, "\u{2713} Checked 2 files in 2 locales - no issues found\n");
    assert_eq!(code, 0);

    Ok(())
}

#[test]
fn test_reports_missing_incomplete_and_untranslated() -> Result<()> {
    let test = CliTest::with_file(
        "locales/en.json",
        r#"{
  "farewell": "Goodbye",
  "greeting": "Hello",
  "items": {"one": "one item", "other": "{{.Count}} items"}
}"#,
    )?;
    test.write_file(
        "locales/ru.json",
        r#"{
  "greeting": "Hello",
  "items": {"one": "{{.Count}} предмет", "other": "{{.Count}} предмета"}
}"#,
    )?;

    let (code, stdout, _) = run(test.check_command())?;

    assert_eq!(
        stdout,
        concat!(
            "error: \"farewell\"  missing\n",
            "  --> ./locales/ru.json\n",
            "  = note: not defined in locale \"ru\"\n",
            "\n",
            "warning: \"greeting\"  untranslated\n",
            "  --> ./locales/ru.json\n",
            "  = note: locale \"ru\" uses the source text unchanged\n",
            "\n",
            "error: \"items\"  incomplete\n",
            "  --> ./locales/ru.json\n",
            "  = note: locale \"ru\" has no text for: few, many\n",
            "\n",
            "\u{2718} 3 problems (2 errors, 1 warning)\n",
        )
    );
    assert_eq!(code, 1);

    Ok(())
}

#[test]
fn test_plural_override_from_config() -> Result<()> {
    let test = CliTest::with_file(
        ".glossarc.json",
        r#"{
  "messagesRoot": "./i18n",
  "sourceLocale": "de",
  "plurals": {"en": ["zero", "one", "other"]}
}"#,
    )?;
    test.write_file(
        "i18n/de.json",
        r#"{"items": {"one": "ein Artikel", "other": "{{.Count}} Artikel"}}"#,
    )?;
    test.write_file(
        "i18n/en.json",
        r#"{"items": {"one": "one item", "other": "{{.Count}} items"}}"#,
    )?;

    let (code, stdout, _) = run(test.check_command())?;

    assert!(stdout.contains("error: \"items\"  incomplete"));
    assert!(stdout.contains("locale \"en\" has no text for: zero"));
    assert_eq!(code, 1);

    Ok(())
}

#[test]
fn test_cli_args_override_config() -> Result<()> {
    let test = CliTest::with_file(".glossarc.json", r#"{"messagesRoot": "./nowhere"}"#)?;
    test.write_file("translations/ja.json", r#"{"greeting": "こんにちは"}"#)?;

    let (code, stdout, _) = run({
        let mut cmd = test.check_command();
        cmd.args(["--messages-root", "translations", "--source-locale", "ja"]);
        cmd
    })?;

    assert_eq!(stdout, "\u{2713} Checked 1 file in 1 locale - no issues found\n");
    assert_eq!(code, 0);

    Ok(())
}

#[test]
fn test_missing_messages_directory() -> Result<()> {
    let test = CliTest::new()?;

    let (code, _, stderr) = run(test.check_command())?;

    assert!(stderr.starts_with("Error: Messages directory './locales' does not exist."));
    assert_eq!(code, 2);

    Ok(())
}

#[test]
fn test_unknown_locale_is_error() -> Result<()> {
    let test = CliTest::with_file("locales/en.json", r#"{"greeting": "Hello"}"#)?;
    test.write_file("locales/tlh.json", r#"{"greeting": "nuqneH"}"#)?;

    let (code, _, stderr) = run(test.check_command())?;

    assert_eq!(stderr, "Error: unknown language \"tlh\"\n");
    assert_eq!(code, 2);

    Ok(())
}

#[test]
fn test_invalid_config() -> Result<()> {
    let test = CliTest::with_file(".glossarc.json", r#"{"ignores": ["[invalid"]}"#)?;

    let (code, _, stderr) = run(test.check_command())?;

    assert!(stderr.contains("Invalid glob pattern in 'ignores'"));
    assert_eq!(code, 2);

    Ok(())
}

#[test]
fn test_unparsable_file_is_warning() -> Result<()> {
    let test = CliTest::with_file("locales/en.json", r#"{"greeting": "Hello"}"#)?;
    test.write_file("locales/fr.json", r#"{"greeting": "{{.Name"}"#)?;

    let (code, stdout, stderr) = run(test.check_command())?;

    assert_eq!(stdout, "\u{2713} Checked 1 file in 1 locale - no issues found\n");
    assert_eq!(
        stderr,
        "warning: 1 file(s) could not be parsed (use -v for details)\n"
    );
    assert_eq!(code, 0);

    Ok(())
}
