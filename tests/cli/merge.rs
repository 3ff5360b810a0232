use anyhow::Result;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

use crate::{CliTest, run};

fn setup() -> Result<CliTest> {
    let test = CliTest::with_file(
        "locales/en.json",
        r#"{
  "greeting": "Hello",
  "items": {"one": "one item", "other": "{{.Count}} items"}
}"#,
    )?;
    test.write_file(
        "locales/ru.json",
        r#"[{"id": "items", "translation": {"one": "{{.Count}} предмет"}}]"#,
    )?;
    Ok(test)
}

fn read_json(test: &CliTest, path: &str) -> Result<Value> {
    Ok(serde_json::from_str(&test.read_file(path)?)?)
}

#[test]
fn test_merge_writes_all_and_untranslated() -> Result<()> {
    let test = setup()?;

    let (code, stdout, _) = run({
        let mut cmd = test.merge_command();
        cmd.args(["--outdir", "out"]);
        cmd
    })?;

    assert_eq!(code, 0);
    assert!(stdout.contains("Merged 4 file(s), 2 untranslated message(s)"));

    assert_eq!(
        read_json(&test, "out/en.all.json")?,
        json!([
            {"id": "greeting", "translation": "Hello"},
            {"id": "items", "translation": {"one": "one item", "other": "{{.Count}} items"}}
        ])
    );
    assert_eq!(read_json(&test, "out/en.untranslated.json")?, json!([]));
    assert_eq!(
        read_json(&test, "out/ru.all.json")?,
        json!([
            {"id": "greeting", "translation": ""},
            {"id": "items", "translation": {
                "one": "{{.Count}} предмет",
                "few": "",
                "many": "",
                "other": ""
            }}
        ])
    );
    assert_eq!(
        read_json(&test, "out/ru.untranslated.json")?,
        json!([
            {"id": "greeting", "translation": "Hello"},
            {"id": "items", "translation": {
                "one": "{{.Count}} предмет",
                "few": "{{.Count}} items",
                "many": "{{.Count}} items",
                "other": "{{.Count}} items"
            }}
        ])
    );

    Ok(())
}

#[test]
fn test_merged_files_load_back() -> Result<()> {
    let test = setup()?;

    let (code, _, _) = run({
        let mut cmd = test.merge_command();
        cmd.args(["--outdir", "merged"]);
        cmd
    })?;
    assert_eq!(code, 0);

    let (code, stdout, _) = run({
        let mut cmd = test.check_command();
        cmd.args(["--messages-root", "merged"]);
        cmd
    })?;

    // `*.untranslated.json` is backfilled, so merging it over `*.all.json`
    // leaves ru complete but identical to the source.
    assert!(stdout.contains("warning: \"greeting\"  untranslated"));
    assert!(!stdout.contains("incomplete"));
    assert_eq!(code, 1);

    Ok(())
}

#[test]
fn test_merge_uses_config_outdir() -> Result<()> {
    let test = setup()?;
    test.write_file(".glossarc.json", r#"{"outdir": "./build/i18n"}"#)?;

    let (code, _, _) = run(test.merge_command())?;

    assert_eq!(code, 0);
    assert!(test.root().join("build/i18n/ru.untranslated.json").exists());

    Ok(())
}

#[test]
fn test_merge_unknown_locale() -> Result<()> {
    let test = setup()?;
    test.write_file("locales/xx-yy.json", "{}")?;

    let (code, _, stderr) = run(test.merge_command())?;

    assert_eq!(stderr, "Error: unknown language \"xx-yy\"\n");
    assert_eq!(code, 2);

    Ok(())
}

#[test]
fn test_merge_flat_format_loads_back() -> Result<()> {
    let test = CliTest::with_file(
        "locales/en.json",
        r#"{
  "greeting": "Hello",
  "items": {"one": "one item", "other": "{{.Count}} items"}
}"#,
    )?;
    test.write_file("locales/ja.json", r#"{"greeting": "こんにちは"}"#)?;

    let (code, stdout, _) = run({
        let mut cmd = test.merge_command();
        cmd.args(["--outdir", "merged", "--format", "flat"]);
        cmd
    })?;

    assert_eq!(code, 0);
    assert!(stdout.contains("Merged 4 file(s), 1 untranslated message(s)"));
    assert_eq!(
        read_json(&test, "merged/en.all.json")?,
        json!({
            "greeting": {"other": "Hello"},
            "items": {"one": "one item", "other": "{{.Count}} items"}
        })
    );
    assert_eq!(read_json(&test, "merged/en.untranslated.json")?, json!({}));
    assert_eq!(
        read_json(&test, "merged/ja.all.json")?,
        json!({
            "greeting": {"other": "こんにちは"},
            "items": {"other": ""}
        })
    );
    assert_eq!(
        read_json(&test, "merged/ja.untranslated.json")?,
        json!({"items": {"other": "{{.Count}} items"}})
    );

    let (code, stdout, _) = run({
        let mut cmd = test.check_command();
        cmd.args(["--messages-root", "merged"]);
        cmd
    })?;

    assert_eq!(stdout, "\u{2713} Checked 4 files in 2 locales - no issues found\n");
    assert_eq!(code, 0);

    Ok(())
}

#[test]
fn test_merge_format_from_config() -> Result<()> {
    let test = setup()?;
    test.write_file(".glossarc.json", r#"{"outputFormat": "flat"}"#)?;

    let (code, _, _) = run({
        let mut cmd = test.merge_command();
        cmd.args(["--outdir", "out"]);
        cmd
    })?;

    assert_eq!(code, 0);
    assert_eq!(
        read_json(&test, "out/ru.untranslated.json")?,
        json!({
            "greeting": {"other": "Hello"},
            "items": {
                "one": "{{.Count}} предмет",
                "few": "{{.Count}} items",
                "many": "{{.Count}} items",
                "other": "{{.Count}} items"
            }
        })
    );

    Ok(())
}
