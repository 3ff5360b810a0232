//! Translation files grouped by locale.
//!
//! Files are JSON in one of two shapes:
//!
//! ```json
//! [{"id": "items", "translation": {"one": "one item", "other": "{{.Count}} items"}}]
//! ```
//!
//! ```json
//! {"greeting": "Hello", "items": {"one": "one item", "other": "{{.Count}} items"}}
//! ```
//!
//! The locale is the first dot-separated segment of the file name, so
//! `fr.json`, `fr.all.json` and `fr.untranslated.json` all load into `fr`.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use glob::Pattern;
use rayon::prelude::*;
use serde_json::Value;
use tracing::{debug, trace};
use walkdir::WalkDir;

use super::{
    I18nError,
    language::{Language, LocaleDirectory, PluralCategory},
    translation::Translation,
};

/// Translations of every loaded locale, keyed by locale then id.
#[derive(Debug, Clone, Default)]
pub struct Bundle {
    translations: BTreeMap<String, BTreeMap<String, Translation>>,
    files: BTreeMap<String, Vec<PathBuf>>,
}

/// A file that could not be loaded.
#[derive(Debug, Clone)]
pub struct ScanWarning {
    pub file_path: String,
    pub error: String,
}

#[derive(Debug, Default)]
pub struct ScanResult {
    pub bundle: Bundle,
    pub files_scanned: usize,
    pub warnings: Vec<ScanWarning>,
}

/// Files `merge` writes for one locale.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeOutput {
    /// Every message, normalized to the locale's plural categories.
    pub all: Vec<Translation>,
    /// Messages still lacking a form, prefilled from the source locale.
    pub untranslated: Vec<Translation>,
}

impl Bundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `translation` to `locale`, merging into an existing message with
    /// the same id.
    pub fn add_translation(&mut self, locale: &str, translation: Translation) {
        let messages = self.translations.entry(locale.to_string()).or_default();
        let id = translation.id().to_string();
        let merged = match messages.remove(&id) {
            Some(existing) => existing.merge(translation),
            None => translation,
        };
        trace!(locale, id = %id, "added translation");
        messages.insert(id, merged);
    }

    pub fn add_translations(
        &mut self,
        locale: &str,
        translations: impl IntoIterator<Item = Translation>,
    ) {
        for translation in translations {
            self.add_translation(locale, translation);
        }
    }

    /// Loads one file into the locale named by its file name.
    pub fn add_file(&mut self, path: &Path) -> Result<()> {
        let (locale, translations) = load_file(path)?;
        self.add_loaded(path, &locale, translations);
        Ok(())
    }

    fn add_loaded(&mut self, path: &Path, locale: &str, translations: Vec<Translation>) {
        debug!(
            path = %path.display(),
            locale,
            count = translations.len(),
            "loaded translation file"
        );
        self.files
            .entry(locale.to_string())
            .or_default()
            .push(path.to_path_buf());
        self.translations.entry(locale.to_string()).or_default();
        self.add_translations(locale, translations);
    }

    pub fn locales(&self) -> impl Iterator<Item = &str> {
        self.translations.keys().map(String::as_str)
    }

    pub fn translations(&self, locale: &str) -> Option<&BTreeMap<String, Translation>> {
        self.translations.get(locale)
    }

    pub fn get(&self, locale: &str, id: &str) -> Option<&Translation> {
        self.translations.get(locale)?.get(id)
    }

    /// Files loaded into `locale`, in load order.
    pub fn files(&self, locale: &str) -> &[PathBuf] {
        self.files
            .get(locale)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.translations.is_empty()
    }

    /// Computes the merged output of every locale, including
    /// `source_locale` even when it has no file.
    ///
    /// Messages of the source locale that a locale lacks, or holds as the
    /// other variant, start from an untranslated copy.
    pub fn merge_output(
        &self,
        source_locale: &str,
        directory: &dyn LocaleDirectory,
    ) -> Result<BTreeMap<String, MergeOutput>, I18nError> {
        let empty = BTreeMap::new();
        let source = self.translations.get(source_locale).unwrap_or(&empty);

        let mut locales: Vec<&str> = self.locales().collect();
        if !locales.contains(&source_locale) {
            locales.push(source_locale);
        }

        let mut outputs = BTreeMap::new();
        for locale in locales {
            let language =
                directory
                    .language(locale)
                    .ok_or_else(|| I18nError::UnknownLanguage {
                        tag: locale.to_string(),
                    })?;
            let existing = self.translations.get(locale).unwrap_or(&empty);
            let output = merge_locale(source, existing, &language);
            debug!(
                locale,
                all = output.all.len(),
                untranslated = output.untranslated.len(),
                "merged locale"
            );
            outputs.insert(locale.to_string(), output);
        }
        Ok(outputs)
    }
}

fn merge_locale(
    source: &BTreeMap<String, Translation>,
    existing: &BTreeMap<String, Translation>,
    language: &Language,
) -> MergeOutput {
    let mut merged = existing.clone();
    for (id, source_translation) in source {
        let replace = merged
            .get(id)
            .is_none_or(|t| t.is_plural() != source_translation.is_plural());
        if replace {
            merged.insert(id.clone(), source_translation.untranslated_copy());
        }
    }

    let mut output = MergeOutput::default();
    for (id, mut translation) in merged {
        translation.normalize(language);
        if translation.incomplete(language) {
            let mut untranslated = translation.untranslated_copy();
            untranslated.normalize(language);
            let mut untranslated = untranslated.merge(translation.clone());
            if let Some(source_translation) = source.get(&id) {
                untranslated.backfill(source_translation);
            }
            output.untranslated.push(untranslated);
        }
        output.all.push(translation);
    }
    output
}

/// Locale named by a translation file: the first dot-separated segment of
/// its file name.
///
/// - `en.json` → `en`
/// - `pt-BR.all.json` → `pt-BR`
pub fn extract_locale(path: impl AsRef<Path>) -> Option<String> {
    path.as_ref()
        .file_name()
        .and_then(|s| s.to_str())
        .and_then(|s| s.split('.').next())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// Reads and parses one translation file.
pub fn load_file(path: &Path) -> Result<(String, Vec<Translation>)> {
    let Some(locale) = extract_locale(path) else {
        bail!("Cannot determine locale from file name: {:?}", path);
    };
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read translation file: {:?}", path))?;
    let translations = parse_translations(&content)
        .with_context(|| format!("Failed to parse translation file: {:?}", path))?;
    Ok((locale, translations))
}

/// Parses file content in either list or flat form.
pub fn parse_translations(content: &str) -> Result<Vec<Translation>> {
    let json: Value = serde_json::from_str(content)?;
    let translations = match json {
        Value::Array(records) => records
            .iter()
            .enumerate()
            .map(|(index, record)| {
                let id = record
                    .get("id")
                    .and_then(Value::as_str)
                    .ok_or_else(|| I18nError::InvalidTranslation {
                        id: format!("#{}", index),
                        reason: "missing string \"id\"".to_string(),
                    })?;
                let value = record.get("translation").unwrap_or(&Value::Null);
                translation_from_value(id, value)
            })
            .collect::<Result<Vec<_>, _>>()?,
        Value::Object(entries) => entries
            .iter()
            .map(|(id, value)| translation_from_value(id, value))
            .collect::<Result<Vec<_>, _>>()?,
        _ => bail!("expected an array of records or an object of messages"),
    };
    Ok(translations)
}

/// A string is a single translation; an object of category → string is a
/// plural one.
pub fn translation_from_value(id: &str, value: &Value) -> Result<Translation, I18nError> {
    match value {
        Value::String(src) => Translation::single(id, src),
        Value::Object(forms) => {
            let forms = forms
                .iter()
                .map(|(category, src)| {
                    let category = category.parse::<PluralCategory>().map_err(|reason| {
                        I18nError::InvalidTranslation {
                            id: id.to_string(),
                            reason,
                        }
                    })?;
                    let src = src.as_str().ok_or_else(|| I18nError::InvalidTranslation {
                        id: id.to_string(),
                        reason: format!("{} form must be a string", category),
                    })?;
                    Ok((category, src))
                })
                .collect::<Result<Vec<_>, I18nError>>()?;
            Translation::plural(id, forms)
        }
        _ => Err(I18nError::InvalidTranslation {
            id: id.to_string(),
            reason: "expected a string or an object of plural forms".to_string(),
        }),
    }
}

/// Loads every `*.json` file under `root` whose path (relative to `root`)
/// matches none of `ignores`.
///
/// Files are parsed in parallel and added in path order, so later files win
/// merges deterministically. Unreadable files become warnings.
pub fn scan_translation_files(root: impl AsRef<Path>, ignores: &[Pattern]) -> Result<ScanResult> {
    let root = root.as_ref();
    if !root.exists() {
        bail!(
            "Messages directory '{}' does not exist.\n\
             Hint: Check your .glossarc.json 'messagesRoot' setting.",
            root.display()
        );
    }
    if !root.is_dir() {
        bail!("'{}' is not a directory.", root.display());
    }

    let mut paths = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().and_then(|e| e.to_str()) != Some("json")
        {
            continue;
        }
        let relative = path.strip_prefix(root).unwrap_or(path);
        if ignores.iter().any(|p| p.matches_path(relative)) {
            trace!(path = %path.display(), "ignored");
            continue;
        }
        paths.push(path.to_path_buf());
    }
    paths.sort();

    let loaded: Vec<_> = paths
        .par_iter()
        .map(|path| (path, load_file(path)))
        .collect();

    let mut result = ScanResult {
        files_scanned: paths.len(),
        ..Default::default()
    };
    for (path, loaded) in loaded {
        match loaded {
            Ok((locale, translations)) => result.bundle.add_loaded(path, &locale, translations),
            Err(e) => result.warnings.push(ScanWarning {
                file_path: path.to_string_lossy().to_string(),
                error: format!("{:#}", e),
            }),
        }
    }
    Ok(result)
}
