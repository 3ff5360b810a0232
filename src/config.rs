use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::LazyLock,
};

use anyhow::{Context, Ok, Result, bail};
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::i18n::{BuiltinLocales, PluralCategory};

pub const CONFIG_FILE_NAME: &str = ".glossarc.json";

static LOCALE_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z]{2,3}([-_][A-Za-z0-9]{2,8})*$").expect("valid locale tag pattern")
});

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default = "default_messages_root")]
    pub messages_root: String,
    #[serde(default = "default_source_locale")]
    pub source_locale: String,
    #[serde(default = "default_outdir")]
    pub outdir: String,
    #[serde(default)]
    pub output_format: OutputFormat,
    #[serde(default)]
    pub ignores: Vec<String>,
    /// Required plural categories per locale, replacing the built-in table.
    #[serde(default)]
    pub plurals: BTreeMap<String, Vec<PluralCategory>>,
}

/// Layout of files written by `merge`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// `[{"id": ..., "translation": ...}]`
    #[default]
    List,
    /// `{"<id>": {"<category>": ...}}`; single translations become `other`.
    Flat,
}

fn default_messages_root() -> String {
    "./locales".to_string()
}

fn default_source_locale() -> String {
    "en".to_string()
}

fn default_outdir() -> String {
    "./".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            messages_root: default_messages_root(),
            source_locale: default_source_locale(),
            outdir: default_outdir(),
            output_format: OutputFormat::default(),
            ignores: Vec::new(),
            plurals: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Validate configuration values.
    ///
    /// Returns an error for invalid glob patterns in `ignores`, malformed
    /// locale tags, and plural overrides without `other`.
    pub fn validate(&self) -> Result<()> {
        for pattern in &self.ignores {
            Pattern::new(pattern)
                .with_context(|| format!("Invalid glob pattern in 'ignores': \"{}\"", pattern))?;
        }

        if !is_locale_tag(&self.source_locale) {
            bail!(
                "Invalid locale in 'sourceLocale': \"{}\"",
                self.source_locale
            );
        }

        for (locale, categories) in &self.plurals {
            if !is_locale_tag(locale) {
                bail!("Invalid locale in 'plurals': \"{}\"", locale);
            }
            if !categories.contains(&PluralCategory::Other) {
                bail!(
                    "Plural categories for \"{}\" in 'plurals' must include \"other\"",
                    locale
                );
            }
        }

        Ok(())
    }

    pub fn ignore_patterns(&self) -> Result<Vec<Pattern>> {
        self.ignores
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).with_context(|| {
                    format!("Invalid glob pattern in 'ignores': \"{}\"", pattern)
                })
            })
            .collect()
    }

    /// Built-in languages with this config's plural overrides applied.
    pub fn locale_directory(&self) -> BuiltinLocales {
        self.plurals
            .iter()
            .fold(BuiltinLocales::new(), |dir, (locale, categories)| {
                dir.with_override(locale, categories.iter().copied())
            })
    }
}

pub fn is_locale_tag(tag: &str) -> bool {
    LOCALE_TAG.is_match(tag)
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
    /// True if config was loaded from a file, false if using defaults.
    pub from_file: bool,
}

pub fn load_config(start_dir: &Path) -> Result<ConfigLoadResult> {
    match find_config_file(start_dir) {
        Some(path) => {
            let content = fs::read_to_string(&path)?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?;
            config.validate()?;
            Ok(ConfigLoadResult {
                config,
                from_file: true,
            })
        }
        None => Ok(ConfigLoadResult {
            config: Config::default(),
            from_file: false,
        }),
    }
}
