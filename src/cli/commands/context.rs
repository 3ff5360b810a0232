use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use tracing::{debug, info};

use super::super::args::CommonArgs;
use crate::{
    config::{CONFIG_FILE_NAME, Config, is_locale_tag, load_config},
    i18n::{
        BuiltinLocales, Bundle,
        bundle::{ScanWarning, scan_translation_files},
    },
};

/// Configuration and translations a command runs against.
pub struct CommandContext {
    /// Merged configuration (CLI args > config file > defaults).
    pub config: Config,
    pub bundle: Bundle,
    pub locales: BuiltinLocales,
    pub files_scanned: usize,
    pub scan_warnings: Vec<ScanWarning>,
}

impl CommandContext {
    /// Loads configuration from the working directory, applies CLI
    /// overrides and scans the translation files.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Config file is invalid
    /// - The source locale is not a locale tag
    /// - Messages directory doesn't exist
    pub fn new(common_args: &CommonArgs) -> Result<Self> {
        let config_result = load_config(Path::new("."))?;
        if !config_result.from_file {
            info!("no {} found, using default configuration", CONFIG_FILE_NAME);
        }

        let mut config = config_result.config;
        if let Some(ref source_locale) = common_args.source_locale {
            if !is_locale_tag(source_locale) {
                bail!("Invalid source locale: \"{}\"", source_locale);
            }
            config.source_locale = source_locale.clone();
        }
        if let Some(ref messages_root) = common_args.messages_root {
            config.messages_root = messages_root.to_string_lossy().to_string();
        }

        let messages_root = PathBuf::from(&config.messages_root);
        let ignores = config.ignore_patterns()?;
        let scan = scan_translation_files(&messages_root, &ignores)?;
        debug!(
            root = %messages_root.display(),
            files = scan.files_scanned,
            warnings = scan.warnings.len(),
            "scanned translation files"
        );

        Ok(Self {
            locales: config.locale_directory(),
            config,
            bundle: scan.bundle,
            files_scanned: scan.files_scanned,
            scan_warnings: scan.warnings,
        })
    }

    pub fn source_locale(&self) -> &str {
        &self.config.source_locale
    }
}
