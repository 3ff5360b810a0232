use std::{fs, path::Path};

use anyhow::{Context, Result};

use super::{CommandResult, InitSummary};
use crate::config::{CONFIG_FILE_NAME, default_config_json};

/// Writes a default config to the working directory unless one exists.
pub fn init() -> Result<CommandResult> {
    let config_path = Path::new(CONFIG_FILE_NAME);

    if config_path.exists() {
        let mut result = CommandResult::init(InitSummary { created: false });
        result.error_count = 1;
        return Ok(result);
    }

    fs::write(config_path, default_config_json()? + "\n")
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;
    Ok(CommandResult::init(InitSummary { created: true }))
}
