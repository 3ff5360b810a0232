use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use tracing::debug;

use super::super::args::MergeCommand;
use super::{CommandResult, MergeSummary, context::CommandContext};
use crate::{config::OutputFormat, i18n::Translation};

pub fn merge(cmd: MergeCommand) -> Result<CommandResult> {
    let ctx = CommandContext::new(&cmd.common)?;
    let outdir = cmd
        .outdir
        .unwrap_or_else(|| PathBuf::from(&ctx.config.outdir));
    let format = cmd.format.unwrap_or(ctx.config.output_format);
    let outputs = ctx.bundle.merge_output(ctx.source_locale(), &ctx.locales)?;

    fs::create_dir_all(&outdir)
        .with_context(|| format!("Failed to create output directory: {:?}", outdir))?;

    let mut summary = MergeSummary {
        written: Vec::new(),
        untranslated_count: 0,
    };
    for (locale, output) in &outputs {
        let all = outdir.join(format!("{}.all.json", locale));
        write_translations(&all, &output.all, format)?;
        let untranslated = outdir.join(format!("{}.untranslated.json", locale));
        write_translations(&untranslated, &output.untranslated, format)?;

        summary.untranslated_count += output.untranslated.len();
        summary.written.extend([all, untranslated]);
    }
    Ok(CommandResult::merge(summary, ctx.scan_warnings))
}

/// Writes `translations` in `format`, pretty-printed, with a trailing
/// newline.
fn write_translations(
    path: &Path,
    translations: &[Translation],
    format: OutputFormat,
) -> Result<()> {
    let value = match format {
        OutputFormat::List => serde_json::to_value(translations),
        OutputFormat::Flat => translations
            .iter()
            .map(|t| {
                serde_json::to_value(t.to_flat_value()).map(|value| (t.id().to_string(), value))
            })
            .collect::<Result<Map<String, Value>, _>>()
            .map(Value::Object),
    }
    .with_context(|| format!("Failed to serialize translations for {:?}", path))?;
    let mut content = serde_json::to_string_pretty(&value)
        .with_context(|| format!("Failed to serialize translations for {:?}", path))?;
    content.push('\n');
    fs::write(path, content).with_context(|| format!("Failed to write file: {:?}", path))?;
    debug!(path = %path.display(), count = translations.len(), ?format, "wrote translations");
    Ok(())
}
