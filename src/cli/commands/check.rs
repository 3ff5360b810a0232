use anyhow::Result;

use super::super::args::CheckCommand;
use super::{CheckSummary, CommandResult, context::CommandContext};
use crate::i18n::check::check_bundle;

pub fn check(cmd: CheckCommand) -> Result<CommandResult> {
    let ctx = CommandContext::new(&cmd.common)?;
    let issues = check_bundle(&ctx.bundle, ctx.source_locale(), &ctx.locales)?;

    let summary = CheckSummary {
        issues,
        locale_count: ctx.bundle.locales().count(),
        files_checked: ctx.files_scanned - ctx.scan_warnings.len(),
    };
    Ok(CommandResult::check(summary, ctx.scan_warnings))
}
